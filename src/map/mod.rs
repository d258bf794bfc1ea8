pub mod config;
pub mod feature;
pub mod geomath;
pub mod projection;
pub mod resize;
pub mod scene;
pub mod topology;
