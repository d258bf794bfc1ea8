use std::collections::HashMap;
use std::str::FromStr;

use crate::map::projection::Projection;

/// Width at or below which the graphic runs in mobile mode.
pub const MOBILE_BREAKPOINT: f64 = 600.0;

/// The fixed set of map kinds this deployment can draw. Selected once at
/// startup (see `main.rs`); never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapKind {
    #[default]
    Usa,
    World,
    /// Street-level inset around a single site.
    Streets,
}

impl FromStr for MapKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usa" => Ok(MapKind::Usa),
            "world" => Ok(MapKind::World),
            "streets" => Ok(MapKind::Streets),
            other => Err(format!("unknown map kind {other:?}")),
        }
    }
}

/// Per-layer label nudges in geographic degrees, applied before
/// projection. Feature-specific entries win over the layer default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerNudges {
    pub default: Option<[f64; 2]>,
    pub by_id: HashMap<String, [f64; 2]>,
}

/// A fixed label pinned at explicit coordinates, present on every
/// render of its map kind.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleLabel {
    pub lng: f64,
    pub lat: f64,
    pub text: &'static str,
    pub class: &'static str,
}

/// Declarative description of one map kind at one container width.
/// Immutable for the duration of a render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub projection: Projection,
    pub scale_factor: f64,
    pub dot_radius: f64,
    /// Object groups drawn as path layers, in draw order.
    pub paths: Vec<&'static str>,
    /// Object groups drawn as label layers, in draw order.
    pub labels: Vec<&'static str>,
    pub label_nudges: HashMap<&'static str, LayerNudges>,
    pub label_subs: HashMap<&'static str, HashMap<String, String>>,
    pub scale_bar_distance: Option<f64>,
    pub aspect_ratio: f64,
    pub graticules: bool,
    pub simple_labels: Vec<SimpleLabel>,
}

impl MapConfig {
    /// Nudge lookup precedence: feature-specific, then layer default,
    /// then none.
    pub fn nudge_for(&self, layer: &str, id: Option<&str>) -> Option<[f64; 2]> {
        let nudges = self.label_nudges.get(layer)?;
        id.and_then(|id| nudges.by_id.get(id).copied())
            .or(nudges.default)
    }

    /// Label text substitution for a feature, if one is configured.
    pub fn substitution_for(&self, layer: &str, id: Option<&str>) -> Option<&str> {
        let subs = self.label_subs.get(layer)?;
        subs.get(id?).map(String::as_str)
    }
}

impl MapKind {
    /// Build the type configuration for this kind at a container width.
    /// Mobile widths get chunkier dots and a shorter scale bar.
    pub fn configure(&self, width: f64) -> MapConfig {
        let mobile = width <= MOBILE_BREAKPOINT;
        match self {
            MapKind::Usa => usa(mobile),
            MapKind::World => world(mobile),
            MapKind::Streets => streets(mobile),
        }
    }
}

fn usa(mobile: bool) -> MapConfig {
    let mut label_nudges = HashMap::new();
    label_nudges.insert(
        "cities",
        LayerNudges {
            default: Some([0.3, 0.0]),
            by_id: HashMap::from([
                ("Washington".to_string(), [0.4, -0.3]),
                ("Los Angeles".to_string(), [-3.4, -0.4]),
            ]),
        },
    );

    let mut label_subs = HashMap::new();
    label_subs.insert(
        "cities",
        HashMap::from([("Washington".to_string(), "Washington, D.C.".to_string())]),
    );

    MapConfig {
        projection: Projection::albers([29.5, 45.5])
            .rotate_lng(96.0)
            .center([-0.6, 38.7]),
        scale_factor: 1.1,
        dot_radius: if mobile { 0.005 } else { 0.004 },
        paths: vec!["states", "coal", "solar"],
        labels: vec!["cities"],
        label_nudges,
        label_subs,
        scale_bar_distance: Some(if mobile { 250.0 } else { 500.0 }),
        aspect_ratio: 1.6,
        graticules: false,
        simple_labels: Vec::new(),
    }
}

fn world(mobile: bool) -> MapConfig {
    MapConfig {
        projection: Projection::equirectangular().center([10.0, 15.0]),
        scale_factor: 0.22,
        dot_radius: if mobile { 0.02 } else { 0.015 },
        paths: vec!["states", "coal", "solar"],
        labels: vec!["cities"],
        label_nudges: HashMap::new(),
        label_subs: HashMap::new(),
        scale_bar_distance: None,
        aspect_ratio: 1.9,
        graticules: true,
        simple_labels: vec![SimpleLabel {
            lng: -140.0,
            lat: -10.0,
            text: "Pacific Ocean",
            class: "ocean",
        }],
    }
}

/// Zoomed-in mercator view of the blocks around one plant site. The
/// geography document for this deployment carries street and water
/// groups instead of national outlines.
fn streets(mobile: bool) -> MapConfig {
    MapConfig {
        projection: Projection::mercator().center([-96.08, 38.42]),
        scale_factor: 420.0,
        dot_radius: if mobile { 0.00002 } else { 0.000015 },
        paths: vec!["water", "streets", "coal"],
        labels: vec!["landmarks"],
        label_nudges: HashMap::new(),
        label_subs: HashMap::new(),
        scale_bar_distance: Some(1.0),
        aspect_ratio: 1.2,
        graticules: false,
        simple_labels: Vec::new(),
    }
}
