use egui::{Color32, FontId, Stroke};

use crate::map::scene::PatternSpec;

/// How a classed path is filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fill {
    None,
    Solid(Color32),
    /// Fill with the stripe pattern registered under this class.
    Pattern(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStyle {
    pub fill: Fill,
    pub stroke: Option<Stroke>,
}

const LAND_FILL: Color32 = Color32::from_rgb(243, 243, 243);
const STATE_STROKE: Color32 = Color32::from_rgb(204, 204, 204);
const OUTLINE_STROKE: Color32 = Color32::from_rgb(120, 120, 120);
const GRATICULE_STROKE: Color32 = Color32::from_rgb(232, 232, 232);
const LABEL_COLOR: Color32 = Color32::from_rgb(51, 51, 51);
const MUTED_LABEL_COLOR: Color32 = Color32::from_rgb(139, 160, 170);

/// The stylesheet stand-in: resolve a layer name plus the classifier's
/// class string into a drawing style. The first recognized token wins,
/// mirroring how the original CSS selectors keyed off these classes.
pub fn path_style(layer: &str, class: &str) -> PathStyle {
    for token in std::iter::once(layer).chain(class.split_whitespace()) {
        match token {
            "coal" | "fuel-coal" => {
                return PathStyle {
                    fill: Fill::Pattern("coal"),
                    stroke: None,
                }
            }
            "solar" | "fuel-solar" => {
                return PathStyle {
                    fill: Fill::Pattern("solar"),
                    stroke: None,
                }
            }
            "outlines" => {
                return PathStyle {
                    fill: Fill::None,
                    stroke: Some(Stroke::new(1.0, OUTLINE_STROKE)),
                }
            }
            "graticules" | "graticule" => {
                return PathStyle {
                    fill: Fill::None,
                    stroke: Some(Stroke::new(0.5, GRATICULE_STROKE)),
                }
            }
            "states" => {
                return PathStyle {
                    fill: Fill::Solid(LAND_FILL),
                    stroke: Some(Stroke::new(0.75, STATE_STROKE)),
                }
            }
            _ => {}
        }
    }

    PathStyle {
        fill: Fill::Solid(LAND_FILL),
        stroke: Some(Stroke::new(0.75, STATE_STROKE)),
    }
}

pub fn label_font(layer: &str) -> FontId {
    match layer {
        "simple" => FontId::proportional(12.0),
        _ => FontId::proportional(11.0),
    }
}

pub fn label_color(layer: &str, class: &str) -> Color32 {
    if layer == "simple" || class.split_whitespace().any(|t| t == "ocean") {
        MUTED_LABEL_COLOR
    } else {
        LABEL_COLOR
    }
}

/// Render a pattern spec into a small tileable stripe image and upload
/// it as a repeat-wrapped texture.
pub fn stripe_texture(ctx: &egui::Context, spec: &PatternSpec) -> egui::TextureHandle {
    let size = spec.size as usize;
    let mut pixels = vec![spec.background; size * size];

    for y in 0..size {
        for x in 0..size {
            let along = spec.direction[0] * x as i32 + spec.direction[1] * y as i32;
            if along.rem_euclid(spec.size as i32) < spec.thickness as i32 {
                pixels[y * size + x] = spec.stroke;
            }
        }
    }

    ctx.load_texture(
        format!("stripes-{}", spec.class),
        egui::ColorImage {
            size: [size, size],
            pixels,
        },
        egui::TextureOptions {
            wrap_mode: egui::TextureWrapMode::Repeat,
            ..Default::default()
        },
    )
}
