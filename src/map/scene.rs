use egui::{Color32, Pos2};
use indexmap::IndexMap;

use crate::map::config::MapConfig;
use crate::map::feature::{self, classify, FeatureCollection, Geometry};
use crate::map::geomath;
use crate::map::projection::Projection;

/// Per-render parameters: the current container width and the decoded
/// topology data. Recomputed by the caller on every render; the data
/// itself is loaded once and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RenderParams<'a> {
    pub width: f64,
    pub data: &'a IndexMap<String, FeatureCollection>,
}

/// Diagonal-stripe fill pattern registered with the scene and applied to
/// path layers by class. The stripe normal is an integer direction so
/// the pattern tiles cleanly under modulo-`size` pixel arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternSpec {
    pub class: &'static str,
    pub size: u32,
    pub direction: [i32; 2],
    pub thickness: u32,
    pub stroke: Color32,
    pub background: Color32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathShape {
    /// Polygons as projected rings: outer ring first, holes after.
    Polygons(Vec<Vec<Vec<Pos2>>>),
    Lines(Vec<Vec<Pos2>>),
    Dots { centers: Vec<Pos2>, radius: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassedPath {
    pub class: String,
    pub shape: PathShape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathGroup {
    pub name: String,
    pub paths: Vec<ClassedPath>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub class: String,
    pub pos: Pos2,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelGroup {
    pub name: String,
    pub labels: Vec<PlacedLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScaleBar {
    pub start: Pos2,
    pub end: Pos2,
    pub label: String,
}

/// One complete rendered map: a display list rebuilt wholesale on every
/// render pass. Two passes over identical configuration and data produce
/// structurally equal scenes.
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    pub width: f32,
    pub height: f32,
    pub patterns: Vec<PatternSpec>,
    pub graticule: Option<PathGroup>,
    pub path_layers: Vec<PathGroup>,
    pub outlines: PathGroup,
    pub label_layers: Vec<LabelGroup>,
    pub simple_labels: Vec<PlacedLabel>,
    pub scale_bar: Option<ScaleBar>,
    pub footer_top: f32,
}

/// The two stripe fills, referenced by the `coal` and `solar` classes.
pub fn stripe_patterns() -> Vec<PatternSpec> {
    vec![
        PatternSpec {
            class: "coal",
            size: 7,
            direction: [1, 1],
            thickness: 3,
            stroke: Color32::from_rgba_unmultiplied(196, 196, 196, 204),
            background: Color32::from_rgba_unmultiplied(22, 141, 217, 204),
        },
        PatternSpec {
            class: "solar",
            size: 12,
            direction: [2, -1],
            thickness: 4,
            stroke: Color32::from_rgba_unmultiplied(196, 196, 196, 204),
            background: Color32::from_rgba_unmultiplied(209, 144, 182, 204),
        },
    ]
}

/// Build the full scene for one render pass. The steps run in a fixed
/// order so the painted output stacks the same way every time: optional
/// graticule, configured path layers, the state outline overlay, label
/// layers, fixed labels, then the scale bar.
pub fn build_scene(config: &MapConfig, params: &RenderParams<'_>) -> MapScene {
    let width = params.width;
    let height = (width / config.aspect_ratio).ceil();
    let map_scale = config.scale_factor * width;

    let projection = config
        .projection
        .with_scale(map_scale)
        .with_translate([width / 2.0, height / 2.0]);
    let dot_radius = (config.dot_radius * map_scale) as f32;

    let mut scene = MapScene {
        width: width as f32,
        height: height as f32,
        patterns: stripe_patterns(),
        graticule: None,
        path_layers: Vec::with_capacity(config.paths.len()),
        outlines: PathGroup {
            name: "outlines".to_string(),
            paths: Vec::new(),
        },
        label_layers: Vec::with_capacity(config.labels.len()),
        simple_labels: Vec::new(),
        scale_bar: None,
        footer_top: (height - 10.0) as f32,
    };

    if config.graticules {
        scene.graticule = Some(graticule_group(&projection));
    }

    for layer in &config.paths {
        match params.data.get(*layer) {
            Some(collection) => {
                scene
                    .path_layers
                    .push(path_group(layer, collection, &projection, dot_radius));
            }
            None => log::warn!("configured path layer {layer:?} missing from the data"),
        }
    }

    // The state outlines always draw on top, whatever the configuration.
    match params.data.get("states") {
        Some(collection) => {
            scene.outlines.paths = path_group("outlines", collection, &projection, dot_radius).paths;
        }
        None => log::warn!("no \"states\" group in the data; outline overlay skipped"),
    }

    for layer in &config.labels {
        match params.data.get(*layer) {
            Some(collection) => {
                scene
                    .label_layers
                    .push(label_group(layer, collection, config, &projection));
            }
            None => log::warn!("configured label layer {layer:?} missing from the data"),
        }
    }

    scene.simple_labels = config
        .simple_labels
        .iter()
        .map(|label| PlacedLabel {
            class: label.class.to_string(),
            pos: project_pos(&projection, [label.lng, label.lat]),
            text: label.text.to_string(),
        })
        .collect();

    if let Some(distance) = config.scale_bar_distance {
        let start = [10.0, height - 35.0];
        let end = geomath::scale_bar_end_point(&projection, start, distance);
        scene.scale_bar = Some(ScaleBar {
            start: to_pos2(start),
            end: to_pos2(end),
            label: geomath::scale_bar_label(distance),
        });
    }

    scene
}

fn path_group(
    name: &str,
    collection: &FeatureCollection,
    projection: &Projection,
    dot_radius: f32,
) -> PathGroup {
    PathGroup {
        name: name.to_string(),
        paths: collection
            .features
            .iter()
            .map(|feature| ClassedPath {
                class: classify(feature),
                shape: path_shape(&feature.geometry, projection, dot_radius),
            })
            .collect(),
    }
}

fn path_shape(geometry: &Geometry, projection: &Projection, dot_radius: f32) -> PathShape {
    match geometry {
        Geometry::Point(point) => PathShape::Dots {
            centers: vec![project_pos(projection, *point)],
            radius: dot_radius,
        },
        Geometry::MultiPoint(points) => PathShape::Dots {
            centers: points.iter().map(|p| project_pos(projection, *p)).collect(),
            radius: dot_radius,
        },
        Geometry::MultiLineString(lines) => PathShape::Lines(project_lines(projection, lines)),
        Geometry::Polygon(rings) => PathShape::Polygons(vec![project_lines(projection, rings)]),
        Geometry::MultiPolygon(polygons) => PathShape::Polygons(
            polygons
                .iter()
                .map(|rings| project_lines(projection, rings))
                .collect(),
        ),
    }
}

fn label_group(
    layer: &str,
    collection: &FeatureCollection,
    config: &MapConfig,
    projection: &Projection,
) -> LabelGroup {
    let mut labels = Vec::new();

    for feature in &collection.features {
        let text = match config.substitution_for(layer, feature.id.as_deref()) {
            Some(sub) => sub.to_string(),
            None => match &feature.id {
                Some(id) => id.clone(),
                None => continue,
            },
        };

        let anchor = match &feature.geometry {
            // Copied out of the feature; the nudge below must never
            // touch the original coordinates.
            Geometry::Point(point) => Some(*point),
            other => feature::centroid(other),
        };
        let Some(mut anchor) = anchor else { continue };

        if let Some(nudge) = config.nudge_for(layer, feature.id.as_deref()) {
            anchor[0] += nudge[0];
            anchor[1] += nudge[1];
        }

        labels.push(PlacedLabel {
            class: classify(feature),
            pos: project_pos(projection, anchor),
            text,
        });
    }

    LabelGroup {
        name: layer.to_string(),
        labels,
    }
}

/// 10-degree graticule grid sampled finely enough to curve under conic
/// projections, drawn as one classed path like any other layer.
fn graticule_group(projection: &Projection) -> PathGroup {
    const STEP: f64 = 10.0;
    const PRECISION: f64 = 2.5;
    let mut lines = Vec::new();

    let mut lng = -180.0;
    while lng <= 180.0 {
        let mut line = Vec::new();
        let mut lat = -80.0;
        while lat <= 80.0 {
            line.push([lng, lat]);
            lat += PRECISION;
        }
        lines.push(line);
        lng += STEP;
    }

    let mut lat = -80.0;
    while lat <= 80.0 {
        let mut line = Vec::new();
        let mut lng = -180.0;
        while lng <= 180.0 {
            line.push([lng, lat]);
            lng += PRECISION;
        }
        lines.push(line);
        lat += STEP;
    }

    PathGroup {
        name: "graticules".to_string(),
        paths: vec![ClassedPath {
            class: "graticule".to_string(),
            shape: PathShape::Lines(project_lines(projection, &lines)),
        }],
    }
}

fn project_lines(projection: &Projection, lines: &[Vec<[f64; 2]>]) -> Vec<Vec<Pos2>> {
    lines
        .iter()
        .map(|line| line.iter().map(|p| project_pos(projection, *p)).collect())
        .collect()
}

fn project_pos(projection: &Projection, lnglat: [f64; 2]) -> Pos2 {
    to_pos2(projection.project(lnglat))
}

fn to_pos2(point: [f64; 2]) -> Pos2 {
    Pos2::new(point[0] as f32, point[1] as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::config::{LayerNudges, MapConfig, SimpleLabel};
    use crate::map::feature::{Feature, FeatureValue};
    use std::collections::HashMap;

    fn square(x: f64, y: f64, side: f64) -> Vec<[f64; 2]> {
        vec![
            [x, y],
            [x + side, y],
            [x + side, y + side],
            [x, y + side],
            [x, y],
        ]
    }

    fn test_data() -> IndexMap<String, FeatureCollection> {
        let mut data = IndexMap::new();
        data.insert(
            "states".to_string(),
            FeatureCollection {
                features: vec![Feature {
                    id: Some("Boxland".to_string()),
                    properties: IndexMap::new(),
                    geometry: Geometry::Polygon(vec![square(-10.0, 30.0, 8.0)]),
                }],
            },
        );
        data.insert(
            "coal".to_string(),
            FeatureCollection {
                features: vec![Feature {
                    id: None,
                    properties: IndexMap::from_iter([(
                        "fuel".to_string(),
                        FeatureValue::String("coal".to_string()),
                    )]),
                    geometry: Geometry::Point([-6.0, 34.0]),
                }],
            },
        );
        data.insert(
            "cities".to_string(),
            FeatureCollection {
                features: vec![
                    Feature {
                        id: Some("Springfield".to_string()),
                        properties: IndexMap::new(),
                        geometry: Geometry::Point([-8.0, 33.0]),
                    },
                    Feature {
                        id: None,
                        properties: IndexMap::new(),
                        geometry: Geometry::Point([-7.0, 32.0]),
                    },
                ],
            },
        );
        data
    }

    fn test_config() -> MapConfig {
        MapConfig {
            projection: Projection::equirectangular().center([-6.0, 34.0]),
            scale_factor: 1.0,
            dot_radius: 0.004,
            paths: vec!["states", "coal"],
            labels: vec!["cities"],
            label_nudges: HashMap::new(),
            label_subs: HashMap::new(),
            scale_bar_distance: Some(1.0),
            aspect_ratio: 1.6,
            graticules: false,
            simple_labels: vec![SimpleLabel {
                lng: -6.0,
                lat: 31.0,
                text: "Gulf of Boxes",
                class: "ocean",
            }],
        }
    }

    #[test]
    fn render_is_idempotent() {
        let data = test_data();
        let config = test_config();
        let params = RenderParams {
            width: 800.0,
            data: &data,
        };
        assert_eq!(build_scene(&config, &params), build_scene(&config, &params));
    }

    #[test]
    fn height_is_the_ceiling_of_width_over_aspect() {
        let data = test_data();
        let config = test_config();
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 810.0,
                data: &data,
            },
        );
        // 810 / 1.6 = 506.25
        assert_eq!(scene.height, 507.0);
        assert_eq!(scene.footer_top, 497.0);
    }

    #[test]
    fn path_layers_follow_configured_order_and_skip_missing_groups() {
        let data = test_data();
        let mut config = test_config();
        config.paths = vec!["coal", "states", "solar"];
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        let names: Vec<&str> = scene.path_layers.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["coal", "states"]);
    }

    #[test]
    fn state_outlines_always_overlay() {
        let data = test_data();
        let mut config = test_config();
        config.paths = vec!["coal"];
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        assert_eq!(scene.outlines.paths.len(), 1);
        assert_eq!(scene.outlines.paths[0].class, "boxland");
    }

    #[test]
    fn point_features_become_dots_scaled_by_map_scale() {
        let data = test_data();
        let config = test_config();
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        let coal = scene.path_layers.iter().find(|g| g.name == "coal").unwrap();
        let PathShape::Dots { radius, .. } = &coal.paths[0].shape else {
            panic!("expected dots");
        };
        assert_eq!(*radius, (0.004 * 800.0) as f32);
        assert_eq!(coal.paths[0].class, "fuel-coal");
    }

    #[test]
    fn point_labels_use_literal_coordinates_without_mutating_the_feature() {
        let data = test_data();
        let mut config = test_config();
        config.label_nudges.insert(
            "cities",
            LayerNudges {
                default: Some([1.0, -2.0]),
                by_id: HashMap::new(),
            },
        );
        let params = RenderParams {
            width: 800.0,
            data: &data,
        };
        let scene = build_scene(&config, &params);

        let projection = config
            .projection
            .with_scale(800.0)
            .with_translate([400.0, 250.0]);
        let expected = projection.project([-8.0 + 1.0, 33.0 - 2.0]);
        let label = &scene.label_layers[0].labels[0];
        assert_eq!(label.pos, to_pos2(expected));
        // The nudge worked on a copy; the source data is untouched.
        assert_eq!(
            data["cities"].features[0].geometry,
            Geometry::Point([-8.0, 33.0])
        );
    }

    #[test]
    fn polygon_labels_anchor_at_the_identity_centroid() {
        let data = test_data();
        let mut config = test_config();
        config.labels = vec!["states"];
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        let projection = config
            .projection
            .with_scale(800.0)
            .with_translate([400.0, 250.0]);
        // Centroid of the square state in geographic space.
        let expected = projection.project([-6.0, 34.0]);
        assert_eq!(scene.label_layers[0].labels[0].pos, to_pos2(expected));
        assert_eq!(scene.label_layers[0].labels[0].text, "Boxland");
    }

    #[test]
    fn substitution_replaces_the_id_and_featureless_ids_are_skipped() {
        let data = test_data();
        let mut config = test_config();
        config.label_subs.insert(
            "cities",
            HashMap::from([("Springfield".to_string(), "Springfield, USA".to_string())]),
        );
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        let labels = &scene.label_layers[0].labels;
        // The id-less second city renders no label at all.
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "Springfield, USA");
    }

    #[test]
    fn scale_bar_uses_the_singular_form_for_one_mile() {
        let data = test_data();
        let config = test_config();
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        let bar = scene.scale_bar.as_ref().unwrap();
        assert_eq!(bar.label, "1 mile");
        assert_eq!(bar.start, Pos2::new(10.0, scene.height - 35.0));
        assert!(bar.end.x > bar.start.x);
    }

    #[test]
    fn graticules_render_only_when_enabled() {
        let data = test_data();
        let mut config = test_config();
        let params = RenderParams {
            width: 800.0,
            data: &data,
        };
        assert!(build_scene(&config, &params).graticule.is_none());
        config.graticules = true;
        let scene = build_scene(&config, &params);
        assert!(scene.graticule.is_some());
    }

    #[test]
    fn simple_labels_project_to_their_fixed_positions() {
        let data = test_data();
        let config = test_config();
        let scene = build_scene(
            &config,
            &RenderParams {
                width: 800.0,
                data: &data,
            },
        );
        assert_eq!(scene.simple_labels.len(), 1);
        assert_eq!(scene.simple_labels[0].text, "Gulf of Boxes");
        assert_eq!(scene.simple_labels[0].class, "ocean");
    }
}
