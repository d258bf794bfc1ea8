use std::collections::HashMap;
use std::time::Instant;

use egui::{Align2, Color32, FontId, Pos2, Shape, Stroke, Vec2};
use indexmap::IndexMap;

use crate::map::config::MapKind;
use crate::map::feature::FeatureCollection;
use crate::map::resize::{ResizeCoordinator, RESIZE_THROTTLE};
use crate::map::scene::{build_scene, MapScene, PathGroup, PathShape, RenderParams};
use crate::ui::style::{self, Fill};

const FOOTER_TEXT: &str = "Source: U.S. Energy Information Administration";

/// The graphic's window: owns the decoded topology (immutable after
/// load), the resize coordinator, and the scene from the last render.
pub struct App {
    kind: MapKind,
    data: IndexMap<String, FeatureCollection>,
    coordinator: ResizeCoordinator,
    scene: Option<MapScene>,
    stripe_textures: HashMap<&'static str, egui::TextureHandle>,
}

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        kind: MapKind,
        data: IndexMap<String, FeatureCollection>,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::light());
        Self {
            kind,
            data,
            coordinator: ResizeCoordinator::new(),
            scene: None,
            stripe_textures: HashMap::new(),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame = egui::Frame::default()
            .fill(Color32::WHITE)
            .inner_margin(egui::Margin::same(0.0));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let width = ui.available_width() as f64;

            if let Some(render_width) = self.coordinator.observe(width, Instant::now()) {
                let config = self.kind.configure(render_width);
                let params = RenderParams {
                    width: render_width,
                    data: &self.data,
                };
                self.scene = Some(build_scene(&config, &params));
                log::debug!(
                    "rendered {:?} map at {:.0}px (mobile: {})",
                    self.kind,
                    render_width,
                    self.coordinator.is_mobile()
                );
            }
            if self.coordinator.render_pending() {
                // Wake up for the trailing render once the throttle
                // window closes.
                ctx.request_repaint_after(RESIZE_THROTTLE);
            }

            let Some(scene) = &self.scene else {
                return;
            };
            if self.stripe_textures.is_empty() {
                for spec in &scene.patterns {
                    self.stripe_textures
                        .insert(spec.class, style::stripe_texture(ctx, spec));
                }
            }

            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(scene.width, scene.height), egui::Sense::hover());
            let painter = ui.painter().with_clip_rect(rect);
            paint_scene(&painter, rect.min.to_vec2(), scene, &self.stripe_textures);

            // Footer sits just below the painted map, like the original
            // absolutely positioned footer element.
            ui.painter().text(
                rect.min + egui::vec2(10.0, scene.footer_top),
                Align2::LEFT_TOP,
                FOOTER_TEXT,
                FontId::proportional(11.0),
                Color32::from_rgb(139, 160, 170),
            );
        });
    }
}

fn paint_scene(
    painter: &egui::Painter,
    origin: Vec2,
    scene: &MapScene,
    textures: &HashMap<&'static str, egui::TextureHandle>,
) {
    if let Some(graticule) = &scene.graticule {
        paint_group(painter, origin, scene, graticule, textures);
    }
    for group in &scene.path_layers {
        paint_group(painter, origin, scene, group, textures);
    }
    paint_group(painter, origin, scene, &scene.outlines, textures);

    for group in &scene.label_layers {
        for label in &group.labels {
            painter.text(
                label.pos + origin,
                Align2::LEFT_BOTTOM,
                &label.text,
                style::label_font(&group.name),
                style::label_color(&group.name, &label.class),
            );
        }
    }
    for label in &scene.simple_labels {
        painter.text(
            label.pos + origin,
            Align2::LEFT_BOTTOM,
            &label.text,
            style::label_font("simple"),
            style::label_color("simple", &label.class),
        );
    }

    if let Some(bar) = &scene.scale_bar {
        let stroke = Stroke::new(2.0, Color32::from_rgb(51, 51, 51));
        painter.line_segment([bar.start + origin, bar.end + origin], stroke);
        painter.text(
            bar.end + origin + egui::vec2(5.0, 0.0),
            Align2::LEFT_CENTER,
            &bar.label,
            FontId::proportional(11.0),
            Color32::from_rgb(51, 51, 51),
        );
    }
}

fn paint_group(
    painter: &egui::Painter,
    origin: Vec2,
    scene: &MapScene,
    group: &PathGroup,
    textures: &HashMap<&'static str, egui::TextureHandle>,
) {
    for path in &group.paths {
        let style = style::path_style(&group.name, &path.class);
        match &path.shape {
            PathShape::Polygons(polygons) => {
                for rings in polygons {
                    if let Some(fill) = fill_mesh(rings, origin, style.fill, scene, textures) {
                        painter.add(fill);
                    }
                    if let Some(stroke) = style.stroke {
                        for ring in rings {
                            painter.add(Shape::line(offset(ring, origin), stroke));
                        }
                    }
                }
            }
            PathShape::Lines(lines) => {
                let stroke = style
                    .stroke
                    .unwrap_or_else(|| Stroke::new(1.0, Color32::from_rgb(120, 120, 120)));
                for line in lines {
                    painter.add(Shape::line(offset(line, origin), stroke));
                }
            }
            PathShape::Dots { centers, radius } => {
                let color = dot_color(style.fill, scene);
                for center in centers {
                    painter.circle_filled(*center + origin, *radius, color);
                }
            }
        }
    }
}

/// Dots are too small for a visible stripe repeat, so a patterned dot
/// just takes its pattern's background color.
fn dot_color(fill: Fill, scene: &MapScene) -> Color32 {
    match fill {
        Fill::Solid(color) => color,
        Fill::Pattern(class) => scene
            .patterns
            .iter()
            .find(|spec| spec.class == class)
            .map(|spec| spec.background)
            .unwrap_or(Color32::GRAY),
        Fill::None => Color32::TRANSPARENT,
    }
}

/// Triangulate one polygon (outer ring plus holes) into a filled mesh.
fn fill_mesh(
    rings: &[Vec<Pos2>],
    origin: Vec2,
    fill: Fill,
    scene: &MapScene,
    textures: &HashMap<&'static str, egui::TextureHandle>,
) -> Option<Shape> {
    if matches!(fill, Fill::None) {
        return None;
    }

    let mut coords: Vec<f64> = Vec::new();
    let mut hole_starts: Vec<usize> = Vec::new();
    let mut points: Vec<Pos2> = Vec::new();

    for (ring_index, ring) in rings.iter().enumerate() {
        let mut slice: &[Pos2] = ring;
        // Drop a closing duplicate so earcut sees an open ring.
        if slice.len() > 1 && slice.first() == slice.last() {
            slice = &slice[..slice.len() - 1];
        }
        if slice.len() < 3 {
            continue;
        }
        if ring_index > 0 {
            hole_starts.push(points.len());
        }
        for p in slice {
            coords.push(p.x as f64);
            coords.push(p.y as f64);
            points.push(*p + origin);
        }
    }

    if points.len() < 3 {
        return None;
    }
    let indices = earcutr::earcut(&coords, &hole_starts, 2).ok()?;

    let mut mesh = egui::Mesh::default();
    mesh.indices = indices.into_iter().map(|i| i as u32).collect();

    match fill {
        Fill::Solid(color) => {
            for pos in points {
                mesh.colored_vertex(pos, color);
            }
        }
        Fill::Pattern(class) => {
            let (spec, texture) = scene
                .patterns
                .iter()
                .find(|spec| spec.class == class)
                .zip(textures.get(class))?;
            mesh.texture_id = texture.id();
            let tile = spec.size as f32;
            for pos in points {
                mesh.vertices.push(egui::epaint::Vertex {
                    pos,
                    uv: egui::pos2(pos.x / tile, pos.y / tile),
                    color: Color32::WHITE,
                });
            }
        }
        Fill::None => return None,
    }

    Some(Shape::mesh(mesh))
}

fn offset(points: &[Pos2], origin: Vec2) -> Vec<Pos2> {
    points.iter().map(|p| *p + origin).collect()
}
