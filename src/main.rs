#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod error;
mod map;
mod ui;

use std::path::Path;

use map::config::MapKind;

fn main() -> eframe::Result<()> {
    env_logger::init();

    // Which map this deployment draws, resolved once at startup.
    let kind = match dotenv::var("WATTMAP_MAP_KIND") {
        Ok(raw) => match raw.parse::<MapKind>() {
            Ok(kind) => kind,
            Err(err) => {
                log::error!("{err}");
                std::process::exit(1);
            }
        },
        Err(_) => MapKind::default(),
    };
    let data_path =
        dotenv::var("WATTMAP_GEODATA").unwrap_or_else(|_| "data/geodata.json".to_string());

    // A failed fetch or decode is fatal; rendering never starts from a
    // partial document.
    let data = match map::topology::load_geography(Path::new(&data_path)) {
        Ok(data) => data,
        Err(err) => {
            log::error!("{err}");
            std::process::exit(1);
        }
    };

    // Configured layers missing from the document are an authoring bug;
    // flag them up front, then render what is there.
    let config = kind.configure(960.0);
    for layer in config.paths.iter().chain(config.labels.iter()) {
        if !data.contains_key(*layer) {
            log::warn!("configured layer {layer:?} is not in {data_path}");
        }
    }

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size(egui::vec2(1000.0, 700.0))
            .with_min_inner_size(egui::vec2(320.0, 280.0))
            .with_title("wattmap")
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "wattmap",
        native_options,
        Box::new(move |cc| Ok(Box::new(ui::app::App::new(cc, kind, data)))),
    )
}
