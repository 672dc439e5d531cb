mod app;
mod io;
mod model;

use app::{configure_fonts, DesktopApp};
use reading_companion::config::Config;

fn main() -> eframe::Result<()> {
    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => (Config::default(), Some(err.to_string())),
    };
    reading_companion::logging::init(&config.log_level);

    // OCR, LLM and browser calls run here; the UI thread only polls for results
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to start the async runtime: {err}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Reading Companion",
        options,
        Box::new(move |cc| {
            configure_fonts(&cc.egui_ctx);
            Box::new(DesktopApp::new(config, runtime, config_error))
        }),
    )
}
