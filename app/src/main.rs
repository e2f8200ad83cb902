use eframe::egui;

mod app;
mod command;
mod config;
mod scene;
mod shortcut;
mod ui;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let scene_path = std::env::args().nth(1);
    eframe::run_native(
        "Label Connector",
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 720.0]),
            ..Default::default()
        },
        Box::new(move |cc| Ok(Box::new(app::LabelConnectorApp::new(cc, scene_path.as_deref())))),
    )
}
