mod app;
mod model;
mod repo;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Planmark",
        native_options,
        Box::new(|cc| Ok(Box::new(app::PlanmarkApp::new(cc)))),
    )
}
