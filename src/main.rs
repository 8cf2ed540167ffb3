use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("optiform=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "Optiform",
        native_options,
        Box::new(|cc| Ok(Box::new(optiform::FormEditorApp::new(cc)))),
    )
}
