//! PulseVis-RS - main entry point

use pulsevis_rs::config::AppConfig;
use pulsevis_rs::frontend::PulseVisApp;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> eframe::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pulsevis_rs=trace")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting PulseVis-RS");

    let config = AppConfig::load_or_default();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("PulseVis-RS"),
        ..Default::default()
    };

    let save_config = config.clone();
    let result = eframe::run_native(
        "PulseVis-RS",
        native_options,
        Box::new(|cc| Ok(Box::new(PulseVisApp::new(cc, config)))),
    );

    if let Err(e) = save_config.save() {
        tracing::warn!("Failed to persist config: {}", e);
    }
    tracing::info!("Shutting down");
    result
}
