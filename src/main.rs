mod app;
mod backend;
mod conversation;
mod dispatch;
mod event;

use app::DualMindApp;
use backend::BackendClient;
use eframe::egui;
use std::sync::mpsc;

const BASE_URL_ENV: &str = "DUALMIND_API_URL";
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    tracing::info!("using backend at {base_url}");

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("dualmind-runtime")
        .build()?;

    let client = BackendClient::new(base_url, tx, runtime.handle().clone());
    client.check_health();

    let app = DualMindApp::new(rx, client);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([960.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "DualMind",
        native_options,
        Box::new(move |_creation_context| Ok(Box::new(app))),
    )?;

    Ok(())
}
