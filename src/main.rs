mod common;
mod config;
mod error;
mod network;
mod storage;
mod ui;

use clap::Parser;
use dotenvy::dotenv;
use network::{ApiClient, NetworkWorker};
use storage::SessionStore;
use tokio::sync::mpsc;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "friendchat", version, about = "Desktop client for FriendChat")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Base URL of the FriendChat API (falls back to `FRIENDCHAT_API_BASE`)
    #[arg(long, value_name = "URL")]
    api_base: Option<String>,
    /// Path to the local session database
    #[arg(long, value_name = "FILE")]
    data: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), eframe::Error> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let api_base = cli
        .api_base
        .or_else(|| std::env::var(config::API_BASE_ENV).ok());
    let app_config = config::load_config(&cli.config).with_overrides(api_base, cli.data);

    let endpoints = match app_config.endpoints() {
        Ok(endpoints) => endpoints,
        Err(err) => {
            log::error!("Invalid API base `{}`: {err}", app_config.api_base);
            std::process::exit(2);
        }
    };

    let session_store = match SessionStore::with_path(&app_config.database_path) {
        Ok(store) => store,
        Err(err) => {
            log::error!(
                "Cannot open session database {}: {err}",
                app_config.database_path
            );
            std::process::exit(1);
        }
    };
    let stored = session_store.load().unwrap_or_else(|err| {
        log::warn!("Failed to read stored session: {err}");
        None
    });

    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy Network Thread (Chạy ngầm)
    log::info!("Using API at {}", app_config.api_base);
    let worker = NetworkWorker::new(ApiClient::new(endpoints), event_tx, cmd_rx);
    tokio::spawn(worker.run());

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "FriendChat",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ChatApp::new(
                cc,
                session_store,
                stored,
                cmd_tx,
                event_rx,
            )))
        }),
    )
}
