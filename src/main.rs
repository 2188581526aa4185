// File: main.rs
// Location: /src/main.rs

use chrono::Local;
use libadwaita as adw;
use libadwaita::prelude::*;
use std::fs::OpenOptions;
use std::io::Write;

mod ui;
mod window;

use window::QrWindow;

const APP_ID: &str = "com.github.adw-qrcode";

fn setup_logging() {
    let log_path = std::env::var("HOME")
        .map(|home| std::path::PathBuf::from(home).join(".local/share/adw-qrcode"))
        .unwrap_or_else(|_| std::path::PathBuf::from("/tmp"));

    let _ = std::fs::create_dir_all(&log_path);
    let log_file_path = log_path.join("adw-qrcode.log");

    env_logger::Builder::from_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
    {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "\n[{}] [INFO] ========== QR Code Generator Started ==========", now);
        let _ = writeln!(file, "[{}] [DEBUG] Log file: {:?}", now, log_file_path);
    }
}

fn main() -> glib::ExitCode {
    setup_logging();
    log::info!("Application starting...");

    // Toolkit missing or no display: nothing else can run.
    if let Err(e) = gtk4::init() {
        eprintln!("adw-qrcode needs GTK 4 and a graphical session: {}", e);
        log::error!("GTK initialization failed: {}", e);
        return glib::ExitCode::FAILURE;
    }
    if let Err(e) = adw::init() {
        eprintln!("adw-qrcode needs libadwaita 1.6 or newer: {}", e);
        log::error!("libadwaita initialization failed: {}", e);
        return glib::ExitCode::FAILURE;
    }

    let app = adw::Application::builder()
        .application_id(APP_ID)
        .build();

    app.connect_activate(build_ui);
    app.run()
}

fn build_ui(app: &adw::Application) {
    log::info!("Building UI...");
    let window = QrWindow::new(app);
    window.present();
    log::info!("UI built and window presented");
}
