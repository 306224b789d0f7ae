//! tunecap: capture a short microphone clip for music recognition.

mod app;
mod commands;
mod config;
mod logging;
mod recording;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
