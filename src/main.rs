use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod config;
mod console;
mod gemini;
mod tui;
mod ui;

use app::App;
use config::Config;
use gemini::GeminiClient;
use tui::TermEvent;

#[derive(Parser, Debug)]
#[command(name = "prompt-console")]
#[command(version)]
#[command(about = "Terminal prompt console for the Gemini generative-language API")]
struct Args {}

#[tokio::main]
async fn main() -> Result<()> {
    // Diagnostics go to stderr; the TUI owns stdout.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let _args = Args::parse();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("failed to load config: {e}");
        Config::default()
    });

    // Built once here and held for the application's lifetime. A missing
    // key is not fatal: the failure surfaces on the first generate.
    let client = config.resolve_api_key().map(|key| GeminiClient::new(&key));
    if client.is_none() {
        tracing::warn!(
            "{} not set; generate requests will fail until it is",
            config::API_KEY_ENV
        );
    }

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut app = App::new(client);

    let result = run_app(&mut terminal, &mut app).await;

    tui::restore()?;
    result
}

async fn run_app(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        match events.next().await {
            Some(TermEvent::Key(key)) => app.handle_key(key),
            Some(TermEvent::Tick) => app.tick_animation(),
            Some(TermEvent::Resize) => {}
            None => return Ok(()),
        }

        // Apply the outcome of a finished remote call, if any
        app.poll_generate().await;

        if app.should_quit {
            return Ok(());
        }
    }
}
