//! authprobe - smoke test for the SoportePlus authentication API.
//!
//! Logs in with the configured account, waits a moment, then fetches the
//! current user with the issued bearer token.

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use authprobe_core::{smoke, ApiClient, Config, Session};

const USAGE: &str = "Usage: authprobe [--me | --preflight | --logout]

  (no flag)    log in, wait, fetch the current user
  --me         fetch the current user with the saved token
  --preflight  send a CORS preflight for the login route
  --logout     forget the saved token";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        None => run_smoke().await,
        Some("--me") => run_me().await,
        Some("--preflight") => run_preflight().await,
        Some("--logout") => run_logout(),
        Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown argument: {}\n\n{}", other, USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

fn setup() -> Result<(Config, ApiClient, Session)> {
    let config = Config::load()?;
    let client = ApiClient::new(&config.base_url, config.request_timeout())?;
    let session = match config.cache_dir() {
        Ok(dir) => Session::with_dir(dir),
        Err(_) => Session::in_memory(),
    };
    info!(base_url = %client.base_url(), "authprobe starting");
    Ok((config, client, session))
}

async fn run_smoke() -> Result<()> {
    let (config, client, mut session) = setup()?;
    let report = smoke::run(&client, &config.credentials(), &mut session, config.profile_delay()).await?;

    println!("✅ Login OK");
    println!("{}", serde_json::to_string_pretty(&report.login)?);
    println!("✅ Current user: {}", report.user.display_name());
    println!("{}", serde_json::to_string_pretty(&report.user)?);
    Ok(())
}

async fn run_me() -> Result<()> {
    let (_, client, mut session) = setup()?;
    if !session.load()? {
        eprintln!("No saved session; sending the request without a token.");
    }
    let me = smoke::profile(&client, &session).await?;

    println!("✅ Current user: {}", me.display_name());
    println!("{}", serde_json::to_string_pretty(&me)?);
    Ok(())
}

async fn run_preflight() -> Result<()> {
    let (config, client, _) = setup()?;
    let preflight = client.preflight(&config.origin).await?;

    println!("Status: {}", preflight.status);
    if preflight.cors_headers.is_empty() {
        println!("No CORS headers in response");
    }
    for (name, value) in &preflight.cors_headers {
        println!("{}: {}", name, value);
    }
    if preflight.allows_origin(&config.origin) {
        println!("✅ {} may call the login route", config.origin);
    } else {
        println!("❌ {} is not allowed by the server's CORS policy", config.origin);
    }
    Ok(())
}

fn run_logout() -> Result<()> {
    let config = Config::load()?;
    let mut session = Session::with_dir(config.cache_dir()?);
    session.clear()?;
    println!("Saved session removed");
    Ok(())
}
