use std::time::Duration;

use log::{error, info, warn};
use wachat::{Config, Engine};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            warn!("could not load config, using defaults: {err}");
            Config::default()
        }
    };

    let mut engine = match Engine::from_config(&config) {
        Ok(engine) => engine,
        Err(err) => {
            error!("bad backend url {:?}: {err}", config.base_url);
            std::process::exit(1);
        }
    };
    engine.start();
    info!(
        "syncing from {} every {}ms as {}; ctrl-c to quit",
        config.base_url, config.list_poll_interval_ms, config.self_id
    );

    let summary_every = Duration::from_millis(config.list_poll_interval_ms);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(summary_every) => {
                for conv in engine.snapshot() {
                    let pending = conv.messages.iter().filter(|m| m.is_pending()).count();
                    let last = conv.last_message().map(|m| m.text.as_str()).unwrap_or("-");
                    info!(
                        "{}: {} messages ({} pending), last: {last}",
                        conv.display_name(),
                        conv.messages.len(),
                        pending,
                    );
                }
            }
        }
    }

    engine.shutdown().await;
}
