//! Headless Monopoly simulator: plays bot-only games and reports the results.

use monopoly_core::{BotPersonality, GameSettings, PlayerSeat};
use std::collections::BTreeMap;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod table;

use config::SimConfig;
use table::Table;

const PERSONALITIES: [BotPersonality; 3] = [
    BotPersonality::Aggressive,
    BotPersonality::Balanced,
    BotPersonality::Conservative,
];

fn seats(count: usize) -> Vec<PlayerSeat> {
    (0..count)
        .map(|i| {
            let personality = PERSONALITIES[i % PERSONALITIES.len()];
            PlayerSeat::bot(format!("{:?} {}", personality, i + 1), personality)
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SimConfig::from_env()?;
    info!(?config, "Starting Monopoly simulation...");

    let mut wins: BTreeMap<String, u32> = BTreeMap::new();
    let mut unfinished = 0;

    for game in 0..config.games {
        let seed = config.seed.wrapping_add(game as u64);
        let mut table = Table::new(game + 1, seats(config.players), GameSettings::default(), seed)?;
        let summary = table.run_to_end(config.max_steps)?;

        if config.json {
            println!("{}", serde_json::to_string(&summary)?);
        }
        match &summary.winner {
            Some(name) => *wins.entry(name.clone()).or_default() += 1,
            None => unfinished += 1,
        }
    }

    for (name, count) in &wins {
        info!(player = %name, wins = count, "result");
    }
    info!(games = config.games, unfinished, "simulation complete");
    Ok(())
}
