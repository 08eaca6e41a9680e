mod config;
mod dispatch;
mod game;
mod lobby;
mod systems;
mod tunables;

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use voidrun::{EnemyConfigManager, LevelConfigManager, DEFAULT_PORT, DEFAULT_TICK_RATE};

use config::ServerConfig;
use game::GameServer;

#[derive(Parser)]
#[command(name = "voidrun-server")]
#[command(about = "Authoritative voidrun game server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value = "data/enemies.json")]
    enemies: PathBuf,

    #[arg(long, default_value = "data/levels.json")]
    levels: PathBuf,

    #[arg(long, default_value_t = 1, help = "Broadcast a snapshot every N ticks")]
    snapshot_rate: u32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let enemies = Arc::new(
        EnemyConfigManager::load_from_file(&args.enemies)
            .context("loading enemy config registry")?,
    );
    let levels = Arc::new(
        LevelConfigManager::load_from_file(&args.levels).context("loading level config registry")?,
    );

    let config = ServerConfig {
        tick_rate: args.tick_rate,
        snapshot_send_rate: args.snapshot_rate.max(1),
    };
    let bind_addr = format!("{}:{}", args.bind, args.port);
    let mut server =
        GameServer::new(&bind_addr, config, enemies, levels).context("binding server socket")?;

    let running = server.running();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("installing signal handler")?;

    server.run();
    Ok(())
}
