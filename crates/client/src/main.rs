mod client;
mod receive;
mod render;
mod send;

use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;

use voidrun::{LobbyAction, DEFAULT_TICK_RATE};

use client::GameClient;
use render::resolve_renderer;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "voidrun game client")]
struct Args {
    /// Server host name or address.
    host: String,

    /// Server UDP port.
    port: u16,

    #[arg(short = 'r', long = "renderer", default_value = "headless")]
    renderer: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut renderer =
        resolve_renderer(&args.renderer).context("resolving renderer module")?;

    let server_addr = (args.host.as_str(), args.port)
        .to_socket_addrs()
        .context("resolving server address")?
        .next()
        .context("server address resolved to nothing")?;

    let mut game = GameClient::connect(server_addr, Duration::from_secs(5))
        .context("connecting to server")?;
    log::info!(
        "connected to {} as client {}",
        server_addr,
        game.client_id().unwrap_or_default()
    );

    let receive = game.receive_mut();
    receive.set_lobby_joined_callback(|code| log::info!("joined lobby {}", code));
    receive.set_lobby_state_callback(|code, count| {
        log::info!("lobby {}: {} players", code, count)
    });
    receive.set_lobby_left_callback(|| log::info!("left lobby"));
    receive.set_lobby_message_callback(|message, duration| {
        log::info!("lobby notice ({}s): {}", duration, message)
    });
    receive.set_game_started_callback(|| log::info!("game started"));
    receive.set_level_complete_callback(|current, next| {
        log::info!("level {} complete, next: {}", current, next)
    });
    receive.set_player_dead_callback(|payload| log::info!("player died: {}", payload));
    receive.set_lobby_end_callback(|scores| log::info!("lobby ended, scores: {}", scores));
    receive.set_chat_callback(|sender, content| log::info!("[chat] {}: {}", sender, content));
    receive.set_error_callback(|message| log::warn!("server rejected request: {}", message));

    // Headless session: host a fresh lobby and start immediately.
    game.request_lobby(LobbyAction::Create, None);
    game.start_game();

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing signal handler")?;
    }

    let frame = Duration::from_secs_f64(1.0 / DEFAULT_TICK_RATE as f64);
    let dt = frame.as_secs_f32();
    while running.load(Ordering::SeqCst) {
        let frame_start = Instant::now();

        game.update(dt);
        renderer.render(game.world());

        let elapsed = frame_start.elapsed();
        if elapsed < frame {
            std::thread::sleep(frame - elapsed);
        }
    }

    game.disconnect();
    log::info!("disconnected");
    Ok(())
}
