use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use voidrun::{EnemyConfigManager, LevelConfigManager, UdpTransport};

use crate::config::ServerConfig;
use crate::dispatch::NetworkReceiveSystem;
use crate::lobby::LobbyManager;

/// Owns the server main loop: one fixed-rate game thread next to the
/// transport's I/O thread. Each frame drains and dispatches the inbound
/// queue, advances every lobby, sweeps ended lobbies, and sleeps the
/// remainder of the frame.
pub struct GameServer {
    transport: UdpTransport,
    manager: LobbyManager,
    receive: NetworkReceiveSystem,
    running: Arc<AtomicBool>,
    tick_duration: Duration,
}

impl GameServer {
    pub fn new(
        bind_addr: &str,
        config: ServerConfig,
        enemies: Arc<EnemyConfigManager>,
        levels: Arc<LevelConfigManager>,
    ) -> io::Result<Self> {
        let transport = UdpTransport::server(bind_addr)?;
        let manager =
            LobbyManager::with_snapshot_rate(enemies, levels, config.snapshot_send_rate);
        let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate.max(1) as f64);

        Ok(Self {
            transport,
            manager,
            receive: NetworkReceiveSystem::new(),
            running: Arc::new(AtomicBool::new(true)),
            tick_duration,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Shared running flag; clearing it makes `run` return after the
    /// current frame.
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// One frame: dispatch, simulate, sweep.
    pub fn step(&mut self, dt: f32) {
        self.receive.update(&mut self.manager, &self.transport);
        self.manager.tick_all(dt, &self.transport);
        self.manager.reap_ended();
    }

    pub fn run(&mut self) {
        self.transport.start();
        log::info!("server listening on {}", self.local_addr());

        let dt = self.tick_duration.as_secs_f32();
        while self.running.load(Ordering::SeqCst) {
            let frame_start = Instant::now();
            self.step(dt);

            let elapsed = frame_start.elapsed();
            if elapsed < self.tick_duration {
                std::thread::sleep(self.tick_duration - elapsed);
            }
        }

        log::info!("server shutting down");
        self.transport.stop();
    }
}
