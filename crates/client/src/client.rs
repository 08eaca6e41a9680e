use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use thiserror::Error;

use voidrun::{ClientMessage, Difficulty, Input, InputState, LobbyAction, UdpTransport, World};

use crate::receive::ClientNetworkReceiveSystem;
use crate::send::NetworkSendSystem;

/// Local-only entities live in the upper id half so replicated server ids
/// (allocated from 1 upward) never collide with them.
const LOCAL_INPUT_ENTITY: u32 = 1 << 31;

/// How often the connect handshake is retried while waiting for `welcome`.
const CONNECT_RETRY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connection attempt timed out")]
    Timeout,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Thin client over the core protocol: a client-role transport, a local
/// mirror world reconciled from snapshots, and the receive/send systems.
/// Rendering and menus live behind callbacks registered on the receive
/// system.
pub struct GameClient {
    transport: UdpTransport,
    world: World,
    receive: ClientNetworkReceiveSystem,
    send: NetworkSendSystem,
}

impl GameClient {
    /// Bind, start the transport, and perform the `connect`/`welcome`
    /// handshake, retrying over loss until `timeout` elapses.
    pub fn connect(server_addr: SocketAddr, timeout: Duration) -> Result<Self, ClientError> {
        let mut transport = UdpTransport::client(server_addr)?;
        transport.start();

        let mut world = World::new();
        let local_input = world.spawn_with_id(LOCAL_INPUT_ENTITY);
        world.add(local_input, Input::default());

        let mut client = Self {
            transport,
            world,
            receive: ClientNetworkReceiveSystem::new(),
            send: NetworkSendSystem::new(),
        };

        let start = Instant::now();
        let mut last_attempt: Option<Instant> = None;
        while start.elapsed() < timeout {
            if last_attempt.is_none_or(|t| t.elapsed() >= CONNECT_RETRY) {
                client.send.send(&client.transport, &ClientMessage::Connect);
                last_attempt = Some(Instant::now());
            }
            client.receive.update(&mut client.world, &client.transport);
            if let Some(client_id) = client.receive.client_id() {
                client.send.set_client_id(client_id);
                return Ok(client);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        Err(ClientError::Timeout)
    }

    pub fn client_id(&self) -> Option<u32> {
        self.receive.client_id()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Callback registration surface for the UI layer.
    pub fn receive_mut(&mut self) -> &mut ClientNetworkReceiveSystem {
        &mut self.receive
    }

    /// Overwrite the local input state; it is transmitted on the next send
    /// interval.
    pub fn set_input(&mut self, state: InputState) {
        if let Some(input) = self.world.inputs.get_mut(voidrun::Entity(LOCAL_INPUT_ENTITY)) {
            input.up = state.up;
            input.down = state.down;
            input.left = state.left;
            input.right = state.right;
            input.shoot = state.shoot;
            input.charged_shoot = state.charged_shoot;
            input.detach = state.detach;
        }
    }

    /// One client frame: reconcile inbound state, then transmit input.
    pub fn update(&mut self, dt: f32) {
        self.receive.update(&mut self.world, &self.transport);
        self.send.update(&self.world, &self.transport, dt);
    }

    pub fn request_lobby(&self, action: LobbyAction, lobby_code: Option<String>) {
        self.send.send(
            &self.transport,
            &ClientMessage::RequestLobby { action, lobby_code },
        );
    }

    pub fn start_game(&self) {
        self.send.send(&self.transport, &ClientMessage::StartGame);
    }

    pub fn leave_lobby(&self) {
        self.send.send(&self.transport, &ClientMessage::LeaveLobby);
    }

    pub fn send_viewport(&self, width: u32, height: u32) {
        self.send
            .send(&self.transport, &ClientMessage::Viewport { width, height });
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) {
        self.send
            .send(&self.transport, &ClientMessage::SetDifficulty { difficulty });
    }

    pub fn send_chat(&self, content: String) {
        self.send
            .send(&self.transport, &ClientMessage::Chat { content });
    }

    /// Notify the server and stop the transport.
    pub fn disconnect(&mut self) {
        self.send.send(&self.transport, &ClientMessage::Disconnect);
        self.transport.stop();
    }
}
