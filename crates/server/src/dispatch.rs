use voidrun::{
    encode_server_message, parse_client_message, ClientMessage, Difficulty, InputState,
    LobbyAction, ServerMessage, Signature, UdpTransport, Viewport, PING, PONG,
};

use crate::lobby::LobbyManager;

fn send_message(transport: &UdpTransport, client_id: u32, message: &ServerMessage) {
    match encode_server_message(message) {
        Ok(text) => transport.send(&transport.codec().serialize(&text), client_id),
        Err(e) => log::error!("failed to encode reply for client {}: {}", client_id, e),
    }
}

fn send_error(transport: &UdpTransport, client_id: u32, message: &str) {
    send_message(
        transport,
        client_id,
        &ServerMessage::Error {
            message: message.to_owned(),
        },
    );
}

fn broadcast_lobby_state(manager: &LobbyManager, transport: &UdpTransport, code: &str) {
    let Some(lobby) = manager.get_lobby(code) else {
        return;
    };
    if lobby.client_count() == 0 {
        return;
    }
    lobby.broadcast(
        transport,
        &ServerMessage::LobbyState {
            code: code.to_owned(),
            player_count: lobby.client_count() as u32,
        },
    );
}

/// Drains the transport's inbound queue once per server frame and routes
/// each message to the lobby manager or the sender's lobby world. Identity
/// rule: a world-mutating message only ever touches the entity whose
/// `PlayerId` matches the sending endpoint; clients with no lobby, or whose
/// lobby has not started, are silently ignored.
pub struct NetworkReceiveSystem;

impl NetworkReceiveSystem {
    pub fn new() -> Self {
        Self
    }

    pub fn update(&mut self, manager: &mut LobbyManager, transport: &UdpTransport) {
        while let Some(packet) = transport.poll() {
            let client_id = packet.endpoint;
            let Some(text) = transport.codec().deserialize(&packet.payload) else {
                log::warn!("malformed bytes from client {}", client_id);
                continue;
            };
            if text.is_empty() {
                log::warn!("empty message from client {}", client_id);
                continue;
            }
            if text == PING {
                transport.send(&transport.codec().serialize(PONG), client_id);
                continue;
            }

            match parse_client_message(&text) {
                Ok(message) => self.handle(message, client_id, manager, transport),
                Err(e) => {
                    log::warn!("protocol error from client {}: {}", client_id, e);
                    send_error(transport, client_id, e.reply_reason());
                }
            }
        }
    }

    fn handle(
        &mut self,
        message: ClientMessage,
        client_id: u32,
        manager: &mut LobbyManager,
        transport: &UdpTransport,
    ) {
        match message {
            ClientMessage::Connect => {
                send_message(
                    transport,
                    client_id,
                    &ServerMessage::Welcome {
                        client_id,
                        message: "welcome aboard".to_owned(),
                    },
                );
            }
            ClientMessage::Disconnect => {
                if let Some(code) = manager.leave_lobby(client_id, transport) {
                    broadcast_lobby_state(manager, transport, &code);
                }
                log::info!("client {} disconnected", client_id);
            }
            ClientMessage::RequestLobby { action, lobby_code } => {
                self.handle_request_lobby(action, lobby_code, client_id, manager, transport);
            }
            ClientMessage::LeaveLobby => match manager.leave_lobby(client_id, transport) {
                Some(code) => {
                    send_message(transport, client_id, &ServerMessage::LobbyLeft);
                    broadcast_lobby_state(manager, transport, &code);
                    if let Some(lobby) = manager.get_lobby(&code) {
                        if lobby.is_game_started() && lobby.client_count() > 0 {
                            lobby.broadcast(
                                transport,
                                &ServerMessage::LobbyMessage {
                                    message: format!("player {} left the game", client_id),
                                    duration: 3,
                                },
                            );
                        }
                    }
                }
                None => log::debug!("client {} tried to leave without a lobby", client_id),
            },
            ClientMessage::StartGame => {
                self.handle_start_game(client_id, manager, transport);
            }
            ClientMessage::Viewport { width, height } => {
                self.handle_viewport(width, height, client_id, manager);
            }
            ClientMessage::PlayerInput { input, .. } => {
                self.handle_player_input(input, client_id, manager);
            }
            ClientMessage::SetDifficulty { difficulty } => {
                self.handle_set_difficulty(difficulty, client_id, manager);
            }
            ClientMessage::Chat { content } => {
                if let Some(lobby) = manager.client_lobby(client_id) {
                    lobby.broadcast(
                        transport,
                        &ServerMessage::Chat {
                            sender_id: client_id,
                            content,
                        },
                    );
                }
            }
        }
    }

    fn handle_request_lobby(
        &mut self,
        action: LobbyAction,
        lobby_code: Option<String>,
        client_id: u32,
        manager: &mut LobbyManager,
        transport: &UdpTransport,
    ) {
        if manager.client_lobby(client_id).is_some() {
            send_error(transport, client_id, "Already in a lobby");
            return;
        }

        // A join without a code falls back to creating a fresh lobby.
        let join_code = match action {
            LobbyAction::Join => lobby_code.filter(|code| !code.is_empty()),
            LobbyAction::Create => None,
        };
        let code = match join_code {
            Some(code) => code,
            None => manager.create_lobby(),
        };

        match manager.join_lobby(&code, client_id) {
            Ok(()) => {
                send_message(
                    transport,
                    client_id,
                    &ServerMessage::LobbyJoined { code: code.clone() },
                );
                broadcast_lobby_state(manager, transport, &code);
            }
            Err(e) => {
                log::warn!("client {} failed to join lobby {}: {}", client_id, code, e);
                send_error(transport, client_id, &e.to_string());
            }
        }
    }

    fn handle_start_game(
        &mut self,
        client_id: u32,
        manager: &mut LobbyManager,
        transport: &UdpTransport,
    ) {
        let Some(lobby) = manager.client_lobby(client_id) else {
            send_error(transport, client_id, "Not in any lobby");
            return;
        };
        if lobby.is_game_started() {
            send_error(transport, client_id, "Game already in progress");
            return;
        }
        log::info!("client {} started game in lobby {}", client_id, lobby.code());
        lobby.start_game();
        lobby.broadcast(transport, &ServerMessage::GameStarted);
    }

    fn handle_viewport(&mut self, width: u32, height: u32, client_id: u32, manager: &mut LobbyManager) {
        let Some(lobby) = manager.client_lobby(client_id) else {
            return;
        };
        if !lobby.is_game_started() {
            return;
        }
        let world = lobby.world_mut();
        for entity in world.entities_with_signature(Signature::PLAYER_ID | Signature::INPUT) {
            if world.player_ids.get(entity).map(|p| p.client_id) != Some(client_id) {
                continue;
            }
            if let Some(viewport) = world.viewports.get_mut(entity) {
                viewport.width = width;
                viewport.height = height;
            } else {
                world.add(entity, Viewport { width, height });
            }
            break;
        }
    }

    fn handle_player_input(&mut self, input: InputState, client_id: u32, manager: &mut LobbyManager) {
        let Some(lobby) = manager.client_lobby(client_id) else {
            return;
        };
        if !lobby.is_game_started() {
            return;
        }
        let world = lobby.world_mut();
        for entity in world.entities_with_signature(Signature::PLAYER_ID | Signature::INPUT) {
            if world.player_ids.get(entity).map(|p| p.client_id) != Some(client_id) {
                continue;
            }
            if let Some(current) = world.inputs.get_mut(entity) {
                current.up = input.up;
                current.down = input.down;
                current.left = input.left;
                current.right = input.right;
                current.shoot = input.shoot;
                current.charged_shoot = input.charged_shoot;
                current.detach = input.detach;
            }
            break;
        }
    }

    fn handle_set_difficulty(
        &mut self,
        difficulty: Difficulty,
        client_id: u32,
        manager: &mut LobbyManager,
    ) {
        match manager.client_lobby(client_id) {
            Some(lobby) => lobby.set_difficulty(difficulty),
            None => log::debug!(
                "client {} set difficulty without a lobby, ignored",
                client_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{SocketAddr, UdpSocket};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use voidrun::{
        encode_client_message, parse_server_message, EnemyConfigManager, LevelConfigManager,
    };

    use super::*;
    use crate::tunables::{PLAYER_SPAWN_Y, PLAYER_SPEED};

    const DT: f32 = 1.0 / 60.0;

    struct Harness {
        transport: UdpTransport,
        manager: LobbyManager,
        receive: NetworkReceiveSystem,
    }

    impl Harness {
        fn new() -> Self {
            let enemies = Arc::new(
                EnemyConfigManager::load_from_str(r#"{"enemies":[{"id":"enemy_red"}]}"#).unwrap(),
            );
            let levels = Arc::new(
                LevelConfigManager::load_from_str(
                    r#"{"levels":[{"id":"level_1","waves":[
                        {"startTime":60.0,"spawns":[{"enemyType":"enemy_red","x":900.0,"y":900.0}]}
                    ]}]}"#,
                )
                .unwrap(),
            );
            let mut transport = UdpTransport::server("127.0.0.1:0").unwrap();
            transport.start();
            Self {
                transport,
                manager: LobbyManager::new(enemies, levels),
                receive: NetworkReceiveSystem::new(),
            }
        }

        fn addr(&self) -> SocketAddr {
            self.transport.local_addr()
        }

        /// Let in-flight datagrams land, then run one dispatch pass.
        fn pump(&mut self) {
            thread::sleep(Duration::from_millis(40));
            self.receive.update(&mut self.manager, &self.transport);
        }

        fn tick(&mut self) {
            self.manager.tick_all(DT, &self.transport);
            self.manager.reap_ended();
        }
    }

    struct TestClient {
        socket: UdpSocket,
        server: SocketAddr,
    }

    impl TestClient {
        fn new(server: SocketAddr) -> Self {
            let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
            socket
                .set_read_timeout(Some(Duration::from_millis(300)))
                .unwrap();
            Self { socket, server }
        }

        fn send_raw(&self, text: &str) {
            self.socket.send_to(text.as_bytes(), self.server).unwrap();
        }

        fn send(&self, message: &ClientMessage) {
            self.send_raw(&encode_client_message(message).unwrap());
        }

        fn recv_text(&self) -> Option<String> {
            let mut buf = [0u8; 2048];
            match self.socket.recv_from(&mut buf) {
                Ok((len, _)) => Some(String::from_utf8_lossy(&buf[..len]).into_owned()),
                Err(_) => None,
            }
        }

        fn recv_message(&self) -> Option<ServerMessage> {
            self.recv_text().and_then(|t| parse_server_message(&t).ok())
        }

        fn drain(&self) -> Vec<ServerMessage> {
            let mut messages = Vec::new();
            while let Some(text) = self.recv_text() {
                if let Ok(message) = parse_server_message(&text) {
                    messages.push(message);
                }
            }
            messages
        }
    }

    #[test]
    fn ping_is_answered_with_pong() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send_raw(PING);
        harness.pump();

        assert_eq!(client.recv_text().as_deref(), Some(PONG));
    }

    #[test]
    fn connect_is_welcomed_with_endpoint_id() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::Connect);
        harness.pump();

        let Some(ServerMessage::Welcome { client_id, .. }) = client.recv_message() else {
            panic!("expected a welcome");
        };
        assert_eq!(client_id, 1);
    }

    #[test]
    fn lobby_create_then_join_flow() {
        let mut harness = Harness::new();
        let alice = TestClient::new(harness.addr());
        let bob = TestClient::new(harness.addr());

        alice.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();

        let messages = alice.drain();
        assert!(
            matches!(&messages[0], ServerMessage::LobbyJoined { code } if code == "1"),
            "got {:?}",
            messages
        );
        assert!(matches!(
            &messages[1],
            ServerMessage::LobbyState { code, player_count } if code == "1" && *player_count == 1
        ));

        bob.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("1".to_owned()),
        });
        harness.pump();

        let bob_messages = bob.drain();
        assert!(matches!(&bob_messages[0], ServerMessage::LobbyJoined { code } if code == "1"));
        assert!(matches!(
            &bob_messages[1],
            ServerMessage::LobbyState { player_count, .. } if *player_count == 2
        ));

        // The earlier member hears about the new player count too.
        let alice_messages = alice.drain();
        assert!(alice_messages.iter().any(|m| matches!(
            m,
            ServerMessage::LobbyState { player_count, .. } if *player_count == 2
        )));
    }

    #[test]
    fn join_unknown_lobby_is_an_error() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("42".to_owned()),
        });
        harness.pump();

        let Some(ServerMessage::Error { message }) = client.recv_message() else {
            panic!("expected an error");
        };
        assert!(message.contains("not found"));
        assert_eq!(harness.manager.lobby_count(), 0);
    }

    #[test]
    fn start_then_input_moves_player_in_snapshot() {
        let mut harness = Harness::new();
        let alice = TestClient::new(harness.addr());
        let bob = TestClient::new(harness.addr());

        alice.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        bob.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("1".to_owned()),
        });
        harness.pump();
        alice.drain();
        bob.drain();

        alice.send(&ClientMessage::StartGame);
        harness.pump();

        assert!(alice
            .drain()
            .iter()
            .any(|m| matches!(m, ServerMessage::GameStarted)));
        assert!(bob
            .drain()
            .iter()
            .any(|m| matches!(m, ServerMessage::GameStarted)));

        alice.send(&ClientMessage::PlayerInput {
            entity_id: 1,
            input: InputState {
                up: true,
                ..InputState::default()
            },
        });
        harness.pump();
        harness.tick();

        // Up means a smaller y in the next snapshot.
        let expected_y = PLAYER_SPAWN_Y - PLAYER_SPEED * DT;
        let snapshots = alice.drain();
        let snapshot = snapshots
            .iter()
            .find_map(|m| match m {
                ServerMessage::Snapshot { entities, .. } => Some(entities),
                _ => None,
            })
            .expect("no snapshot received");
        let moved = snapshot
            .iter()
            .find(|record| (record.transform.y - expected_y).abs() < 0.01);
        assert!(moved.is_some(), "snapshot was {:?}", snapshot);
    }

    #[test]
    fn unknown_type_gets_single_error_and_no_side_effect() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send_raw(r#"{"type":"nonsense"}"#);
        harness.pump();

        let messages = client.drain();
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            ServerMessage::Error { message } if message == "unknown type"
        ));
        assert_eq!(harness.manager.lobby_count(), 0);
    }

    #[test]
    fn missing_type_gets_error() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send_raw(r#"{"width":800}"#);
        harness.pump();

        assert!(matches!(
            client.recv_message(),
            Some(ServerMessage::Error { message }) if message == "missing type"
        ));
    }

    #[test]
    fn leave_flow_empties_and_destroys_lobby() {
        let mut harness = Harness::new();
        let alice = TestClient::new(harness.addr());
        let bob = TestClient::new(harness.addr());

        alice.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        bob.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("1".to_owned()),
        });
        harness.pump();
        alice.drain();
        bob.drain();

        bob.send(&ClientMessage::LeaveLobby);
        harness.pump();

        assert!(bob
            .drain()
            .iter()
            .any(|m| matches!(m, ServerMessage::LobbyLeft)));
        assert!(alice.drain().iter().any(|m| matches!(
            m,
            ServerMessage::LobbyState { player_count, .. } if *player_count == 1
        )));

        alice.send(&ClientMessage::LeaveLobby);
        harness.pump();
        harness.tick();

        assert_eq!(harness.manager.lobby_count(), 0);

        // Stale messages for the destroyed lobby are ignored.
        alice.send(&ClientMessage::StartGame);
        harness.pump();
        assert!(matches!(
            alice.drain().last(),
            Some(ServerMessage::Error { message }) if message == "Not in any lobby"
        ));
    }

    #[test]
    fn viewport_before_start_is_ignored() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        client.drain();

        client.send(&ClientMessage::Viewport {
            width: 800,
            height: 600,
        });
        harness.pump();

        // No world mutation and no error reply.
        assert!(client.drain().is_empty());
        let lobby = harness.manager.get_lobby("1").unwrap();
        assert_eq!(lobby.world().entity_count(), 0);
    }

    #[test]
    fn viewport_after_start_is_upserted() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        client.send(&ClientMessage::StartGame);
        harness.pump();
        client.drain();

        client.send(&ClientMessage::Viewport {
            width: 800,
            height: 600,
        });
        harness.pump();

        let lobby = harness.manager.get_lobby("1").unwrap();
        let world = lobby.world();
        let players = world.entities_with_signature(Signature::PLAYER_ID | Signature::VIEWPORT);
        assert_eq!(players.len(), 1);
        assert_eq!(world.viewports.get(players[0]).unwrap().width, 800);

        client.send(&ClientMessage::Viewport {
            width: 1024,
            height: 768,
        });
        harness.pump();
        let lobby = harness.manager.get_lobby("1").unwrap();
        let world = lobby.world();
        let player = world.entities_with_signature(Signature::PLAYER_ID)[0];
        assert_eq!(world.viewports.get(player).unwrap().width, 1024);
    }

    #[test]
    fn input_only_touches_the_senders_entity() {
        let mut harness = Harness::new();
        let alice = TestClient::new(harness.addr());
        let bob = TestClient::new(harness.addr());

        alice.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        bob.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("1".to_owned()),
        });
        harness.pump();
        alice.send(&ClientMessage::StartGame);
        harness.pump();

        bob.send(&ClientMessage::PlayerInput {
            entity_id: 2,
            input: InputState {
                down: true,
                ..InputState::default()
            },
        });
        harness.pump();

        let lobby = harness.manager.get_lobby("1").unwrap();
        let world = lobby.world();
        for entity in world.entities_with_signature(Signature::PLAYER_ID) {
            let owner = world.player_ids.get(entity).unwrap().client_id;
            let input = world.inputs.get(entity).unwrap();
            if owner == 2 {
                assert!(input.down, "bob's entity should be moving down");
            } else {
                assert!(!input.down, "alice's entity must be untouched");
            }
        }
    }

    #[test]
    fn latest_input_wins() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        client.send(&ClientMessage::StartGame);
        harness.pump();

        client.send(&ClientMessage::PlayerInput {
            entity_id: 1,
            input: InputState {
                up: true,
                ..InputState::default()
            },
        });
        client.send(&ClientMessage::PlayerInput {
            entity_id: 1,
            input: InputState {
                right: true,
                ..InputState::default()
            },
        });
        harness.pump();

        let lobby = harness.manager.get_lobby("1").unwrap();
        let world = lobby.world();
        let player = world.entities_with_signature(Signature::PLAYER_ID)[0];
        let input = world.inputs.get(player).unwrap();
        assert!(!input.up);
        assert!(input.right);
    }

    #[test]
    fn chat_is_broadcast_to_the_lobby() {
        let mut harness = Harness::new();
        let alice = TestClient::new(harness.addr());
        let bob = TestClient::new(harness.addr());

        alice.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        bob.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Join,
            lobby_code: Some("1".to_owned()),
        });
        harness.pump();
        alice.drain();
        bob.drain();

        alice.send(&ClientMessage::Chat {
            content: "gg".to_owned(),
        });
        harness.pump();

        assert!(bob.drain().iter().any(|m| matches!(
            m,
            ServerMessage::Chat { sender_id, content } if *sender_id == 1 && content == "gg"
        )));
    }

    #[test]
    fn set_difficulty_updates_lobby() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();

        client.send(&ClientMessage::SetDifficulty {
            difficulty: Difficulty::Expert,
        });
        harness.pump();

        assert_eq!(
            harness.manager.get_lobby("1").unwrap().difficulty(),
            Difficulty::Expert
        );
    }

    #[test]
    fn second_start_game_is_an_error() {
        let mut harness = Harness::new();
        let client = TestClient::new(harness.addr());

        client.send(&ClientMessage::RequestLobby {
            action: LobbyAction::Create,
            lobby_code: None,
        });
        harness.pump();
        client.send(&ClientMessage::StartGame);
        harness.pump();
        client.drain();

        client.send(&ClientMessage::StartGame);
        harness.pump();

        assert!(matches!(
            client.drain().last(),
            Some(ServerMessage::Error { message }) if message == "Game already in progress"
        ));
    }
}
