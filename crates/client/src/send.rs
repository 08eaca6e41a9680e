use voidrun::{
    encode_client_message, ClientMessage, InputState, Signature, UdpTransport, World,
    DEFAULT_TICK_RATE, SERVER_ENDPOINT_ID,
};

/// Input transmission cadence, tied to the shared tick rate so the server
/// sees one input per simulation tick.
pub const SEND_INTERVAL: f32 = 1.0 / DEFAULT_TICK_RATE as f32;

/// Reads the local `Input` component and transmits it to the server at a
/// fixed rate. Pure transmission; no gameplay logic runs here.
pub struct NetworkSendSystem {
    client_id: u32,
    accumulator: f32,
    last_sent: Option<InputState>,
}

impl NetworkSendSystem {
    pub fn new() -> Self {
        Self {
            client_id: 0,
            accumulator: 0.0,
            last_sent: None,
        }
    }

    pub fn set_client_id(&mut self, client_id: u32) {
        self.client_id = client_id;
    }

    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    pub fn update(&mut self, world: &World, transport: &UdpTransport, dt: f32) {
        self.accumulator += dt;
        if self.accumulator < SEND_INTERVAL {
            return;
        }
        self.accumulator = 0.0;

        for entity in world.entities_with_signature(Signature::INPUT) {
            let Some(input) = world.inputs.get(entity).copied() else {
                continue;
            };
            let state = InputState {
                up: input.up,
                down: input.down,
                left: input.left,
                right: input.right,
                shoot: input.shoot,
                charged_shoot: input.charged_shoot,
                detach: input.detach,
            };
            self.send_input(state, transport);
            break;
        }
    }

    fn send_input(&mut self, state: InputState, transport: &UdpTransport) {
        // The server-assigned client id is the authoritative player
        // identifier; the server applies the input to the entity it owns.
        self.send(
            transport,
            &ClientMessage::PlayerInput {
                entity_id: self.client_id,
                input: state,
            },
        );

        if self.last_sent != Some(state) {
            log::debug!("input updated (client_id={})", self.client_id);
        }
        self.last_sent = Some(state);
    }

    /// Transmit any command message to the server peer.
    pub fn send(&self, transport: &UdpTransport, message: &ClientMessage) {
        match encode_client_message(message) {
            Ok(text) => transport.send(&transport.codec().serialize(&text), SERVER_ENDPOINT_ID),
            Err(e) => log::error!("failed to encode client message: {}", e),
        }
    }
}
