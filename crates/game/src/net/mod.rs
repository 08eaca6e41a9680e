mod codec;
mod queue;
mod transport;

pub use codec::PacketCodec;
pub use queue::SafeQueue;
pub use transport::{InboundPacket, UdpTransport, RECV_BUFFER_SIZE, SERVER_ENDPOINT_ID};
