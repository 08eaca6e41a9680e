/// Frames a textual message into and out of datagram bytes. The concrete
/// encoding is a UTF-8 pass-through; the datagram boundary is the only
/// framing. `deserialize(serialize(s)) == Some(s)` for every string.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketCodec;

impl PacketCodec {
    pub fn serialize(&self, text: &str) -> Vec<u8> {
        text.as_bytes().to_vec()
    }

    pub fn deserialize(&self, bytes: &[u8]) -> Option<String> {
        std::str::from_utf8(bytes).ok().map(str::to_owned)
    }
}
