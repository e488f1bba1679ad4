mod handshake;

pub use handshake::Handshake;
pub use handshake::HandshakeConfig;
pub use handshake::HandshakeResult;
pub use handshake::InitialHandshake;
