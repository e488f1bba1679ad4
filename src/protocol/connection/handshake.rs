use zerocopy::byteorder::little_endian::{U16 as U16LE, U32 as U32LE};
use zerocopy::{FromBytes, Immutable, KnownLayout};

use crate::constant::{
    CAPABILITIES_ALWAYS_ENABLED, CAPABILITIES_CONFIGURABLE, CapabilityFlags, ServerStatusFlags,
    UTF8MB4_GENERAL_CI,
};
use crate::error::{Error, Result};
use crate::protocol::primitive::*;
use crate::protocol::response::ErrPayloadBytes;

const MAX_PACKET_SIZE: u32 = 16_777_216;

#[derive(Debug, Clone, Copy, FromBytes, KnownLayout, Immutable)]
#[repr(C, packed)]
struct HandshakeFixedFields {
    connection_id: U32LE,
    auth_data_part1: [u8; 8],
    filler: u8,
    capability_flags_lower: U16LE,
    charset: u8,
    status_flags: U16LE,
    capability_flags_upper: U16LE,
    auth_data_len: u8,
}

/// Initial handshake packet (protocol version 10)
///
/// Ranges index into the payload the handshake was read from.
#[derive(Debug, Clone)]
pub struct InitialHandshake {
    pub protocol_version: u8,
    pub server_version: std::ops::Range<usize>,
    pub connection_id: u32,
    pub auth_plugin_data: Vec<u8>,
    pub capability_flags: CapabilityFlags,
    pub charset: u8,
    pub status_flags: ServerStatusFlags,
    pub auth_plugin_name: std::ops::Range<usize>,
}

/// Read initial handshake packet from server
pub fn read_initial_handshake(payload: &[u8]) -> Result<InitialHandshake> {
    let (protocol_version, data) = read_int_1(payload)?;

    if protocol_version == 0xFF {
        return Err(ErrPayloadBytes(payload).into());
    }

    let server_version_start = payload.len() - data.len();
    let (server_version_bytes, data) = read_string_null(data)?;
    let server_version = server_version_start..server_version_start + server_version_bytes.len();

    let (fixed, rest) =
        HandshakeFixedFields::ref_from_prefix(data).map_err(|_| Error::UnexpectedEof)?;

    let cap_bits = ((fixed.capability_flags_upper.get() as u32) << 16)
        | (fixed.capability_flags_lower.get() as u32);
    let capability_flags = CapabilityFlags::from_bits_truncate(cap_bits);

    let (_reserved, data) = read_string_fix(rest, 10)?;

    let auth_data_2_len = (fixed.auth_data_len as usize).saturating_sub(9).max(12);
    let (auth_data_2, data) = read_string_fix(data, auth_data_2_len)?;
    let (_reserved, data) = read_int_1(data)?;

    let mut auth_plugin_data = Vec::with_capacity(8 + auth_data_2.len());
    auth_plugin_data.extend_from_slice(&fixed.auth_data_part1);
    auth_plugin_data.extend_from_slice(auth_data_2);

    // Some servers omit the trailing NUL of the plugin name
    let auth_plugin_name_start = payload.len() - data.len();
    let name_len = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    let auth_plugin_name = auth_plugin_name_start..auth_plugin_name_start + name_len;

    Ok(InitialHandshake {
        protocol_version,
        server_version,
        connection_id: fixed.connection_id.get(),
        auth_plugin_data,
        capability_flags,
        charset: fixed.charset,
        status_flags: ServerStatusFlags::from_bits_truncate(fixed.status_flags.get()),
        auth_plugin_name,
    })
}

/// Handshake response packet sent by client (HandshakeResponse41)
#[derive(Debug, Clone)]
pub struct HandshakeResponse41<'a> {
    pub capability_flags: CapabilityFlags,
    pub max_packet_size: u32,
    pub charset: u8,
    pub username: &'a str,
    pub auth_response: &'a [u8],
    pub database: Option<&'a str>,
    pub auth_plugin_name: &'a [u8],
}

/// Write handshake response packet (HandshakeResponse41)
pub fn write_handshake_response(out: &mut Vec<u8>, response: &HandshakeResponse41<'_>) {
    write_int_4(out, response.capability_flags.bits());
    write_int_4(out, response.max_packet_size);
    write_int_1(out, response.charset);

    // reserved
    out.extend_from_slice(&[0u8; 23]);

    write_string_null(out, response.username);

    if response
        .capability_flags
        .contains(CapabilityFlags::CLIENT_PLUGIN_AUTH_LENENC_CLIENT_DATA)
    {
        write_bytes_lenenc(out, response.auth_response);
    } else {
        write_int_1(out, response.auth_response.len() as u8);
        out.extend_from_slice(response.auth_response);
    }

    if let Some(db) = response.database
        && response
            .capability_flags
            .contains(CapabilityFlags::CLIENT_CONNECT_WITH_DB)
    {
        write_string_null(out, db);
    }

    if response
        .capability_flags
        .contains(CapabilityFlags::CLIENT_PLUGIN_AUTH)
    {
        out.extend_from_slice(response.auth_plugin_name);
        out.push(0);
    }
}

/// Auth switch request from server
#[derive(Debug, Clone)]
pub struct AuthSwitchRequest<'a> {
    pub plugin_name: &'a [u8],
    pub plugin_data: &'a [u8],
}

/// Read auth switch request (0xFE with length >= 9)
pub fn read_auth_switch_request(payload: &[u8]) -> Result<AuthSwitchRequest<'_>> {
    let (header, data) = read_int_1(payload)?;
    if header != 0xFE {
        return Err(Error::InvalidPacket);
    }

    let (plugin_name, data) = read_string_null(data)?;
    let plugin_data = data.strip_suffix(&[0]).unwrap_or(data);
    Ok(AuthSwitchRequest {
        plugin_name,
        plugin_data,
    })
}

// ============================================================================
// Authentication Plugins
// ============================================================================

/// mysql_native_password authentication
///
/// SHA1(password) XOR SHA1(challenge + SHA1(SHA1(password)))
pub fn auth_mysql_native_password(password: &str, challenge: &[u8]) -> Vec<u8> {
    use sha1::{Digest, Sha1};

    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = Sha1::digest(password.as_bytes());
    let stage2 = Sha1::digest(stage1);

    let mut hasher = Sha1::new();
    hasher.update(&challenge[..challenge.len().min(20)]);
    hasher.update(stage2);
    let token = hasher.finalize();

    stage1.iter().zip(token.iter()).map(|(a, b)| a ^ b).collect()
}

/// caching_sha2_password authentication - initial response
///
/// XOR(SHA256(password), SHA256(SHA256(SHA256(password)), challenge))
pub fn auth_caching_sha2_password(password: &str, challenge: &[u8]) -> Vec<u8> {
    use sha2::{Digest, Sha256};

    if password.is_empty() {
        return Vec::new();
    }

    let stage1 = Sha256::digest(password.as_bytes());
    let stage2 = Sha256::digest(stage1);

    let mut hasher = Sha256::new();
    hasher.update(stage2);
    hasher.update(&challenge[..challenge.len().min(20)]);
    let scramble = hasher.finalize();

    stage1.iter().zip(scramble.iter()).map(|(a, b)| a ^ b).collect()
}

fn auth_response(plugin: &[u8], password: &str, challenge: &[u8]) -> Result<Vec<u8>> {
    match plugin {
        b"mysql_native_password" => Ok(auth_mysql_native_password(password, challenge)),
        b"caching_sha2_password" => Ok(auth_caching_sha2_password(password, challenge)),
        plugin => Err(Error::UnsupportedAuthPlugin(
            String::from_utf8_lossy(plugin).into_owned(),
        )),
    }
}

// ============================================================================
// State Machine API for Handshake
// ============================================================================

/// Credentials and negotiation input for the handshake
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    pub username: String,
    pub password: String,
    pub database: Option<String>,
    pub capabilities: CapabilityFlags,
}

/// Result of driving the handshake state machine
pub enum HandshakeResult {
    /// Initial handshake received - write response to server
    InitialHandshake {
        handshake_response: Vec<u8>,
        initial_handshake: InitialHandshake,
    },
    /// Write this packet to the server, then read next response
    Write(Vec<u8>),
    /// Nothing to write, read the next packet
    Read,
    /// Handshake complete, connection established
    Connected { capability_flags: CapabilityFlags },
}

/// State machine for MySQL handshake
///
/// Pure parsing and packet generation state machine without I/O dependencies.
pub enum Handshake {
    /// Waiting for initial handshake from server
    Start { config: HandshakeConfig },
    /// Sent handshake response or auth switch response, waiting for auth result
    WaitingAuthResult {
        config: HandshakeConfig,
        plugin: Vec<u8>,
        capability_flags: CapabilityFlags,
    },
    /// Connected (terminal state)
    Connected,
}

impl Handshake {
    pub fn new(config: HandshakeConfig) -> Self {
        Self::Start { config }
    }

    /// Drive the state machine with the next payload
    pub fn drive(&mut self, payload: &[u8]) -> Result<HandshakeResult> {
        match std::mem::replace(self, Self::Connected) {
            Self::Start { config } => {
                let handshake = read_initial_handshake(payload)?;

                let mut client_caps =
                    CAPABILITIES_ALWAYS_ENABLED | (config.capabilities & CAPABILITIES_CONFIGURABLE);
                if config.database.is_some() {
                    client_caps |= CapabilityFlags::CLIENT_CONNECT_WITH_DB;
                }
                let capability_flags = client_caps & handshake.capability_flags;

                if !capability_flags.contains(CapabilityFlags::CLIENT_PROTOCOL_41) {
                    return Err(Error::BadConfigError(
                        "server does not support protocol 4.1".to_string(),
                    ));
                }

                let plugin = payload
                    .get(handshake.auth_plugin_name.clone())
                    .ok_or(Error::InvalidPacket)?
                    .to_vec();
                let auth = auth_response(&plugin, &config.password, &handshake.auth_plugin_data)?;

                let mut handshake_response = Vec::new();
                write_handshake_response(
                    &mut handshake_response,
                    &HandshakeResponse41 {
                        capability_flags,
                        max_packet_size: MAX_PACKET_SIZE,
                        charset: UTF8MB4_GENERAL_CI,
                        username: &config.username,
                        auth_response: &auth,
                        database: config.database.as_deref(),
                        auth_plugin_name: &plugin,
                    },
                );

                *self = Self::WaitingAuthResult {
                    config,
                    plugin,
                    capability_flags,
                };

                Ok(HandshakeResult::InitialHandshake {
                    handshake_response,
                    initial_handshake: handshake,
                })
            }

            Self::WaitingAuthResult {
                config,
                plugin,
                capability_flags,
            } => match payload.first() {
                Some(0x00) => Ok(HandshakeResult::Connected { capability_flags }),
                Some(0xFF) => Err(ErrPayloadBytes(payload).into()),
                // caching_sha2_password fast auth result
                Some(0x01) if plugin == b"caching_sha2_password" => match payload.get(1) {
                    Some(0x03) => {
                        *self = Self::WaitingAuthResult {
                            config,
                            plugin,
                            capability_flags,
                        };
                        Ok(HandshakeResult::Read)
                    }
                    Some(0x04) => Err(Error::UnsupportedAuthPlugin(
                        "caching_sha2_password full authentication (requires TLS or RSA)"
                            .to_string(),
                    )),
                    _ => Err(Error::InvalidPacket),
                },
                Some(0xFE) => {
                    let switch = read_auth_switch_request(payload)?;
                    let auth = auth_response(switch.plugin_name, &config.password, switch.plugin_data)?;
                    let plugin = switch.plugin_name.to_vec();
                    *self = Self::WaitingAuthResult {
                        config,
                        plugin,
                        capability_flags,
                    };
                    Ok(HandshakeResult::Write(auth))
                }
                _ => Err(Error::InvalidPacket),
            },

            Self::Connected => Err(Error::InvalidPacket),
        }
    }
}
