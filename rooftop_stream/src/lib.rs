//! Shared RooftopStream protocol helpers.
//!
//! The protocol sends a fixed-size header followed by a MessagePack payload.
//! Every scene call the app issues to its host, and every event the host
//! delivers back, travels through these types so producers and consumers
//! stay interoperable.

use std::convert::TryFrom;

use bytes::Buf;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

/// Bytes that prefix every RooftopStream message ("ROOF").
pub const HEADER_MAGIC: [u8; 4] = *b"ROOF";

/// Protocol revision understood by this crate.
pub const PROTOCOL_VERSION: u16 = 0x0001;

/// Length of the binary header in bytes.
pub const HEADER_LEN: usize = 4 + 2 + 2 + 4;

/// Message kinds understood by RooftopStream v1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr, Hash)]
#[repr(u16)]
pub enum MessageKind {
    Hello = 0x0001,
    Command = 0x0002,
    Ack = 0x0003,
    Event = 0x0004,
    Heartbeat = 0x0005,
}

/// Envelope describing the upcoming payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub version: u16,
    pub kind: MessageKind,
    pub length: u32,
}

impl MessageHeader {
    /// Encode the header as big-endian bytes.
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[..4].copy_from_slice(&HEADER_MAGIC);
        out[4..6].copy_from_slice(&self.version.to_be_bytes());
        out[6..8].copy_from_slice(&(self.kind as u16).to_be_bytes());
        out[8..12].copy_from_slice(&self.length.to_be_bytes());
        out
    }

    /// Decode a header from raw bytes.
    pub fn decode(input: &[u8]) -> Result<Self, ProtocolError> {
        if input.len() < HEADER_LEN {
            return Err(ProtocolError::TruncatedHeader);
        }
        if &input[..4] != HEADER_MAGIC {
            return Err(ProtocolError::BadMagic);
        }
        let mut version_bytes = &input[4..6];
        let version = version_bytes.get_u16();
        let mut kind_bytes = &input[6..8];
        let kind_raw = kind_bytes.get_u16();
        let kind = MessageKind::try_from(kind_raw)
            .map_err(|_| ProtocolError::UnknownMessageKind(kind_raw))?;
        let mut len_bytes = &input[8..12];
        let length = len_bytes.get_u32();
        Ok(Self {
            version,
            kind,
            length,
        })
    }
}

impl TryFrom<u16> for MessageKind {
    type Error = ();

    fn try_from(value: u16) -> std::result::Result<Self, Self::Error> {
        match value {
            0x0001 => Ok(Self::Hello),
            0x0002 => Ok(Self::Command),
            0x0003 => Ok(Self::Ack),
            0x0004 => Ok(Self::Event),
            0x0005 => Ok(Self::Heartbeat),
            _ => Err(()),
        }
    }
}

/// Minimal handshake message that opens a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    pub protocol: String,
    pub producer: String,
    pub build: Option<String>,
}

impl Hello {
    pub fn new(producer: impl Into<String>, build: Option<String>) -> Self {
        Self {
            protocol: "RooftopStream".to_string(),
            producer: producer.into(),
            build,
        }
    }
}

/// Transform patch at wire level. Absent fields leave the host value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTransform {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position: Option<[f32; 3]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotation: Option<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scale: Option<[f32; 3]>,
}

/// One (time, transform) sample consumed by the host's interpolator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireKeyframe {
    pub time: f32,
    pub value: WireTransform,
}

/// Mesh shapes the host can instantiate without an asset fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveShape {
    Box,
    Cylinder,
    Plane,
    Sphere,
}

/// Where attached text hangs relative to its actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    TopCenter,
    MiddleCenter,
    BottomCenter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextJustify {
    Left,
    Center,
    Right,
}

/// Input-handling capabilities the host can attach to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    Button,
}

/// Orientation-tracking modes for `LookAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookAtMode {
    None,
    TargetXy,
    TargetXyz,
}

/// What a `LookAt` command should track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum LookAtTarget {
    User { user: String },
    Position { position: [f32; 3] },
}

/// One outbound scene call, wrapped with its issue sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub seq: u64,
    pub payload: CommandPayload,
}

/// Every scene-graph operation the app can ask the host to perform.
///
/// `actor` is the forward handle the app assigned; the host adopts it and
/// answers with an [`Ack`] once the underlying object exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommandPayload {
    CreatePrimitive {
        actor: u32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        parent: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        name: Option<String>,
        shape: PrimitiveShape,
        dimensions: [f32; 3],
        #[serde(skip_serializing_if = "Option::is_none", default)]
        radius: Option<f32>,
        collider: bool,
        is_trigger: bool,
        transform: WireTransform,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        tag: Option<String>,
    },
    CreateEmpty {
        actor: u32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        parent: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        name: Option<String>,
        transform: WireTransform,
    },
    CreateFromModel {
        actor: u32,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        parent: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        name: Option<String>,
        resource_url: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        collider: Option<PrimitiveShape>,
        transform: WireTransform,
    },
    AttachText {
        actor: u32,
        contents: String,
        anchor: TextAnchor,
        color: [f32; 3],
        height: f32,
        justify: TextJustify,
    },
    CreateAnimation {
        actor: u32,
        name: String,
        keyframes: Vec<WireKeyframe>,
    },
    EnableAnimation {
        actor: u32,
        name: String,
    },
    SetBehavior {
        actor: u32,
        behavior: BehaviorKind,
    },
    LookAt {
        actor: u32,
        #[serde(flatten)]
        target: LookAtTarget,
        mode: LookAtMode,
    },
    DestroyActor {
        actor: u32,
    },
}

impl CommandPayload {
    /// Forward handle the payload addresses, when it addresses one.
    pub fn actor(&self) -> u32 {
        match self {
            CommandPayload::CreatePrimitive { actor, .. }
            | CommandPayload::CreateEmpty { actor, .. }
            | CommandPayload::CreateFromModel { actor, .. }
            | CommandPayload::AttachText { actor, .. }
            | CommandPayload::CreateAnimation { actor, .. }
            | CommandPayload::EnableAnimation { actor, .. }
            | CommandPayload::SetBehavior { actor, .. }
            | CommandPayload::LookAt { actor, .. }
            | CommandPayload::DestroyActor { actor } => *actor,
        }
    }
}

/// Host resolution of a forward handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(u16)]
pub enum AckStatus {
    Resolved = 0x0001,
    Rejected = 0x0002,
}

/// Asynchronous answer to a creation command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub seq: u64,
    pub actor: u32,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Hover phases reported by a button behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoverPhase {
    Enter,
    Exit,
}

/// One inbound host event, wrapped with its delivery sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    pub payload: EventPayload,
}

/// Everything the host can tell the app about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventPayload {
    Started,
    UserJoined {
        id: String,
        name: String,
    },
    UserLeft {
        id: String,
    },
    ButtonHover {
        actor: u32,
        user: String,
        phase: HoverPhase,
    },
    ButtonClick {
        actor: u32,
        user: String,
    },
    TriggerEnter {
        actor: u32,
        other: u32,
        #[serde(default)]
        data: Value,
    },
    CollisionEnter {
        actor: u32,
        other: u32,
        #[serde(default)]
        data: Value,
    },
    AnimationFinished {
        actor: u32,
        animation: String,
    },
}

/// Error conditions returned by the protocol helpers.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("header smaller than {HEADER_LEN} bytes")]
    TruncatedHeader,
    #[error("header magic mismatch")]
    BadMagic,
    #[error("message kind {0:#06x} is unknown")]
    UnknownMessageKind(u16),
    #[error("payload length mismatch: header declared {expected} bytes but read {actual}")]
    LengthMismatch { expected: u32, actual: usize },
    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] rmp_serde::decode::Error),
    #[error("payload encode error: {0}")]
    PayloadEncode(#[from] rmp_serde::encode::Error),
}

/// Wraps a payload with framing suitable for the wire.
pub fn encode_message<T>(kind: MessageKind, payload: &T) -> Result<Vec<u8>, ProtocolError>
where
    T: Serialize,
{
    let payload_bytes = rmp_serde::to_vec_named(payload)?;
    let header = MessageHeader {
        version: PROTOCOL_VERSION,
        kind,
        length: u32::try_from(payload_bytes.len()).map_err(|_| ProtocolError::LengthMismatch {
            expected: u32::MAX,
            actual: payload_bytes.len(),
        })?,
    };
    let mut out = Vec::with_capacity(HEADER_LEN + payload_bytes.len());
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(&payload_bytes);
    Ok(out)
}

/// Decodes a framed message returning both header and payload bytes.
pub fn decode_envelope(bytes: &[u8]) -> std::result::Result<(MessageHeader, &[u8]), ProtocolError> {
    if bytes.len() < HEADER_LEN {
        return Err(ProtocolError::TruncatedHeader);
    }
    let header = MessageHeader::decode(&bytes[..HEADER_LEN])?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != header.length as usize {
        return Err(ProtocolError::LengthMismatch {
            expected: header.length,
            actual: payload.len(),
        });
    }
    Ok((header, payload))
}

/// Decode a payload straight into the requested type.
pub fn decode_payload<T>(payload: &[u8]) -> std::result::Result<T, ProtocolError>
where
    T: for<'de> Deserialize<'de>,
{
    let value = rmp_serde::from_slice(payload)?;
    Ok(value)
}
