// (c) 2026 The rconsole authors

//! RCON packet codec
//!
//! # On-wire layout
//!
//! All integers are little-endian `i32`.
//!
//! | Field        | Size     | Notes                                                  |
//! |--------------|----------|--------------------------------------------------------|
//! | `size`       | 4        | Byte count of everything that follows (not itself)     |
//! | `request_id` | 4        | Chosen by the client; echoed by the server             |
//! | `kind`       | 4        | See [`PacketKind`]                                     |
//! | `body`       | variable | Command or response text (no embedded terminator)      |
//! | terminators  | 2        | Two NUL bytes: one ends the body, one ends the packet  |
//!
//! So `size == 4 + 4 + body.len() + 2` always holds.

use bytes::{Buf as _, BufMut as _, BytesMut};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt as _};

/// Bytes of the envelope counted by `size`: request id, kind, two NULs
pub const ENVELOPE_SIZE: usize = 4 + 4 + 2;

/// Bytes taken up by the `size` field itself
pub const SIZE_FIELD: usize = 4;

/// Hard ceiling on the declared size of an incoming packet.
///
/// Servers send at most a few KiB per packet; anything above this is corruption.
pub const FRAME_LIMIT: usize = 1_048_576;

/// The `type` field of a packet.
///
/// The protocol overloads the value 2: it means `EXECCOMMAND` from client to
/// server and `AUTH_RESPONSE` from server to client, so this is a newtype
/// rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketKind(pub i32);

impl PacketKind {
    /// Client → server: authenticate with the body as password
    pub const AUTH: Self = Self(3);
    /// Server → client: outcome of an `AUTH`
    pub const AUTH_RESPONSE: Self = Self(2);
    /// Client → server: run the body as a console command
    pub const EXEC_COMMAND: Self = Self(2);
    /// Server → client: (part of) a command response
    pub const RESPONSE_VALUE: Self = Self(0);
}

impl std::fmt::Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self.0 {
            3 => "AUTH",
            2 => "AUTH_RESPONSE/EXECCOMMAND",
            0 => "RESPONSE_VALUE",
            _ => "unknown",
        };
        write!(f, "{name}({})", self.0)
    }
}

/// Framing violations found while decoding
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPacket {
    /// Fewer bytes than the smallest possible packet
    #[error("packet too short: {0} bytes, need at least {min}", min = SIZE_FIELD + ENVELOPE_SIZE)]
    TooShort(usize),
    /// `size` disagrees with the number of bytes that follow it
    #[error("declared size {declared} does not match actual size {actual}")]
    SizeMismatch {
        /// What the packet claims
        declared: i32,
        /// What we actually got
        actual: usize,
    },
    /// `size` is negative, below the envelope or above [`FRAME_LIMIT`]
    #[error("declared size {0} is out of range")]
    SizeOutOfRange(i32),
    /// The two trailing bytes are not both NUL
    #[error("packet terminators missing")]
    MissingTerminator,
}

/// A decoded RCON packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Correlation id
    pub request_id: i32,
    /// Packet type
    pub kind: PacketKind,
    /// Body, without terminators
    pub body: Vec<u8>,
}

impl Packet {
    /// Constructor
    #[must_use]
    pub fn new<B: Into<Vec<u8>>>(request_id: i32, kind: PacketKind, body: B) -> Self {
        Self {
            request_id,
            kind,
            body: body.into(),
        }
    }

    /// The value of the `size` field for this packet
    #[must_use]
    pub fn declared_size(&self) -> usize {
        ENVELOPE_SIZE + self.body.len()
    }

    /// Body as text. Servers are not always careful about UTF-8, so this is lossy.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Wire encoding of this packet
    #[must_use]
    pub fn encode(&self) -> BytesMut {
        encode(self.request_id, self.kind, &self.body)
    }
}

/// Encodes a packet.
///
/// Callers keep the body within [`FRAME_LIMIT`]; the session refuses anything larger.
#[must_use]
pub fn encode(request_id: i32, kind: PacketKind, body: &[u8]) -> BytesMut {
    let size = ENVELOPE_SIZE + body.len();
    debug_assert!(size <= FRAME_LIMIT);
    let mut buf = BytesMut::with_capacity(SIZE_FIELD + size);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)] // checked by callers
    let size_field = size as i32;
    buf.put_i32_le(size_field);
    buf.put_i32_le(request_id);
    buf.put_i32_le(kind.0);
    buf.put_slice(body);
    buf.put_u8(0);
    buf.put_u8(0);
    buf
}

/// Decodes a complete packet, including its `size` field.
pub fn decode(buf: &[u8]) -> Result<Packet, MalformedPacket> {
    if buf.len() < SIZE_FIELD + ENVELOPE_SIZE {
        return Err(MalformedPacket::TooShort(buf.len()));
    }
    let mut cursor = buf;
    let declared = cursor.get_i32_le();
    let actual = cursor.len();
    if usize::try_from(declared).ok() != Some(actual) {
        return Err(MalformedPacket::SizeMismatch { declared, actual });
    }
    decode_after_size(cursor)
}

/// Decodes the part of a packet that follows the `size` field.
/// The caller is responsible for having checked the size.
fn decode_after_size(mut rest: &[u8]) -> Result<Packet, MalformedPacket> {
    if rest.len() < ENVELOPE_SIZE {
        return Err(MalformedPacket::TooShort(rest.len() + SIZE_FIELD));
    }
    let request_id = rest.get_i32_le();
    let kind = PacketKind(rest.get_i32_le());
    let (body, terminators) = rest.split_at(rest.len() - 2);
    if terminators != [0, 0] {
        return Err(MalformedPacket::MissingTerminator);
    }
    Ok(Packet {
        request_id,
        kind,
        body: body.to_vec(),
    })
}

/// Errors arising from reading a packet off a stream
#[derive(Debug, Error)]
pub enum ReadError {
    /// Transport-level I/O failure (including EOF mid-packet)
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The bytes did not make a packet
    #[error(transparent)]
    Malformed(#[from] MalformedPacket),
}

/// Reads exactly one packet from a stream.
///
/// The declared size is bounds-checked before anything is allocated for the body.
pub async fn read_packet<R>(reader: &mut R) -> Result<Packet, ReadError>
where
    R: AsyncRead + Unpin,
{
    let declared = reader.read_i32_le().await?;
    let size = usize::try_from(declared)
        .ok()
        .filter(|s| (ENVELOPE_SIZE..=FRAME_LIMIT).contains(s))
        .ok_or(MalformedPacket::SizeOutOfRange(declared))?;
    let mut rest = vec![0u8; size];
    let _ = reader.read_exact(&mut rest).await?;
    Ok(decode_after_size(&rest)?)
}
