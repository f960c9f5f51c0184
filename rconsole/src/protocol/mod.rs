// (c) 2026 The rconsole authors

//! # 📖 The RCON protocol
//!
//! RCON is the binary remote-console protocol spoken by Minecraft (and Source
//! engine) servers on a dedicated TCP port, 25575 by default.
//!
//! ## Exchange
//!
//! 1. The client connects and sends an `AUTH` packet whose body is the password.
//! 1. The server answers with `AUTH_RESPONSE`. A request id of -1 means the
//!    password was wrong; anything else means we are in.
//! 1. The client sends `EXECCOMMAND` packets; the server answers each with one
//!    or more `RESPONSE_VALUE` packets carrying the same request id.
//!
//! The protocol is strictly one-request-at-a-time. We never send a second
//! command before the first response has been read, and in practice we only
//! ever send one command per connection.
//!
//! ## Long responses
//!
//! A server may split a long response across several packets and gives no
//! indication of where it ends. [`ResponseEnd`](session::ResponseEnd) selects
//! between waiting for a short idle gap (the default) and taking only the first
//! packet. See `RCON_RESPONSE_END` in the [configuration](crate::config).

pub mod packet;
pub mod session;

pub use packet::{MalformedPacket, Packet, PacketKind};
pub use session::{ResponseEnd, Session, SessionError, SessionSettings};
