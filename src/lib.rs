#![forbid(unsafe_code)]
#![warn(clippy::all)]
// #![deny(missing_docs)]

//! Sans-IO TLS 1.2 client engine.
//!
//! The state machine lives in [`Client`]: bytes from the transport go in,
//! framed records come out, and the caller owns all I/O. [`Connection`]
//! wraps a [`Client`] around a [`Transport`] for the common case.
//!
//! Cryptography is pluggable through [`crypto::CryptoProvider`]; the
//! built-in provider is backed by the RustCrypto crates.

pub mod crypto;
pub mod message;
pub mod record;

mod client;
mod config;
mod connection;
mod engine;
mod error;
mod types;

pub use client::{Client, HandshakeState};
pub use config::{Config, ConfigBuilder};
pub use connection::{Connection, Poll, Transport};
pub use error::{Error, FailReason};
pub use types::{
    CipherSuite, CompressionMethod, ContentType, HashAlgorithm, MessageType, NamedGroup,
    ProtocolVersion, SignatureScheme,
};
