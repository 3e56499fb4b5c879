//! Wire-level protocol types.
//!
//! Envelope shapes, batch framing detection, and the error taxonomy shared
//! by the client and server engines.

pub mod envelope;
pub mod error;

pub use envelope::{ErrorObject, RequestEnvelope, RequestPayload, ResponseEnvelope};
pub use error::RpcError;
