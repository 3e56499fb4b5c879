// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error taxonomy.
//!
//! Call-level failures (`TransportError`, `ProtocolError`) abort a whole
//! client call; element-level failures (`RpcError`) occupy one slot of a
//! batch while siblings proceed. `HandlerError` is the failure surface of
//! server-side hooks, decodes, and endpoints.

use serde_json::Value;
use thiserror::Error;

use crate::constants::jsonrpc;
use crate::protocol::envelope::ErrorObject;

/// An application-level JSON-RPC error, round-tripped verbatim between
/// server and client. Display prints the message only, matching the wire
/// `message` field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RpcError {
    code: i32,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl From<ErrorObject> for RpcError {
    fn from(object: ErrorObject) -> Self {
        Self {
            code: object.code,
            message: object.message,
            data: object.data,
        }
    }
}

impl From<RpcError> for ErrorObject {
    fn from(error: RpcError) -> Self {
        Self {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }
}

/// HTTP-level failures. Client-side these abort the whole batch.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP request: {0}")]
    BuildRequest(#[source] reqwest::Error),
    #[error("failed to encode request batch: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("HTTP transport failure: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("response body exceeds {limit} byte limit")]
    BodyTooLarge { limit: u64 },
}

/// Malformed JSON-RPC framing or broken batch correlation.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("failed to decode response batch: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response id {0} is not an unsigned integer")]
    InvalidId(Value),
    #[error("response carries unknown id {0}")]
    UnknownId(u64),
    #[error("duplicate response for id {0}")]
    DuplicateId(u64),
    #[error("no response received for request {index} (id {id})")]
    MissingResponse { id: u64, index: usize },
}

/// Failure surface of a client call as a whole. Per-element server errors
/// are not represented here; they land in the batch result as [`RpcError`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("failed to convert result for request {index}: {source}")]
    ResultConversion {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("no requests submitted")]
    NoRequests,
}

/// Failure raised by a server-side before-hook, params decode, or endpoint.
///
/// An `Rpc` failure keeps its code, message, and data on the wire; anything
/// else collapses to internal error (-32603) carrying the description.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(text.into()))
    }

    pub(crate) fn to_error_object(&self) -> ErrorObject {
        match self {
            HandlerError::Rpc(error) => error.clone().into(),
            HandlerError::Other(error) => ErrorObject {
                code: jsonrpc::ERROR_INTERNAL,
                message: error.to_string(),
                data: None,
            },
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Other(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rpc_error_round_trips_through_wire_object() {
        let error = RpcError::new(-32050, "quota exceeded").with_data(json!({"limit": 10}));
        let object: ErrorObject = error.clone().into();
        let decoded: RpcError = object.into();
        assert_eq!(decoded, error);
    }

    #[test]
    fn rpc_error_displays_message_only() {
        let error = RpcError::new(-32603, "boom");
        assert_eq!(error.to_string(), "boom");
    }

    #[test]
    fn handler_error_preserves_rpc_code() {
        let handler_error = HandlerError::from(RpcError::new(-32050, "quota exceeded"));
        let object = handler_error.to_error_object();
        assert_eq!(object.code, -32050);
        assert_eq!(object.message, "quota exceeded");
    }

    #[test]
    fn handler_error_other_maps_to_internal() {
        let handler_error = HandlerError::message("db unavailable");
        let object = handler_error.to_error_object();
        assert_eq!(object.code, jsonrpc::ERROR_INTERNAL);
        assert_eq!(object.message, "db unavailable");
    }
}
