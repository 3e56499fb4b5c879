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

//! JSON-RPC 2.0 envelopes and batch framing.
//!
//! A request body is either a single envelope object or an array of them.
//! The framing of the response mirrors the framing of the request: batch in,
//! array out; single in, bare object out.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::jsonrpc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Correlation id. Clients emit unsigned integers; servers echo whatever
    /// arrived, null included (a request without an id decodes as null).
    #[serde(default)]
    pub id: Value,
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RequestEnvelope {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: id.into(),
            jsonrpc: jsonrpc::VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Wire-level error object carried by a failed response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: Value,
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl ResponseEnvelope {
    /// A successful envelope; `error` is absent.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            jsonrpc: jsonrpc::VERSION.to_string(),
            result: Some(result),
            error: None,
        }
    }

    /// A failed envelope; `result` is absent.
    pub fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            id,
            jsonrpc: jsonrpc::VERSION.to_string(),
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A decoded request body, preserving its single/batch framing.
#[derive(Debug, Clone)]
pub enum RequestPayload {
    Single(RequestEnvelope),
    Batch(Vec<RequestEnvelope>),
}

impl RequestPayload {
    /// Decode a request body, detecting framing from the first significant
    /// byte: an array-open means batch, anything else a single envelope.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        let first = body
            .iter()
            .copied()
            .find(|b| !b.is_ascii_whitespace())
            .unwrap_or(0);
        if first == b'[' {
            serde_json::from_slice(body).map(RequestPayload::Batch)
        } else {
            serde_json::from_slice(body).map(RequestPayload::Single)
        }
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, RequestPayload::Batch(_))
    }

    pub fn len(&self) -> usize {
        match self {
            RequestPayload::Single(_) => 1,
            RequestPayload::Batch(requests) => requests.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
