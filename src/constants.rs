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

//! wireline constants - single source of truth for protocol-level values.
//!
//! Centralizes the JSON-RPC error codes, transport limits, environment
//! variable names, and well-known context keys.

/// JSON-RPC 2.0 protocol constants
pub mod jsonrpc {
    /// Protocol version string carried by every envelope
    pub const VERSION: &str = "2.0";
    /// Parse error (standard JSON-RPC)
    pub const ERROR_PARSE: i32 = -32700;
    /// Invalid request (standard JSON-RPC, defined but not raised internally)
    pub const ERROR_INVALID_REQUEST: i32 = -32600;
    /// Method not found (standard JSON-RPC)
    pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params (standard JSON-RPC, defined but not raised internally)
    pub const ERROR_INVALID_PARAMS: i32 = -32602;
    /// Internal error (standard JSON-RPC)
    pub const ERROR_INTERNAL: i32 = -32603;
}

/// Transport limits (DoS protection)
pub mod limits {
    /// Maximum allowed HTTP body size for a request or response batch (10 MB)
    pub const MAX_BODY_SIZE_BYTES: u64 = 10 * 1024 * 1024;
}

/// Configuration environment variables
pub mod config {
    pub const ENV_LOG_LEVEL: &str = "WIRELINE_LOG_LEVEL";
    pub const ENV_LOG_FORMAT: &str = "WIRELINE_LOG_FORMAT";
    pub const ENV_BIND_ADDR: &str = "WIRELINE_BIND_ADDR";
    pub const ENV_MAX_BODY_BYTES: &str = "WIRELINE_MAX_BODY_BYTES";
}

/// Well-known `CallContext` keys seeded by the server before dispatch
pub mod context {
    /// Method name of the element being dispatched
    pub const METHOD: &str = "rpc.method";
    /// Correlation id of the element being dispatched
    pub const REQUEST_ID: &str = "rpc.id";
}
