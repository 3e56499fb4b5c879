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

//! wireline: batched JSON-RPC 2.0 over HTTP.
//!
//! This library implements both sides of the JSON-RPC 2.0 protocol on top
//! of plain HTTP POST bodies: a client engine that batches calls and
//! correlates responses by id, and a server engine that dispatches single
//! or batched payloads through a composable endpoint-middleware pipeline.

pub mod client;
pub mod config;
pub mod constants;
pub mod context;
pub mod middleware;
pub mod protocol;
pub mod server;

pub use context::CallContext;
pub use middleware::{chain, endpoint, handler, Endpoint, Middleware};
pub use protocol::error::{ClientError, HandlerError, ProtocolError, RpcError, TransportError};
