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

//! JSON-RPC 2.0 server engine.
//!
//! Parses a request body into one or more envelopes, dispatches each to a
//! registered method through its composed middleware chain, and reassembles
//! responses preserving the single/batch framing of the request. Every
//! failure past top-level parsing is isolated to its element.
//!
//! Method options are composed with server-wide defaults when the method is
//! registered, not at dispatch time; the registry is read-only afterwards
//! and an `Arc<Server>` can be shared across concurrent dispatches.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::constants::{context as context_keys, jsonrpc, limits};
use crate::context::CallContext;
use crate::middleware::{chain, Endpoint, Middleware};
use crate::protocol::envelope::{ErrorObject, RequestEnvelope, RequestPayload, ResponseEnvelope};
use crate::protocol::error::HandlerError;

pub mod http;

/// Runs before params decoding for each element. Receives the inbound
/// transport request; may fail (aborting only that element) and may rewrite
/// the execution context.
pub type BeforeHook =
    Arc<dyn Fn(CallContext, &InboundRequest) -> Result<CallContext, HandlerError> + Send + Sync>;

/// Runs after a successful endpoint invocation. Receives the outbound reply
/// headers (for header injection); not expected to fail.
pub type AfterHook = Arc<dyn Fn(CallContext, &mut HeaderMap) -> CallContext + Send + Sync>;

/// Decodes raw params into the application-level input handed to the
/// endpoint. A failure aborts only that element.
pub type DecodeFn =
    Arc<dyn Fn(&CallContext, Option<&Value>) -> Result<Value, HandlerError> + Send + Sync>;

/// The inbound transport request as seen by before-hooks.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub uri: String,
    pub headers: HeaderMap,
}

impl InboundRequest {
    pub fn new(uri: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            uri: uri.into(),
            headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// A params-decode that passes raw params through unchanged (absent params
/// become null).
pub fn decode_passthrough() -> DecodeFn {
    Arc::new(|_context, params| Ok(params.cloned().unwrap_or(Value::Null)))
}

/// A params-decode that validates deserialization into `P` before handing
/// the raw value to the endpoint.
pub fn decode_as<P: DeserializeOwned>() -> DecodeFn {
    Arc::new(|_context, params| {
        let value = params.cloned().unwrap_or(Value::Null);
        serde_json::from_value::<P>(value.clone())?;
        Ok(value)
    })
}

/// Registration-time description of one method.
pub struct MethodDef {
    name: String,
    endpoint: Endpoint,
    decode: DecodeFn,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    middleware: Vec<Middleware>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            name: name.into(),
            endpoint,
            decode: decode_passthrough(),
            before: Vec::new(),
            after: Vec::new(),
            middleware: Vec::new(),
        }
    }

    #[must_use]
    pub fn decode(mut self, decode: DecodeFn) -> Self {
        self.decode = decode;
        self
    }

    #[must_use]
    pub fn before(mut self, hook: BeforeHook) -> Self {
        self.before.push(hook);
        self
    }

    #[must_use]
    pub fn after(mut self, hook: AfterHook) -> Self {
        self.after.push(hook);
        self
    }

    /// Method-specific middleware, composed inside server-wide middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }
}

struct RegisteredMethod {
    endpoint: Endpoint,
    decode: DecodeFn,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
}

/// A dispatch outcome preserving the request's framing: batch in, array
/// out; single in, bare object out.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(ResponseEnvelope),
    Batch(Vec<ResponseEnvelope>),
}

impl Reply {
    pub fn is_batch(&self) -> bool {
        matches!(self, Reply::Batch(_))
    }

    pub fn envelopes(&self) -> &[ResponseEnvelope] {
        match self {
            Reply::Single(envelope) => std::slice::from_ref(envelope),
            Reply::Batch(envelopes) => envelopes,
        }
    }
}

fn parse_error_reply(message: String) -> Reply {
    Reply::Single(ResponseEnvelope::failure(
        Value::Null,
        ErrorObject {
            code: jsonrpc::ERROR_PARSE,
            message,
            data: None,
        },
    ))
}

pub struct Server {
    methods: HashMap<String, RegisteredMethod>,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    middleware: Vec<Middleware>,
    max_body_bytes: u64,
}

impl Default for Server {
    fn default() -> Self {
        ServerBuilder::default().build()
    }
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Bind a method. Server-wide defaults are composed into the definition
    /// here, once: hook lists run defaults-then-method, middleware wraps
    /// with server-wide elements outermost. Re-registering a name replaces
    /// the prior binding.
    pub fn register(&mut self, def: MethodDef) {
        let MethodDef {
            name,
            endpoint,
            decode,
            before,
            after,
            middleware,
        } = def;

        let mut combined_middleware = self.middleware.clone();
        combined_middleware.extend(middleware);
        let endpoint = chain(combined_middleware)(endpoint);

        let mut combined_before = self.before.clone();
        combined_before.extend(before);
        let mut combined_after = self.after.clone();
        combined_after.extend(after);

        let replaced = self
            .methods
            .insert(
                name.clone(),
                RegisteredMethod {
                    endpoint,
                    decode,
                    before: combined_before,
                    after: combined_after,
                },
            )
            .is_some();
        if replaced {
            debug!(method = %name, "replaced existing method registration");
        }
    }

    /// Decode and process one request body. Top-level parse failure yields a
    /// single unwrapped parse-error envelope with a null id; past that,
    /// every failure is confined to its element.
    pub async fn dispatch(
        &self,
        context: CallContext,
        request: &InboundRequest,
        body: &[u8],
        reply_headers: &mut HeaderMap,
    ) -> Reply {
        let payload = match RequestPayload::parse(body) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "failed to parse request body");
                return parse_error_reply(e.to_string());
            }
        };
        debug!(
            requests = payload.len(),
            batch = payload.is_batch(),
            "dispatching payload"
        );
        match payload {
            RequestPayload::Single(envelope) => Reply::Single(
                self.handle_request(context, request, envelope, reply_headers)
                    .await,
            ),
            RequestPayload::Batch(envelopes) => {
                let mut replies = Vec::with_capacity(envelopes.len());
                for envelope in envelopes {
                    replies.push(
                        self.handle_request(context.clone(), request, envelope, reply_headers)
                            .await,
                    );
                }
                Reply::Batch(replies)
            }
        }
    }

    async fn handle_request(
        &self,
        mut context: CallContext,
        request: &InboundRequest,
        envelope: RequestEnvelope,
        reply_headers: &mut HeaderMap,
    ) -> ResponseEnvelope {
        let RequestEnvelope {
            id, method, params, ..
        } = envelope;

        let Some(registered) = self.methods.get(&method) else {
            debug!(method = %method, "method not found");
            return ResponseEnvelope::failure(
                id,
                ErrorObject {
                    code: jsonrpc::ERROR_METHOD_NOT_FOUND,
                    message: format!("method {method} not found"),
                    data: None,
                },
            );
        };

        context.insert(context_keys::METHOD, method.clone());
        context.insert(context_keys::REQUEST_ID, id.clone());

        for hook in &registered.before {
            context = match hook(context, request) {
                Ok(context) => context,
                Err(e) => return ResponseEnvelope::failure(id, e.to_error_object()),
            };
        }

        let input = match (registered.decode)(&context, params.as_ref()) {
            Ok(input) => input,
            Err(e) => return ResponseEnvelope::failure(id, e.to_error_object()),
        };

        let output = match (registered.endpoint)(context.clone(), input).await {
            Ok(output) => output,
            Err(e) => {
                debug!(method = %method, error = %e, "endpoint failed");
                return ResponseEnvelope::failure(id, e.to_error_object());
            }
        };

        for hook in &registered.after {
            context = hook(context, reply_headers);
        }

        ResponseEnvelope::success(id, output)
    }
}

#[derive(Default)]
pub struct ServerBuilder {
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    middleware: Vec<Middleware>,
    max_body_bytes: Option<u64>,
}

impl ServerBuilder {
    /// Append a default before-hook applied to every registered method.
    #[must_use]
    pub fn before(mut self, hook: BeforeHook) -> Self {
        self.before.push(hook);
        self
    }

    /// Append a default after-hook applied to every registered method.
    #[must_use]
    pub fn after(mut self, hook: AfterHook) -> Self {
        self.after.push(hook);
        self
    }

    /// Append server-wide middleware; it wraps outside any method-specific
    /// middleware.
    #[must_use]
    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = Some(limit);
        self
    }

    pub fn build(self) -> Server {
        Server {
            methods: HashMap::new(),
            before: self.before,
            after: self.after,
            middleware: self.middleware,
            max_body_bytes: self.max_body_bytes.unwrap_or(limits::MAX_BODY_SIZE_BYTES),
        }
    }
}
