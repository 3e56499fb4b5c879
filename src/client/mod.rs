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

//! JSON-RPC 2.0 client engine.
//!
//! Batches one or more typed requests into a single HTTP POST, assigns
//! sequential correlation ids scoped to the call, and maps the returned
//! envelopes back to submission order regardless of wire ordering. Transport
//! and top-level decode failures abort the whole call; a per-element server
//! error occupies that element's slot while siblings succeed.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::constants::limits;
use crate::context::CallContext;
use crate::protocol::envelope::{RequestEnvelope, ResponseEnvelope};
use crate::protocol::error::{ClientError, ProtocolError, RpcError, TransportError};

/// Runs before the batch is sent. May mutate the outbound HTTP request
/// (headers, timeout) and rewrite the execution context.
pub type BeforeHook =
    Arc<dyn Fn(CallContext, &mut reqwest::Request) -> CallContext + Send + Sync>;

/// Runs after a successful element is correlated, before its result is
/// converted. Receives the transport response metadata and the raw result
/// value; may rewrite the execution context (a side-channel for metrics and
/// logging, not correlated to a return value).
pub type AfterHook =
    Arc<dyn Fn(CallContext, &ResponseInfo, &Value) -> CallContext + Send + Sync>;

/// Transport response metadata, captured before the body is consumed.
#[derive(Debug, Clone)]
pub struct ResponseInfo {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// A typed request: produces `(method, params)` and converts the raw result
/// value into an application-level result. Optional capabilities (hooks,
/// context) are explicit defaulted methods rather than runtime inspection.
pub trait Request: Send + Sync {
    fn method(&self) -> &str;

    fn params(&self) -> Value;

    fn decode_result(&self, result: &Value) -> Result<Box<dyn Any + Send>, anyhow::Error>;

    fn before_hooks(&self) -> &[BeforeHook] {
        &[]
    }

    fn after_hooks(&self) -> &[AfterHook] {
        &[]
    }

    fn context(&self) -> Option<&CallContext> {
        None
    }
}

/// Ready-made [`Request`] whose result deserializes into `R`.
pub struct Call<R> {
    method: String,
    params: Value,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    context: Option<CallContext>,
    _result: PhantomData<fn() -> R>,
}

impl<R> Call<R> {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
            before: Vec::new(),
            after: Vec::new(),
            context: None,
            _result: PhantomData,
        }
    }

    #[must_use]
    pub fn with_before(mut self, hook: BeforeHook) -> Self {
        self.before.push(hook);
        self
    }

    #[must_use]
    pub fn with_after(mut self, hook: AfterHook) -> Self {
        self.after.push(hook);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: CallContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl<R: DeserializeOwned + Send + 'static> Request for Call<R> {
    fn method(&self) -> &str {
        &self.method
    }

    fn params(&self) -> Value {
        self.params.clone()
    }

    fn decode_result(&self, result: &Value) -> Result<Box<dyn Any + Send>, anyhow::Error> {
        let typed: R = serde_json::from_value(result.clone())?;
        Ok(Box::new(typed))
    }

    fn before_hooks(&self) -> &[BeforeHook] {
        &self.before
    }

    fn after_hooks(&self) -> &[AfterHook] {
        &self.after
    }

    fn context(&self) -> Option<&CallContext> {
        self.context.as_ref()
    }
}

/// Correlation-id generator scoped to one call. Each `execute` owns its own
/// sequence, so concurrent calls on a shared client cannot collide.
struct IdSequence {
    next: u64,
}

impl IdSequence {
    fn new() -> Self {
        Self { next: 0 }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

enum CallOutcome {
    Success(Box<dyn Any + Send>),
    Failure(RpcError),
}

/// Index-addressable results of one submitted batch. Position `i` always
/// corresponds to the i-th submitted request.
pub struct BatchResult {
    outcomes: Vec<CallOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// The converted result at `index`, downcast to `T`. `None` if the slot
    /// holds an error or the type does not match.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        match self.outcomes.get(index)? {
            CallOutcome::Success(value) => value.downcast_ref::<T>(),
            CallOutcome::Failure(_) => None,
        }
    }

    /// The server-declared error at `index`, if that element failed.
    pub fn error(&self, index: usize) -> Option<&RpcError> {
        match self.outcomes.get(index)? {
            CallOutcome::Success(_) => None,
            CallOutcome::Failure(error) => Some(error),
        }
    }

    pub fn into_results(self) -> Vec<Result<Box<dyn Any + Send>, RpcError>> {
        self.outcomes
            .into_iter()
            .map(|outcome| match outcome {
                CallOutcome::Success(value) => Ok(value),
                CallOutcome::Failure(error) => Err(error),
            })
            .collect()
    }
}

impl fmt::Debug for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for outcome in &self.outcomes {
            match outcome {
                CallOutcome::Success(_) => list.entry(&"Success"),
                CallOutcome::Failure(error) => list.entry(&("Failure", error)),
            };
        }
        list.finish()
    }
}

/// Undecoded outcome of a call, for callers post-processing results
/// themselves.
pub struct RawBatch {
    pub body: Bytes,
    pub correlation: HashMap<u64, usize>,
    pub response: ResponseInfo,
}

pub struct Client {
    target: String,
    http: reqwest::Client,
    context: CallContext,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    max_body_bytes: u64,
}

impl Client {
    pub fn builder(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Submit the batch under the client's default context.
    pub async fn execute(&self, requests: &[&dyn Request]) -> Result<BatchResult, ClientError> {
        self.execute_with_context(self.context.clone(), requests).await
    }

    pub async fn execute_with_context(
        &self,
        context: CallContext,
        requests: &[&dyn Request],
    ) -> Result<BatchResult, ClientError> {
        let (body, correlation, response, context) = self.do_requests(context, requests).await?;
        let envelopes: Vec<ResponseEnvelope> =
            serde_json::from_slice(&body).map_err(ProtocolError::Decode)?;
        self.correlate(context, requests, envelopes, &correlation, &response)
    }

    /// Submit the batch and return the undecoded body, the correlation
    /// table, and the transport response metadata.
    pub async fn execute_raw(&self, requests: &[&dyn Request]) -> Result<RawBatch, ClientError> {
        self.execute_raw_with_context(self.context.clone(), requests).await
    }

    pub async fn execute_raw_with_context(
        &self,
        context: CallContext,
        requests: &[&dyn Request],
    ) -> Result<RawBatch, ClientError> {
        let (body, correlation, response, _) = self.do_requests(context, requests).await?;
        Ok(RawBatch {
            body,
            correlation,
            response,
        })
    }

    /// Frame, hook, and POST the batch. Returns the capped response body,
    /// the fresh correlation table, and the response metadata.
    async fn do_requests(
        &self,
        context: CallContext,
        requests: &[&dyn Request],
    ) -> Result<(Bytes, HashMap<u64, usize>, ResponseInfo, CallContext), ClientError> {
        if requests.is_empty() {
            return Err(ClientError::NoRequests);
        }

        let mut request = self
            .http
            .post(self.target.as_str())
            .build()
            .map_err(TransportError::BuildRequest)?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut context = context;
        for hook in &self.before {
            context = hook(context, &mut request);
        }

        let mut sequence = IdSequence::new();
        let mut correlation = HashMap::with_capacity(requests.len());
        let mut envelopes = Vec::with_capacity(requests.len());
        for (index, call) in requests.iter().enumerate() {
            if let Some(call_context) = call.context() {
                context = call_context.clone();
            }
            for hook in call.before_hooks() {
                context = hook(context, &mut request);
            }
            let id = sequence.next_id();
            correlation.insert(id, index);
            envelopes.push(RequestEnvelope::new(id, call.method(), Some(call.params())));
        }

        // Batch framing is structurally uniform: one request still goes out
        // as a one-element array.
        let body = serde_json::to_vec(&envelopes).map_err(TransportError::Encode)?;
        debug!(
            requests = envelopes.len(),
            bytes = body.len(),
            url = %self.target,
            "submitting batch"
        );
        *request.body_mut() = Some(body.into());

        let response = self.http.execute(request).await.map_err(TransportError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status).into());
        }
        let info = ResponseInfo {
            status,
            headers: response.headers().clone(),
        };
        let body = read_capped(response, self.max_body_bytes).await?;
        debug!(bytes = body.len(), "received batch response");
        Ok((body, correlation, info, context))
    }

    /// Map response envelopes back to submission order via the correlation
    /// table. Unknown, duplicate, non-integer, or missing ids fail the call.
    fn correlate(
        &self,
        context: CallContext,
        requests: &[&dyn Request],
        envelopes: Vec<ResponseEnvelope>,
        correlation: &HashMap<u64, usize>,
        response: &ResponseInfo,
    ) -> Result<BatchResult, ClientError> {
        let mut context = context;
        let mut slots: Vec<Option<CallOutcome>> = Vec::with_capacity(requests.len());
        slots.resize_with(requests.len(), || None);

        for envelope in envelopes {
            let id = envelope
                .id
                .as_u64()
                .ok_or_else(|| ProtocolError::InvalidId(envelope.id.clone()))?;
            let index = *correlation.get(&id).ok_or(ProtocolError::UnknownId(id))?;
            if slots[index].is_some() {
                return Err(ProtocolError::DuplicateId(id).into());
            }
            if let Some(error) = envelope.error {
                slots[index] = Some(CallOutcome::Failure(error.into()));
                continue;
            }
            let result = envelope.result.unwrap_or(Value::Null);
            for hook in &self.after {
                context = hook(context, response, &result);
            }
            let call = requests[index];
            for hook in call.after_hooks() {
                context = hook(context, response, &result);
            }
            let converted = call
                .decode_result(&result)
                .map_err(|source| ClientError::ResultConversion { index, source })?;
            slots[index] = Some(CallOutcome::Success(converted));
        }

        let mut outcomes = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(outcome) => outcomes.push(outcome),
                None => {
                    let id = correlation
                        .iter()
                        .find(|(_, &slot_index)| slot_index == index)
                        .map(|(&id, _)| id)
                        .unwrap_or(index as u64);
                    return Err(ProtocolError::MissingResponse { id, index }.into());
                }
            }
        }
        Ok(BatchResult { outcomes })
    }
}

/// Read the response body in chunks, failing once it exceeds `limit`.
async fn read_capped(mut response: reqwest::Response, limit: u64) -> Result<Bytes, TransportError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = response.chunk().await? {
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(TransportError::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

pub struct ClientBuilder {
    target: String,
    http: Option<reqwest::Client>,
    context: CallContext,
    before: Vec<BeforeHook>,
    after: Vec<AfterHook>,
    max_body_bytes: u64,
}

impl ClientBuilder {
    fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            http: None,
            context: CallContext::new(),
            before: Vec::new(),
            after: Vec::new(),
            max_body_bytes: limits::MAX_BODY_SIZE_BYTES,
        }
    }

    /// Supply a transport handle; defaults to a fresh standard client.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Default execution context applied to every call.
    #[must_use]
    pub fn context(mut self, context: CallContext) -> Self {
        self.context = context;
        self
    }

    /// Append a before-hook run once per call, ahead of per-request hooks.
    #[must_use]
    pub fn before(mut self, hook: BeforeHook) -> Self {
        self.before.push(hook);
        self
    }

    /// Append an after-hook run for every successful element.
    #[must_use]
    pub fn after(mut self, hook: AfterHook) -> Self {
        self.after.push(hook);
        self
    }

    #[must_use]
    pub fn max_body_bytes(mut self, limit: u64) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn build(self) -> Client {
        Client {
            target: self.target,
            http: self.http.unwrap_or_default(),
            context: self.context,
            before: self.before,
            after: self.after,
            max_body_bytes: self.max_body_bytes,
        }
    }
}
