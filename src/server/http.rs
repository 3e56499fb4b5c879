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

//! HTTP entry point.
//!
//! A single POST route feeding [`Server::dispatch`]. Protocol-shaped replies
//! (including parse errors) go back with status 200 and a JSON body; headers
//! injected by after-hooks are merged into the response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use tracing::{error, info};

use crate::context::CallContext;
use crate::server::{parse_error_reply, InboundRequest, Server};

pub fn router(server: Arc<Server>) -> Router {
    Router::new().route("/", post(serve_rpc)).with_state(server)
}

/// Bind `addr` and serve the router until the task is cancelled.
pub async fn serve(server: Arc<Server>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "wireline server listening");
    axum::serve(listener, router(server)).await?;
    Ok(())
}

async fn serve_rpc(
    State(server): State<Arc<Server>>,
    request: axum::extract::Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let limit = usize::try_from(server.max_body_bytes()).unwrap_or(usize::MAX);

    let (reply, reply_headers) = match to_bytes(body, limit).await {
        Ok(bytes) => {
            let inbound = InboundRequest::new(parts.uri.to_string(), parts.headers);
            let mut reply_headers = HeaderMap::new();
            let reply = server
                .dispatch(CallContext::new(), &inbound, &bytes, &mut reply_headers)
                .await;
            (reply, reply_headers)
        }
        Err(e) => {
            error!(error = %e, "failed to read request body");
            (parse_error_reply(e.to_string()), HeaderMap::new())
        }
    };

    let payload = match serde_json::to_vec(&reply) {
        Ok(payload) => payload,
        Err(e) => {
            error!(error = %e, "failed to serialize reply");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            return response;
        }
    };

    let mut response = Response::new(Body::from(payload));
    *response.headers_mut() = reply_headers;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
