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

//! wireline-echod: demo JSON-RPC 2.0 server.
//!
//! Exposes `echo` and `add` behind the full pipeline: a request-id
//! before-hook, a logging middleware, and env/flag-driven configuration.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wireline::config::Config;
use wireline::constants;
use wireline::context::CallContext;
use wireline::middleware::{endpoint, handler, Endpoint, Middleware};
use wireline::server::{self, decode_as, MethodDef, Server};

#[derive(Parser, Debug)]
#[command(
    name = "wireline-echod",
    about = "Demo JSON-RPC 2.0 server exposing echo and add"
)]
struct Args {
    /// Address to bind; overrides WIRELINE_BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level filter; overrides WIRELINE_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Log format, "text" or "json"; overrides WIRELINE_LOG_FORMAT
    #[arg(long)]
    log_format: Option<String>,
}

fn request_id_hook() -> server::BeforeHook {
    Arc::new(|cx: CallContext, req: &server::InboundRequest| {
        let request_id = req
            .header("x-request-id")
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Ok(cx.with("request_id", request_id))
    })
}

fn logging_middleware() -> Middleware {
    Arc::new(|next: Endpoint| -> Endpoint {
        Arc::new(move |cx, params| {
            let next = next.clone();
            Box::pin(async move {
                let method = cx
                    .get_str(constants::context::METHOD)
                    .unwrap_or("?")
                    .to_string();
                let request_id = cx.get_str("request_id").unwrap_or("-").to_string();
                let started = Instant::now();
                let result = next(cx, params).await;
                info!(
                    method = %method,
                    request_id = %request_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "handled call"
                );
                result
            })
        })
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    let log_format = args.log_format.unwrap_or_else(|| config.log_format.clone());
    let filter = EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    if log_format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut rpc = Server::builder()
        .before(request_id_hook())
        .middleware(logging_middleware())
        .max_body_bytes(config.max_body_bytes)
        .build();
    rpc.register(MethodDef::new(
        "echo",
        endpoint(|_cx, params| async move { Ok(params) }),
    ));
    rpc.register(
        MethodDef::new(
            "add",
            handler(|_cx, (a, b): (i64, i64)| async move { Ok(a + b) }),
        )
        .decode(decode_as::<(i64, i64)>()),
    );

    let addr: SocketAddr = match args.bind {
        Some(addr) => addr,
        None => config.bind_addr.parse()?,
    };
    server::http::serve(Arc::new(rpc), addr).await
}
