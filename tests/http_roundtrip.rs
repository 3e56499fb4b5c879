//! End-to-end client/server tests over a real HTTP listener.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};

use wireline::client::{BeforeHook, Call, Client, Request};
use wireline::middleware::{endpoint, handler};
use wireline::server::{self, decode_as, AfterHook, MethodDef, Server};
use wireline::{ClientError, ProtocolError, RpcError, TransportError};

async fn spawn(server: Server) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::http::router(Arc::new(server)))
            .await
            .unwrap();
    });
    format!("http://{addr}/")
}

fn demo_server() -> Server {
    let mut rpc = Server::new();
    rpc.register(
        MethodDef::new(
            "add",
            handler(|_cx, (a, b): (i64, i64)| async move { Ok(a + b) }),
        )
        .decode(decode_as::<(i64, i64)>()),
    );
    rpc.register(MethodDef::new(
        "echo",
        endpoint(|_cx, params| async move { Ok(params) }),
    ));
    rpc.register(MethodDef::new(
        "teapot",
        endpoint(|_cx, _params| async move {
            Err(RpcError::new(-32050, "quota exceeded")
                .with_data(json!({"limit": 10}))
                .into())
        }),
    ));
    rpc
}

#[tokio::test]
async fn batch_mixes_success_and_method_not_found() {
    let url = spawn(demo_server()).await;
    let client = Client::builder(url).build();

    let add = Call::<i64>::new("add", json!([2, 3]));
    let bogus = Call::<Value>::new("bogus", json!(null));
    let batch = client.execute(&[&add, &bogus]).await.unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.get::<i64>(0), Some(&5));
    assert!(batch.error(0).is_none());
    assert_eq!(batch.error(1).map(RpcError::code), Some(-32601));
}

#[tokio::test]
async fn application_error_round_trips_code_message_data() {
    let url = spawn(demo_server()).await;
    let client = Client::builder(url).build();

    let call = Call::<Value>::new("teapot", json!(null));
    let batch = client.execute(&[&call]).await.unwrap();

    let error = batch.error(0).unwrap();
    assert_eq!(error.code(), -32050);
    assert_eq!(error.message(), "quota exceeded");
    assert_eq!(error.data(), Some(&json!({"limit": 10})));
}

#[tokio::test]
async fn single_request_body_gets_unwrapped_response() {
    let url = spawn(demo_server()).await;
    let response = reqwest::Client::new()
        .post(&url)
        .header(CONTENT_TYPE, "application/json")
        .body(r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":"hi"}"#)
        .send()
        .await
        .unwrap();
    let value: Value = response.json().await.unwrap();
    assert!(value.is_object());
    assert_eq!(value["result"], json!("hi"));
    assert_eq!(value["id"], json!(1));
}

#[tokio::test]
async fn one_element_array_body_gets_array_response() {
    let url = spawn(demo_server()).await;
    let response = reqwest::Client::new()
        .post(&url)
        .header(CONTENT_TYPE, "application/json")
        .body(r#"[{"jsonrpc":"2.0","id":1,"method":"echo","params":"hi"}]"#)
        .send()
        .await
        .unwrap();
    let value: Value = response.json().await.unwrap();
    assert!(value.is_array());
    assert_eq!(value[0]["result"], json!("hi"));
}

#[tokio::test]
async fn malformed_body_yields_parse_error_envelope() {
    let url = spawn(demo_server()).await;
    let response = reqwest::Client::new()
        .post(&url)
        .header(CONTENT_TYPE, "application/json")
        .body("this is not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let value: Value = response.json().await.unwrap();
    assert!(value.is_object());
    assert_eq!(value["id"], Value::Null);
    assert_eq!(value["error"]["code"], json!(-32700));
}

#[tokio::test]
async fn client_frames_single_request_as_batch() {
    let url = spawn(demo_server()).await;
    let client = Client::builder(url).build();

    let echo = Call::<String>::new("echo", json!("solo"));
    let raw = client.execute_raw(&[&echo]).await.unwrap();

    // One logical request still rides as a one-element array, so the
    // response body comes back array-framed.
    assert_eq!(raw.body.first(), Some(&b'['));
    assert_eq!(raw.correlation.len(), 1);
    assert_eq!(raw.correlation.get(&0), Some(&0));
    assert_eq!(raw.response.status, reqwest::StatusCode::OK);
}

#[tokio::test]
async fn client_hooks_flow_headers_to_server_context() {
    let capture: server::BeforeHook = Arc::new(|cx, req: &server::InboundRequest| {
        Ok(match req.header("x-tenant") {
            Some(tenant) => cx.with("tenant", tenant),
            None => cx,
        })
    });
    let mut rpc = Server::builder().before(capture).build();
    rpc.register(MethodDef::new(
        "whoami",
        endpoint(|cx, _params| async move { Ok(json!(cx.get_str("tenant").unwrap_or("unknown"))) }),
    ));
    let url = spawn(rpc).await;

    let tenant: BeforeHook = Arc::new(|cx, req: &mut reqwest::Request| {
        req.headers_mut()
            .insert("x-tenant", HeaderValue::from_static("acme"));
        cx
    });
    let client = Client::builder(url).before(tenant).build();
    let whoami = Call::<String>::new("whoami", json!(null));
    let batch = client.execute(&[&whoami]).await.unwrap();
    assert_eq!(batch.get::<String>(0), Some(&"acme".to_string()));
}

#[tokio::test]
async fn after_hook_headers_reach_the_http_response() {
    let stamp: AfterHook = Arc::new(|cx, headers| {
        headers.insert("x-served-by", HeaderValue::from_static("wireline"));
        cx
    });
    let mut rpc = Server::builder().after(stamp).build();
    rpc.register(MethodDef::new(
        "echo",
        endpoint(|_cx, params| async move { Ok(params) }),
    ));
    let url = spawn(rpc).await;

    let echo = Call::<Value>::new("echo", json!(1));
    let raw = Client::builder(url).build().execute_raw(&[&echo]).await.unwrap();
    assert_eq!(
        raw.response.headers.get("x-served-by").map(|v| v.as_bytes()),
        Some(&b"wireline"[..])
    );
}

#[tokio::test]
async fn non_success_status_aborts_the_call() {
    let app = Router::new().route("/", post(|| async { StatusCode::BAD_GATEWAY }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder(format!("http://{addr}/")).build();
    let call = Call::<Value>::new("anything", json!(null));
    let err = client.execute(&[&call]).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::Status(status))
            if status == reqwest::StatusCode::BAD_GATEWAY
    ));
}

#[tokio::test]
async fn unknown_correlation_id_fails_the_whole_call() {
    // A server that answers with an id the client never assigned.
    let app = Router::new().route(
        "/",
        post(|| async {
            (
                [(CONTENT_TYPE, "application/json")],
                r#"[{"jsonrpc":"2.0","id":99,"result":1}]"#,
            )
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder(format!("http://{addr}/")).build();
    let call = Call::<Value>::new("anything", json!(null));
    let err = client.execute(&[&call]).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Protocol(ProtocolError::UnknownId(99))
    ));
}

#[tokio::test]
async fn oversized_response_body_aborts_the_call() {
    let url = spawn(demo_server()).await;
    let client = Client::builder(url).max_body_bytes(8).build();
    let echo = Call::<Value>::new("echo", json!("a payload larger than eight bytes"));
    let err = client.execute(&[&echo]).await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Transport(TransportError::BodyTooLarge { limit: 8 })
    ));
}

#[tokio::test]
async fn empty_submission_is_rejected() {
    let client = Client::builder("http://127.0.0.1:1/").build();
    let requests: Vec<&dyn Request> = Vec::new();
    let err = client.execute(&requests).await.unwrap_err();
    assert!(matches!(err, ClientError::NoRequests));
}
