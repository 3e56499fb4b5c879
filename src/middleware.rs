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

//! Endpoint middleware composition.
//!
//! An [`Endpoint`] is the business-logic function invoked after params
//! decoding; a [`Middleware`] decorates one endpoint into another. [`chain`]
//! composes an ordered list into a single decorator with the first element
//! outermost. Composition is pure; the composed chain is applied once at
//! method registration.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use crate::context::CallContext;
use crate::protocol::error::HandlerError;

pub type Endpoint =
    Arc<dyn Fn(CallContext, Value) -> BoxFuture<'static, Result<Value, HandlerError>> + Send + Sync>;

pub type Middleware = Arc<dyn Fn(Endpoint) -> Endpoint + Send + Sync>;

/// Compose an ordered list of middleware into one decorator.
///
/// The first element observes a call first on the way in and last on the way
/// out. An empty list yields the identity decorator.
pub fn chain(middlewares: Vec<Middleware>) -> Middleware {
    Arc::new(move |endpoint: Endpoint| {
        middlewares
            .iter()
            .rev()
            .fold(endpoint, |next, middleware| middleware(next))
    })
}

/// Box an async closure as an [`Endpoint`].
pub fn endpoint<F, Fut>(f: F) -> Endpoint
where
    F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(move |cx, request| Box::pin(f(cx, request)))
}

/// Adapt a typed async handler into an [`Endpoint`].
///
/// Params are deserialized into `P` and the output serialized from `R`; a
/// serde failure on either side is a [`HandlerError`] for that element.
pub fn handler<P, R, F, Fut>(f: F) -> Endpoint
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(CallContext, P) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    Arc::new(move |cx, request| {
        let f = f.clone();
        Box::pin(async move {
            let params: P = serde_json::from_value(request)?;
            let response = f(cx, params).await?;
            Ok(serde_json::to_value(response)?)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn tracing_middleware(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Middleware {
        Arc::new(move |next: Endpoint| -> Endpoint {
            let log = log.clone();
            Arc::new(move |cx, request| {
                let log = log.clone();
                let next = next.clone();
                Box::pin(async move {
                    log.lock().unwrap().push(format!("enter {label}"));
                    let result = next(cx, request).await;
                    log.lock().unwrap().push(format!("exit {label}"));
                    result
                })
            })
        })
    }

    fn recording_endpoint(log: Arc<Mutex<Vec<String>>>) -> Endpoint {
        endpoint(move |_cx, request| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push("endpoint".to_string());
                Ok(request)
            }
        })
    }

    #[tokio::test]
    async fn first_middleware_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composed = chain(vec![
            tracing_middleware("a", log.clone()),
            tracing_middleware("b", log.clone()),
            tracing_middleware("c", log.clone()),
        ]);
        let wrapped = composed(recording_endpoint(log.clone()));

        let out = wrapped(CallContext::new(), json!(42)).await.unwrap();
        assert_eq!(out, json!(42));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["enter a", "enter b", "enter c", "endpoint", "exit c", "exit b", "exit a"]
        );
    }

    #[tokio::test]
    async fn empty_chain_is_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let wrapped = chain(Vec::new())(recording_endpoint(log.clone()));
        let out = wrapped(CallContext::new(), json!("x")).await.unwrap();
        assert_eq!(out, json!("x"));
        assert_eq!(*log.lock().unwrap(), vec!["endpoint"]);
    }

    #[tokio::test]
    async fn typed_handler_decodes_and_encodes() {
        let add = handler(|_cx, (a, b): (i64, i64)| async move { Ok(a + b) });
        let out = add(CallContext::new(), json!([2, 3])).await.unwrap();
        assert_eq!(out, json!(5));
    }

    #[tokio::test]
    async fn typed_handler_rejects_bad_params() {
        let add = handler(|_cx, (a, b): (i64, i64)| async move { Ok(a + b) });
        let err = add(CallContext::new(), json!("nope")).await.unwrap_err();
        assert!(matches!(err, HandlerError::Other(_)));
    }
}
