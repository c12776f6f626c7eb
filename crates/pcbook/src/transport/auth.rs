// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tower layer that authorizes every inbound gRPC call.
//!
//! The layer sees the raw HTTP/2 request, so it knows the method path that a
//! tonic interceptor would not. It runs once per call, before the handler
//! reads the first message; streams are authorized at establishment only.

use std::task::{Context, Poll};

use futures_util::future::BoxFuture;
use tonic::codegen::http;
use tower::{Layer, Service};

use crate::auth::{Authorizer, Method};

/// Installs [`AuthMiddleware`] around the tonic routes.
#[derive(Debug, Clone)]
pub struct AuthLayer {
    authorizer: Authorizer,
}

impl AuthLayer {
    pub fn new(authorizer: Authorizer) -> Self {
        Self { authorizer }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware { inner, authorizer: self.authorizer.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    authorizer: Authorizer,
}

impl<S, ReqBody, ResBody> Service<http::Request<ReqBody>> for AuthMiddleware<S>
where
    S: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    S::Future: Send + 'static,
    ResBody: Default + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        let path = req.uri().path().to_owned();
        let header = req.headers().get(http::header::AUTHORIZATION).and_then(|v| v.to_str().ok());

        match self.authorizer.authorize(Method::from_path(&path), header) {
            Ok(claims) => {
                if let Some(claims) = claims {
                    tracing::debug!(
                        %path,
                        user = %claims.sub,
                        role = %claims.role,
                        "call authorized"
                    );
                    req.extensions_mut().insert(claims);
                }
                Box::pin(self.inner.call(req))
            }
            Err(err) => {
                tracing::warn!(%path, code = %err.code(), err = %err, "call rejected");
                let response = err.to_status().into_http::<ResBody>();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
