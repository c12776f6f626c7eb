// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gRPC transport implementing the `pcbook.v1` services.

pub mod convert;
mod service;

use std::pin::Pin;
use std::sync::Arc;

use tonic::transport::server::Router;
use tonic::Status;
use tower::layer::util::{Identity, Stack};

use crate::transport::auth::AuthLayer;
use crate::transport::AppState;

/// Generated protobuf types for the `pcbook.v1` package.
pub mod proto {
    tonic::include_proto!("pcbook.v1");
}

pub type GrpcStream<T> =
    Pin<Box<dyn tokio_stream::Stream<Item = Result<T, Status>> + Send + 'static>>;

/// Router with the authorization layer installed.
pub type GrpcRouter = Router<Stack<AuthLayer, Identity>>;

/// gRPC implementation of `pcbook.v1.AuthService`.
pub struct AuthGrpc {
    state: Arc<AppState>,
}

impl AuthGrpc {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// gRPC implementation of `pcbook.v1.LaptopService`.
pub struct LaptopGrpc {
    state: Arc<AppState>,
}

impl LaptopGrpc {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// Build a [`tonic`] router serving both services behind the
/// [`AuthLayer`].
pub fn into_router(state: Arc<AppState>) -> GrpcRouter {
    let layer = AuthLayer::new(state.authorizer.clone());
    let mut server = tonic::transport::Server::builder().layer(layer);
    server
        .add_service(proto::auth_service_server::AuthServiceServer::new(AuthGrpc::new(
            Arc::clone(&state),
        )))
        .add_service(proto::laptop_service_server::LaptopServiceServer::new(LaptopGrpc::new(
            state,
        )))
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
