// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tonic::codegen::http;
use tower::ServiceExt;

use super::*;
use crate::auth::{Claims, Role, RolePolicy, User};
use crate::test_support::{test_token_manager, TEST_BCRYPT_COST};

/// Echoes the authorized username, or `-` when the call carried no claims.
async fn echo_claims(req: http::Request<()>) -> Result<http::Response<String>, Infallible> {
    let user = req.extensions().get::<Claims>().map(|c| c.sub.clone());
    Ok(http::Response::new(user.unwrap_or_else(|| "-".to_owned())))
}

fn request(method: Method, token: Option<&str>) -> anyhow::Result<http::Request<()>> {
    let mut builder = http::Request::builder().uri(method.path());
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    Ok(builder.body(())?)
}

fn grpc_status(resp: &http::Response<String>) -> Option<&str> {
    resp.headers().get("grpc-status").and_then(|v| v.to_str().ok())
}

struct Fixture {
    layer: AuthLayer,
    admin: String,
    user: String,
}

fn fixture() -> anyhow::Result<Fixture> {
    let tokens = Arc::new(test_token_manager(Duration::from_secs(60))?);
    let admin = tokens.issue(&User::new("admin1", "pw", Role::Admin, TEST_BCRYPT_COST)?)?.token;
    let user = tokens.issue(&User::new("user1", "pw", Role::User, TEST_BCRYPT_COST)?)?.token;
    let layer = AuthLayer::new(Authorizer::new(tokens, RolePolicy::standard()));
    Ok(Fixture { layer, admin, user })
}

#[tokio::test]
async fn login_passes_without_token() -> anyhow::Result<()> {
    let fx = fixture()?;
    let svc = fx.layer.layer(tower::service_fn(echo_claims));

    let resp = svc.oneshot(request(Method::Login, None)?).await?;
    assert_eq!(grpc_status(&resp), None);
    assert_eq!(resp.body(), "-");
    Ok(())
}

#[tokio::test]
async fn missing_token_is_rejected_before_handler() -> anyhow::Result<()> {
    let fx = fixture()?;
    let svc = fx.layer.layer(tower::service_fn(echo_claims));

    let resp = svc.oneshot(request(Method::SearchLaptop, None)?).await?;
    assert_eq!(grpc_status(&resp), Some("16"));
    assert!(resp.body().is_empty());
    Ok(())
}

#[tokio::test]
async fn user_cannot_create() -> anyhow::Result<()> {
    let fx = fixture()?;
    let svc = fx.layer.layer(tower::service_fn(echo_claims));

    let resp = svc.oneshot(request(Method::CreateLaptop, Some(&fx.user))?).await?;
    assert_eq!(grpc_status(&resp), Some("7"));
    Ok(())
}

#[tokio::test]
async fn claims_reach_the_handler() -> anyhow::Result<()> {
    let fx = fixture()?;

    let svc = fx.layer.layer(tower::service_fn(echo_claims));
    let resp = svc.oneshot(request(Method::CreateLaptop, Some(&fx.admin))?).await?;
    assert_eq!(grpc_status(&resp), None);
    assert_eq!(resp.body(), "admin1");

    let svc = fx.layer.layer(tower::service_fn(echo_claims));
    let resp = svc.oneshot(request(Method::RateLaptop, Some(&fx.user))?).await?;
    assert_eq!(resp.body(), "user1");
    Ok(())
}

#[tokio::test]
async fn unknown_path_is_denied() -> anyhow::Result<()> {
    let fx = fixture()?;
    let svc = fx.layer.layer(tower::service_fn(echo_claims));

    let req = http::Request::builder()
        .uri("/pcbook.v1.LaptopService/DeleteLaptop")
        .header("authorization", format!("Bearer {}", fx.admin))
        .body(())?;
    let resp = svc.oneshot(req).await?;
    assert_eq!(grpc_status(&resp), Some("7"));
    Ok(())
}
