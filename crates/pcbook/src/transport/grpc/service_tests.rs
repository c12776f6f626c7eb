// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

use super::convert::laptop_to_proto;
use super::proto::auth_service_server::AuthService as _;
use super::proto::laptop_service_server::LaptopService as _;
use super::*;
use crate::model::Laptop;
use crate::test_support::{sample_laptop, spawn_grpc_server, StateBuilder};

fn create_request(laptop: &Laptop) -> tonic::Request<proto::CreateLaptopRequest> {
    tonic::Request::new(proto::CreateLaptopRequest { laptop: Some(laptop_to_proto(laptop)) })
}

#[test]
fn router_builds() -> anyhow::Result<()> {
    let _router = into_router(StateBuilder::new().build()?);
    Ok(())
}

#[tokio::test]
async fn login_returns_token_for_seed_user() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = AuthGrpc::new(Arc::clone(&state));

    let req = proto::LoginRequest { username: "admin1".to_owned(), password: "secret".to_owned() };
    let resp = svc.login(tonic::Request::new(req)).await?.into_inner();

    let claims = state.auth.tokens().verify(&resp.access_token)?;
    assert_eq!(claims.sub, "admin1");
    assert_eq!(resp.expires_at, i64::try_from(claims.exp)?);
    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_not_found() -> anyhow::Result<()> {
    let svc = AuthGrpc::new(StateBuilder::new().build()?);

    let req = proto::LoginRequest { username: "admin1".to_owned(), password: "nope".to_owned() };
    let status = svc.login(tonic::Request::new(req)).await.err();

    assert_eq!(status.as_ref().map(|s| s.code()), Some(tonic::Code::NotFound));
    assert_eq!(status.as_ref().map(|s| s.message()), Some("incorrect username/password"));
    Ok(())
}

#[tokio::test]
async fn create_laptop_assigns_id() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = LaptopGrpc::new(Arc::clone(&state));

    let resp = svc.create_laptop(create_request(&sample_laptop())).await?.into_inner();
    assert!(Uuid::parse_str(&resp.id).is_ok());
    assert!(state.laptops.contains(&resp.id));
    Ok(())
}

#[tokio::test]
async fn create_laptop_keeps_supplied_id() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = LaptopGrpc::new(Arc::clone(&state));
    let laptop = Laptop { id: Uuid::new_v4().to_string(), ..sample_laptop() };

    let resp = svc.create_laptop(create_request(&laptop)).await?.into_inner();
    assert_eq!(resp.id, laptop.id);
    assert_eq!(state.laptops.find(&laptop.id)?, laptop);
    Ok(())
}

#[tokio::test]
async fn create_laptop_with_invalid_id_is_invalid_argument() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = LaptopGrpc::new(Arc::clone(&state));
    let laptop = Laptop { id: "invalid-uuid".to_owned(), ..sample_laptop() };

    let status = svc.create_laptop(create_request(&laptop)).await.err();
    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::InvalidArgument));
    assert!(state.laptops.is_empty());
    Ok(())
}

#[tokio::test]
async fn create_laptop_duplicate_id_already_exists() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = LaptopGrpc::new(Arc::clone(&state));
    let laptop = Laptop { id: Uuid::new_v4().to_string(), ..sample_laptop() };

    svc.create_laptop(create_request(&laptop)).await?;
    let status = svc.create_laptop(create_request(&laptop)).await.err();
    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::AlreadyExists));
    assert_eq!(state.laptops.len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_laptop_without_laptop_is_invalid_argument() -> anyhow::Result<()> {
    let svc = LaptopGrpc::new(StateBuilder::new().build()?);
    let req = tonic::Request::new(proto::CreateLaptopRequest { laptop: None });

    let status = svc.create_laptop(req).await.err();
    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::InvalidArgument));
    Ok(())
}

#[tokio::test]
async fn create_laptop_past_deadline_writes_nothing() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let svc = LaptopGrpc::new(Arc::clone(&state));

    let mut req = create_request(&sample_laptop());
    req.metadata_mut().insert("grpc-timeout", "0n".parse()?);
    let status = svc.create_laptop(req).await.err();

    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::DeadlineExceeded));
    assert!(state.laptops.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_streams_matching_laptops() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let cheap = state.laptops.save(Laptop { price_usd: 1500.0, ..sample_laptop() })?;
    state.laptops.save(Laptop { price_usd: 4000.0, ..sample_laptop() })?;
    let svc = LaptopGrpc::new(Arc::clone(&state));

    let filter = proto::Filter { max_price_usd: Some(2000.0), ..Default::default() };
    let req = tonic::Request::new(proto::SearchLaptopRequest { filter: Some(filter) });
    let mut stream = svc.search_laptop(req).await?.into_inner();

    let mut ids = Vec::new();
    while let Some(item) = stream.next().await {
        let laptop = item?.laptop.ok_or_else(|| anyhow::anyhow!("empty search result"))?;
        ids.push(laptop.id);
    }
    assert_eq!(ids, vec![cheap]);
    Ok(())
}

#[tokio::test]
async fn search_without_filter_streams_everything() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    for _ in 0..3 {
        state.laptops.save(sample_laptop())?;
    }
    let svc = LaptopGrpc::new(Arc::clone(&state));

    let req = tonic::Request::new(proto::SearchLaptopRequest { filter: None });
    let results: Vec<_> = svc.search_laptop(req).await?.into_inner().collect().await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.is_ok()));
    Ok(())
}

#[tokio::test]
async fn rate_stream_past_deadline_is_deadline_exceeded() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let laptop_id = state.laptops.save(sample_laptop())?;
    let token = state.auth.login("admin1", "secret").await?.token;
    let (addr, _server) = spawn_grpc_server(Arc::clone(&state)).await?;
    let mut client =
        proto::laptop_service_client::LaptopServiceClient::connect(format!("http://{addr}"))
            .await?;

    // The sender stays open so only the deadline can end the stream.
    let (tx, rx) = mpsc::channel(4);
    tx.send(proto::RateLaptopRequest { laptop_id: laptop_id.clone(), score: 4.0 }).await?;
    let mut req = tonic::Request::new(ReceiverStream::new(rx));
    req.metadata_mut().insert("authorization", format!("Bearer {token}").parse()?);
    req.metadata_mut().insert("grpc-timeout", "300m".parse()?);
    let mut replies = client.rate_laptop(req).await?.into_inner();

    let first = replies.next().await.ok_or_else(|| anyhow::anyhow!("no reply"))??;
    assert_eq!(first.rated_count, 1);
    let second = replies.next().await.and_then(|r| r.err());
    assert_eq!(second.map(|s| s.code()), Some(tonic::Code::DeadlineExceeded));
    assert_eq!(state.ratings.get(&laptop_id).map(|r| r.count), Some(1));
    drop(tx);
    Ok(())
}
