// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use tokio::time::Instant;

use super::*;
use crate::store::MemorySink;
use crate::test_support::{sample_laptop, spawn_grpc_server, StateBuilder};

fn options(addr: std::net::SocketAddr, username: &str) -> ConnectOptions {
    ConnectOptions {
        server: format!("http://{addr}"),
        username: username.to_owned(),
        password: "secret".to_owned(),
        refresh: RefreshPolicy::default(),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn create_then_search() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let client = PcbookClient::connect(options(addr, "admin1"), CancellationToken::new()).await?;

    let id = client.create_laptop(&sample_laptop()).await?;
    let filter = Filter {
        max_price_usd: Some(3000.0),
        min_cpu_cores: Some(4),
        min_cpu_ghz: Some(2.0),
        min_ram: None,
    };
    let found = client.search_laptops(&filter).await?;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].brand, "Lenovo");
    client.close().await;
    Ok(())
}

#[tokio::test]
async fn duplicate_create_reports_already_exists() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let client = PcbookClient::connect(options(addr, "admin1"), CancellationToken::new()).await?;

    let mut laptop = sample_laptop();
    laptop.id = client.create_laptop(&laptop).await?;
    let status = client.create_laptop(&laptop).await.err();

    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::AlreadyExists));
    Ok(())
}

#[tokio::test]
async fn upload_sends_file_in_chunks() -> anyhow::Result<()> {
    let sink = Arc::new(MemorySink::new());
    let state = StateBuilder::new().sink(sink.clone()).build()?;
    let (addr, _server) = spawn_grpc_server(Arc::clone(&state)).await?;
    let client = PcbookClient::connect(options(addr, "admin1"), CancellationToken::new()).await?;
    let laptop_id = client.create_laptop(&sample_laptop()).await?;

    let payload: Vec<u8> = (0..(CHUNK_SIZE * 3 + 100)).map(|i| (i % 251) as u8).collect();
    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile()?;
    file.write_all(&payload)?;
    file.flush()?;

    let uploaded = client.upload_image(&laptop_id, file.path()).await?;
    assert_eq!(uploaded.size, payload.len() as u64);

    let info = state.images.find(&uploaded.id).ok_or_else(|| anyhow::anyhow!("image missing"))?;
    assert_eq!(info.laptop_id, laptop_id);
    assert_eq!(info.image_type, "jpg");
    assert_eq!(sink.get(&info.path).as_deref(), Some(payload.as_slice()));
    Ok(())
}

#[tokio::test]
async fn upload_needs_file_extension() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let client = PcbookClient::connect(options(addr, "admin1"), CancellationToken::new()).await?;

    // Temp files are named `.tmpXXXXXX`, which has no extension.
    let file = tempfile::NamedTempFile::new()?;
    let result = client.upload_image("any", file.path()).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn rate_many_on_one_stream() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let client = PcbookClient::connect(options(addr, "user1"), CancellationToken::new()).await?;
    let admin = PcbookClient::connect(options(addr, "admin1"), CancellationToken::new()).await?;

    let a = admin.create_laptop(&sample_laptop()).await?;
    let b = admin.create_laptop(&sample_laptop()).await?;
    let scores = vec![(a.clone(), 5.0), (b.clone(), 2.0), (a.clone(), 3.0)];
    let replies = client.rate_laptops(&scores).await?;

    let summary: Vec<_> =
        replies.iter().map(|r| (r.laptop_id.as_str(), r.rated_count, r.average_score)).collect();
    assert_eq!(summary, vec![(a.as_str(), 1, 5.0), (b.as_str(), 1, 2.0), (a.as_str(), 2, 4.0)]);
    Ok(())
}

#[tokio::test]
async fn user_cannot_create() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let client = PcbookClient::connect(options(addr, "user1"), CancellationToken::new()).await?;

    let status = client.create_laptop(&sample_laptop()).await.err();
    assert_eq!(status.map(|s| s.code()), Some(tonic::Code::PermissionDenied));
    Ok(())
}

#[tokio::test]
async fn connect_fails_with_bad_password() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let mut opts = options(addr, "admin1");
    opts.password = "wrong".to_owned();
    opts.refresh.max_retries = 0;

    let result = PcbookClient::connect(opts, CancellationToken::new()).await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn connect_records_expiry_and_fits_interval() -> anyhow::Result<()> {
    let state = StateBuilder::new().token_duration(Duration::from_secs(20)).build()?;
    let (addr, _server) = spawn_grpc_server(state).await?;
    let client = PcbookClient::connect(options(addr, "user1"), CancellationToken::new()).await?;

    let remaining = client.token().expires_at().saturating_duration_since(Instant::now());
    assert!(!client.token().is_expired());
    assert!(remaining <= Duration::from_secs(20));
    assert!(remaining >= Duration::from_secs(15));
    // The 30s default would outlive the token.
    assert!(client.refresh_interval() < Duration::from_secs(20));
    client.close().await;
    Ok(())
}
