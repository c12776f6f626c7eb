// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use tempfile::TempDir;

use super::*;
use crate::auth::Role;
use crate::config::Score;
use crate::test_support::{
    sample_laptop, spawn_grpc_server, StateBuilder, OTHER_PUBLIC_KEY, TEST_BCRYPT_COST,
    TEST_PRIVATE_KEY, TEST_PUBLIC_KEY,
};

fn write(dir: &TempDir, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

fn serve_args(dir: &TempDir) -> anyhow::Result<ServeArgs> {
    Ok(ServeArgs {
        host: "127.0.0.1".to_owned(),
        port: 0,
        private_key: write(dir, "private.pem", TEST_PRIVATE_KEY)?,
        public_key: write(dir, "public.pem", TEST_PUBLIC_KEY)?,
        token_duration_secs: 60,
        image_dir: None,
        max_image_size: 1024,
        users_file: None,
        bcrypt_cost: TEST_BCRYPT_COST,
    })
}

fn client_args(addr: std::net::SocketAddr, command: ClientCommand) -> ClientArgs {
    ClientArgs {
        server: format!("http://{addr}"),
        username: "admin1".to_owned(),
        password: "secret".to_owned(),
        refresh_interval_secs: 30,
        refresh_retries: 0,
        timeout_secs: 5,
        command,
    }
}

#[tokio::test]
async fn build_state_seeds_default_users() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let state = build_state(&serve_args(&dir)?)?;

    let issued = state.auth.login("admin1", "secret").await?;
    let claims = state.auth.tokens().verify(&issued.token)?;
    assert_eq!(claims.role, Role::Admin);
    assert_eq!(state.max_image_size, 1024);
    Ok(())
}

#[tokio::test]
async fn build_state_reads_users_file() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut args = serve_args(&dir)?;
    let users = r#"[{"username": "carol", "password": "pw", "role": "user"}]"#;
    args.users_file = Some(write(&dir, "users.json", users)?);
    let state = build_state(&args)?;

    let issued = state.auth.login("carol", "pw").await?;
    assert_eq!(state.auth.tokens().verify(&issued.token)?.role, Role::User);
    assert!(state.auth.login("admin1", "secret").await.is_err());
    Ok(())
}

#[test]
fn build_state_creates_image_dir() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut args = serve_args(&dir)?;
    let images = dir.path().join("images");
    args.image_dir = Some(images.clone());

    build_state(&args)?;
    assert!(images.is_dir());
    Ok(())
}

#[yare::parameterized(
    missing_key  = { "missing" },
    bad_public   = { "bad_public" },
    empty_users  = { "empty_users" },
    broken_users = { "broken_users" },
)]
fn build_state_rejects(case: &str) -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let mut args = serve_args(&dir)?;
    match case {
        "missing" => args.private_key = dir.path().join("nope.pem"),
        "bad_public" => args.public_key = write(&dir, "other.pem", "not a key")?,
        "empty_users" => args.users_file = Some(write(&dir, "users.json", "[]")?),
        _ => args.users_file = Some(write(&dir, "users.json", "{")?),
    }
    assert!(build_state(&args).is_err());
    Ok(())
}

#[test]
fn foreign_public_key_still_loads() -> anyhow::Result<()> {
    // Keys are only checked for well-formedness at startup.
    let dir = TempDir::new()?;
    let mut args = serve_args(&dir)?;
    args.public_key = write(&dir, "other.pem", OTHER_PUBLIC_KEY)?;
    build_state(&args)?;
    Ok(())
}

#[test]
fn default_users_without_file() -> anyhow::Result<()> {
    let seeds = load_seed_users(None)?;
    let names: Vec<_> = seeds.iter().map(|s| s.username.as_str()).collect();
    assert_eq!(names, vec!["admin1", "user1"]);
    Ok(())
}

#[tokio::test]
async fn serve_stops_on_shutdown() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(serve_args(&dir)?, shutdown.clone()));

    shutdown.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(5), server).await???;
    Ok(())
}

#[tokio::test]
async fn client_create_tolerates_duplicate() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let (addr, _server) = spawn_grpc_server(Arc::clone(&state)).await?;
    let dir = TempDir::new()?;

    let mut laptop = sample_laptop();
    laptop.id = "7f3c6d5e-1a2b-4c3d-8e9f-0a1b2c3d4e5f".to_owned();
    let file = write(&dir, "laptop.json", &serde_json::to_string(&laptop)?)?;

    for _ in 0..2 {
        let create = ClientCommand::Create { file: file.clone() };
        run_client(client_args(addr, create), CancellationToken::new()).await?;
    }
    assert_eq!(state.laptops.len(), 1);
    Ok(())
}

#[tokio::test]
async fn client_rate_and_upload() -> anyhow::Result<()> {
    let state = StateBuilder::new().build()?;
    let (addr, _server) = spawn_grpc_server(Arc::clone(&state)).await?;
    let id = state.laptops.save(sample_laptop())?;
    let dir = TempDir::new()?;

    let rate = ClientCommand::Rate { scores: vec![Score { laptop_id: id.clone(), score: 4.0 }] };
    run_client(client_args(addr, rate), CancellationToken::new()).await?;
    assert_eq!(state.ratings.get(&id).map(|r| r.count), Some(1));

    let file = write(&dir, "photo.png", "not really a png")?;
    let upload = ClientCommand::Upload { laptop_id: id.clone(), file };
    run_client(client_args(addr, upload), CancellationToken::new()).await?;
    assert_eq!(state.images.images_for(&id).len(), 1);
    Ok(())
}

#[tokio::test]
async fn client_rejects_missing_laptop_file() -> anyhow::Result<()> {
    let (addr, _server) = spawn_grpc_server(StateBuilder::new().build()?).await?;
    let create = ClientCommand::Create { file: PathBuf::from("/nonexistent/laptop.json") };
    let result = run_client(client_args(addr, create), CancellationToken::new()).await;
    crate::assert_err_contains!(result, "cannot read");
    Ok(())
}
