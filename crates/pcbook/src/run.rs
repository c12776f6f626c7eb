// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level server and client runners, shared by `main` and tests.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::auth::{user, AuthService, Authorizer, RolePolicy, SeedUser, TokenManager, UserStore};
use crate::client::PcbookClient;
use crate::config::{ClientArgs, ClientCommand, Config, ServeArgs};
use crate::model::Laptop;
use crate::store::{ArtifactSink, DiskSink, ImageStore, LaptopStore, MemorySink, RatingStore};
use crate::transport::AppState;

/// Initialize tracing/logging from config.
///
/// Uses `try_init` so it's safe to call multiple times (e.g. from tests).
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;

    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.log_format.as_str() {
        "json" => fmt::fmt().with_env_filter(filter).json().try_init(),
        _ => fmt::fmt().with_env_filter(filter).try_init(),
    };
    drop(result);
}

/// Read a JSON users file, or fall back to the built-in accounts.
pub fn load_seed_users(path: Option<&Path>) -> anyhow::Result<Vec<SeedUser>> {
    let Some(path) = path else {
        return Ok(user::default_seed_users());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read users file {}: {e}", path.display()))?;
    let seeds: Vec<SeedUser> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("invalid users file {}: {e}", path.display()))?;
    if seeds.is_empty() {
        anyhow::bail!("users file {} lists no users", path.display());
    }
    Ok(seeds)
}

fn read_pem(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("cannot read key {}: {e}", path.display()))
}

/// Build the shared server state: keys, seeded users, stores and the
/// standard role policy.
pub fn build_state(args: &ServeArgs) -> anyhow::Result<Arc<AppState>> {
    let private_key = read_pem(&args.private_key)?;
    let public_key = read_pem(&args.public_key)?;
    let tokens = Arc::new(TokenManager::new(&private_key, &public_key, args.token_duration())?);

    let users = Arc::new(UserStore::new());
    let seeds = load_seed_users(args.users_file.as_deref())?;
    user::seed_users(&users, &seeds, args.bcrypt_cost)?;
    info!(count = seeds.len(), "users seeded");

    let sink: Arc<dyn ArtifactSink> = match args.image_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)?;
            info!("storing images in {}", dir.display());
            Arc::new(DiskSink::new(dir.clone()))
        }
        None => Arc::new(MemorySink::new()),
    };

    Ok(Arc::new(AppState {
        laptops: Arc::new(LaptopStore::new()),
        images: Arc::new(ImageStore::new(sink)),
        ratings: Arc::new(RatingStore::new()),
        auth: AuthService::new(users, Arc::clone(&tokens), args.bcrypt_cost)?,
        authorizer: Authorizer::new(tokens, RolePolicy::standard()),
        max_image_size: args.max_image_size,
    }))
}

/// Serve the catalog until `shutdown` fires.
pub async fn serve(args: ServeArgs, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = args.addr()?;
    let state = build_state(&args)?;

    info!("gRPC listening on {addr}");
    crate::transport::grpc::into_router(state)
        .serve_with_shutdown(addr, shutdown.cancelled_owned())
        .await?;
    info!("server stopped");
    Ok(())
}

/// Run one client subcommand against a server.
pub async fn run_client(args: ClientArgs, shutdown: CancellationToken) -> anyhow::Result<()> {
    let client = PcbookClient::connect(args.connect_options(), shutdown).await?;
    let result = run_command(&client, &args.command).await;
    client.close().await;
    result
}

async fn run_command(client: &PcbookClient, command: &ClientCommand) -> anyhow::Result<()> {
    match command {
        ClientCommand::Create { file } => {
            let raw = std::fs::read_to_string(file)
                .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?;
            let laptop: Laptop = serde_json::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid laptop in {}: {e}", file.display()))?;
            match client.create_laptop(&laptop).await {
                Ok(id) => info!(%id, "created laptop"),
                Err(status) if status.code() == tonic::Code::AlreadyExists => {
                    info!(id = %laptop.id, "laptop already exists");
                }
                Err(status) => return Err(status.into()),
            }
        }
        ClientCommand::Search { .. } => {
            let filter = command.filter();
            let found = client.search_laptops(&filter).await?;
            for laptop in &found {
                println!("{}", serde_json::to_string(laptop)?);
            }
            info!(count = found.len(), "search finished");
        }
        ClientCommand::Upload { laptop_id, file } => {
            let uploaded = client.upload_image(laptop_id, file).await?;
            println!("{} {}", uploaded.id, uploaded.size);
        }
        ClientCommand::Rate { scores } => {
            let scores: Vec<_> = scores.iter().map(|s| (s.laptop_id.clone(), s.score)).collect();
            for summary in client.rate_laptops(&scores).await? {
                println!(
                    "{} rated {} times, average {:.2}",
                    summary.laptop_id, summary.rated_count, summary.average_score
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
