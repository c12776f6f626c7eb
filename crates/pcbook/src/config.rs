// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::client::{ConnectOptions, RefreshPolicy};
use crate::model::{Filter, Memory, MemoryUnit};
use crate::transport::DEFAULT_MAX_IMAGE_SIZE;

/// Laptop catalog service and client.
#[derive(Debug, Parser)]
#[command(name = "pcbook", version, about)]
pub struct Config {
    /// Log level filter (e.g. info, pcbook=debug).
    #[arg(long, env = "PCBOOK_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (json or text).
    #[arg(long, env = "PCBOOK_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the catalog server.
    Serve(ServeArgs),
    /// Call a running server.
    Client(ClientArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Host address to bind to.
    #[arg(long, env = "PCBOOK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// gRPC port to listen on.
    #[arg(long, env = "PCBOOK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// PEM file holding the RSA signing key.
    #[arg(long, env = "PCBOOK_PRIVATE_KEY")]
    pub private_key: PathBuf,

    /// PEM file holding the RSA verification key.
    #[arg(long, env = "PCBOOK_PUBLIC_KEY")]
    pub public_key: PathBuf,

    /// Access token lifetime in seconds.
    #[arg(long, env = "PCBOOK_TOKEN_DURATION_SECS", default_value_t = 900)]
    pub token_duration_secs: u64,

    /// Folder for uploaded images. Images stay in memory when unset.
    #[arg(long, env = "PCBOOK_IMAGE_DIR")]
    pub image_dir: Option<PathBuf>,

    /// Largest accepted image, in bytes.
    #[arg(long, env = "PCBOOK_MAX_IMAGE_SIZE", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_image_size: usize,

    /// JSON list of `{username, password, role}` to seed. Defaults to
    /// `admin1` and `user1`.
    #[arg(long, env = "PCBOOK_USERS_FILE")]
    pub users_file: Option<PathBuf>,

    /// bcrypt cost used when seeding users.
    #[arg(long, env = "PCBOOK_BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,
}

impl ServeArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.token_duration_secs == 0 {
            anyhow::bail!("--token-duration-secs must be positive");
        }
        if self.max_image_size == 0 {
            anyhow::bail!("--max-image-size must be positive");
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            anyhow::bail!("--bcrypt-cost must be between 4 and 31");
        }
        self.addr()?;
        Ok(())
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|e| anyhow::anyhow!("invalid listen address {addr}: {e}"))
    }

    pub fn token_duration(&self) -> Duration {
        Duration::from_secs(self.token_duration_secs)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ClientArgs {
    /// Server URL.
    #[arg(long, env = "PCBOOK_SERVER", default_value = "http://127.0.0.1:8080")]
    pub server: String,

    #[arg(long, env = "PCBOOK_USERNAME", default_value = "admin1")]
    pub username: String,

    #[arg(long, env = "PCBOOK_PASSWORD", default_value = "secret", hide_env_values = true)]
    pub password: String,

    /// Seconds between token refreshes.
    #[arg(long, env = "PCBOOK_REFRESH_INTERVAL_SECS", default_value_t = 30)]
    pub refresh_interval_secs: u64,

    /// Extra login attempts per refresh round.
    #[arg(long, env = "PCBOOK_REFRESH_RETRIES", default_value_t = 3)]
    pub refresh_retries: u32,

    /// Per-call deadline in seconds.
    #[arg(long, env = "PCBOOK_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: ClientCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ClientCommand {
    /// Create a laptop from a JSON file.
    Create { file: PathBuf },
    /// Stream laptops matching the given bounds.
    Search {
        #[arg(long)]
        max_price: Option<f64>,
        #[arg(long)]
        min_cores: Option<u32>,
        #[arg(long)]
        min_ghz: Option<f64>,
        #[arg(long)]
        min_ram_gb: Option<u64>,
    },
    /// Upload an image file for a laptop.
    Upload { laptop_id: String, file: PathBuf },
    /// Rate laptops, given as `<laptop-id>=<score>`.
    Rate {
        #[arg(required = true, value_parser = parse_score)]
        scores: Vec<Score>,
    },
}

/// One `<laptop-id>=<score>` argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    pub laptop_id: String,
    pub score: f64,
}

fn parse_score(raw: &str) -> Result<Score, String> {
    let (laptop_id, score) =
        raw.split_once('=').ok_or_else(|| format!("expected <laptop-id>=<score>, got {raw:?}"))?;
    if laptop_id.is_empty() {
        return Err(format!("missing laptop id in {raw:?}"));
    }
    let score: f64 = score.parse().map_err(|e| format!("invalid score in {raw:?}: {e}"))?;
    if !score.is_finite() {
        return Err(format!("score must be finite in {raw:?}"));
    }
    Ok(Score { laptop_id: laptop_id.to_owned(), score })
}

impl ClientArgs {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("--refresh-interval-secs must be positive");
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("--timeout-secs must be positive");
        }
        if self.username.is_empty() {
            anyhow::bail!("--username must not be empty");
        }
        Ok(())
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            server: self.server.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            refresh: RefreshPolicy {
                interval: Duration::from_secs(self.refresh_interval_secs),
                max_retries: self.refresh_retries,
                ..RefreshPolicy::default()
            },
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl ClientCommand {
    /// Search bounds for `search`; the empty filter for anything else.
    pub fn filter(&self) -> Filter {
        match self {
            Self::Search { max_price, min_cores, min_ghz, min_ram_gb } => Filter {
                max_price_usd: *max_price,
                min_cpu_cores: *min_cores,
                min_cpu_ghz: *min_ghz,
                min_ram: min_ram_gb.map(|gb| Memory::new(gb, MemoryUnit::Gigabyte)),
            },
            _ => Filter::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.log_format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        match &self.command {
            Command::Serve(args) => args.validate(),
            Command::Client(args) => args.validate(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
