// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: fixed keys, state builders and fixtures.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::auth::{user, AuthService, Authorizer, RolePolicy, TokenManager, UserStore};
use crate::model::{Cpu, Gpu, Laptop, Memory, MemoryUnit, Storage, StorageDriver};
use crate::store::{ArtifactSink, ImageStore, LaptopStore, MemorySink, RatingStore};
use crate::transport::{AppState, DEFAULT_MAX_IMAGE_SIZE};

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

pub const TEST_PRIVATE_KEY: &str = include_str!("../testdata/private_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("../testdata/public_key.pem");
/// A second, unrelated key pair.
pub const OTHER_PRIVATE_KEY: &str = include_str!("../testdata/other_private_key.pem");
pub const OTHER_PUBLIC_KEY: &str = include_str!("../testdata/other_public_key.pem");

pub fn test_token_manager(duration: Duration) -> anyhow::Result<TokenManager> {
    Ok(TokenManager::new(TEST_PRIVATE_KEY, TEST_PUBLIC_KEY, duration)?)
}

/// A fully populated laptop with an empty id.
///
/// Price 2500 USD, 8 cores at 2.5 GHz minimum, 16 GB of RAM.
pub fn sample_laptop() -> Laptop {
    Laptop {
        id: String::new(),
        brand: "Lenovo".to_owned(),
        name: "Thinkpad X1".to_owned(),
        cpu: Cpu {
            brand: "Intel".to_owned(),
            name: "Core i7-9750H".to_owned(),
            number_cores: 8,
            number_threads: 16,
            min_ghz: 2.5,
            max_ghz: 4.5,
        },
        ram: Memory::new(16, MemoryUnit::Gigabyte),
        gpus: vec![Gpu {
            brand: "Nvidia".to_owned(),
            name: "RTX 2070".to_owned(),
            min_ghz: 1.0,
            max_ghz: 1.8,
            memory: Memory::new(4, MemoryUnit::Gigabyte),
        }],
        storages: vec![
            Storage { driver: StorageDriver::Ssd, memory: Memory::new(512, MemoryUnit::Gigabyte) },
            Storage { driver: StorageDriver::Hdd, memory: Memory::new(1, MemoryUnit::Terabyte) },
        ],
        weight_kg: 1.3,
        price_usd: 2500.0,
        release_year: 2019,
    }
}

/// Sink whose writes always fail.
#[derive(Debug, Default)]
pub struct FailingSink;

impl ArtifactSink for FailingSink {
    fn write<'a>(
        &'a self,
        name: &'a str,
        _data: Bytes,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            Err::<String, _>(anyhow::anyhow!("disk full while writing {name}"))
        })
    }
}

/// Builder for [`AppState`] with test defaults: fixed keys, the default seed
/// users (`admin1`/`user1`, password `secret`) and an in-memory sink.
pub struct StateBuilder {
    sink: Arc<dyn ArtifactSink>,
    token_duration: Duration,
    max_image_size: usize,
    policy: RolePolicy,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(MemorySink::new()),
            token_duration: Duration::from_secs(60),
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            policy: RolePolicy::standard(),
        }
    }

    pub fn sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn token_duration(mut self, duration: Duration) -> Self {
        self.token_duration = duration;
        self
    }

    pub fn max_image_size(mut self, size: usize) -> Self {
        self.max_image_size = size;
        self
    }

    pub fn policy(mut self, policy: RolePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> anyhow::Result<Arc<AppState>> {
        let users = Arc::new(UserStore::new());
        user::seed_users(&users, &user::default_seed_users(), TEST_BCRYPT_COST)?;
        let tokens = Arc::new(test_token_manager(self.token_duration)?);

        Ok(Arc::new(AppState {
            laptops: Arc::new(LaptopStore::new()),
            images: Arc::new(ImageStore::new(self.sink)),
            ratings: Arc::new(RatingStore::new()),
            auth: AuthService::new(users, Arc::clone(&tokens), TEST_BCRYPT_COST)?,
            authorizer: Authorizer::new(tokens, self.policy),
            max_image_size: self.max_image_size,
        }))
    }
}

/// Spawn the full gRPC router (auth layer included) on an ephemeral port.
pub async fn spawn_grpc_server(
    state: Arc<AppState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let incoming = tokio_stream::wrappers::TcpListenerStream::new(listener);
    let router = crate::transport::grpc::into_router(state);
    let handle = tokio::spawn(async move {
        let _ = router.serve_with_incoming(incoming).await;
    });
    Ok((addr, handle))
}

/// Assert that `$expr` is an `Err` whose message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}
