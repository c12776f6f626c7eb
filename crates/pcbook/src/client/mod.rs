// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed catalog client.
//!
//! [`PcbookClient::connect`] logs in, keeps the token fresh in the background
//! and attaches it to every catalog call.

pub mod refresh;
pub mod token;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::service::interceptor::InterceptedService;
use tonic::transport::Channel;
use tonic::{Request, Status};

pub use refresh::{login_with_retries, refresh_interval, RefreshPolicy, TokenRefresher};
pub use token::{AccessToken, Authenticate, GrpcAuthenticator, TokenCache, TokenInterceptor};

use crate::model::{Filter, Laptop};
use crate::transport::grpc::convert::{filter_to_proto, laptop_from_proto, laptop_to_proto};
use crate::transport::grpc::proto;
use crate::transport::grpc::proto::laptop_service_client::LaptopServiceClient;
use crate::transport::grpc::proto::upload_image_request::Data;

/// Bytes per upload message.
pub const CHUNK_SIZE: usize = 1024;

type LaptopClient = LaptopServiceClient<InterceptedService<Channel, TokenInterceptor>>;

/// Connection settings for [`PcbookClient`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub server: String,
    pub username: String,
    pub password: String,
    pub refresh: RefreshPolicy,
    /// Deadline applied to every catalog call.
    pub timeout: Duration,
}

/// Result of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub id: String,
    pub size: u64,
}

/// One reply on the rating stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingSummary {
    pub laptop_id: String,
    pub rated_count: u32,
    pub average_score: f64,
}

pub struct PcbookClient {
    laptops: LaptopClient,
    refresher: TokenRefresher,
    timeout: Duration,
}

impl PcbookClient {
    pub async fn connect(
        opts: ConnectOptions,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let channel = Channel::from_shared(opts.server.clone())
            .map_err(|e| anyhow::anyhow!("invalid server address {}: {e}", opts.server))?
            .connect()
            .await
            .map_err(|e| anyhow::anyhow!("cannot connect to {}: {e}", opts.server))?;
        Self::with_channel(channel, opts, shutdown).await
    }

    /// Log in over `channel` and start refreshing the token.
    pub async fn with_channel(
        channel: Channel,
        opts: ConnectOptions,
        shutdown: CancellationToken,
    ) -> anyhow::Result<Self> {
        let auth = Arc::new(GrpcAuthenticator::new(channel.clone(), opts.username, opts.password));
        let refresher = TokenRefresher::start(auth, opts.refresh, shutdown).await?;
        let laptops = LaptopServiceClient::with_interceptor(channel, refresher.interceptor());
        Ok(Self { laptops, refresher, timeout: opts.timeout })
    }

    pub fn token(&self) -> &TokenCache {
        self.refresher.cache()
    }

    /// Period the background refresh runs at after fitting it to the token
    /// lifetime.
    pub fn refresh_interval(&self) -> Duration {
        self.refresher.interval()
    }

    fn request<T>(&self, message: T) -> Request<T> {
        let mut req = Request::new(message);
        req.set_timeout(self.timeout);
        req
    }

    /// Create a laptop and return its id. The raw status is returned so
    /// callers can tell `AlreadyExists` apart.
    pub async fn create_laptop(&self, laptop: &Laptop) -> Result<String, Status> {
        let mut client = self.laptops.clone();
        let laptop = Some(laptop_to_proto(laptop));
        let req = self.request(proto::CreateLaptopRequest { laptop });
        let resp = client.create_laptop(req).await?.into_inner();
        tracing::debug!(id = %resp.id, "laptop created");
        Ok(resp.id)
    }

    /// Collect every laptop the server streams back for `filter`.
    pub async fn search_laptops(&self, filter: &Filter) -> anyhow::Result<Vec<Laptop>> {
        let mut client = self.laptops.clone();
        let filter = Some(filter_to_proto(filter));
        let req = self.request(proto::SearchLaptopRequest { filter });
        let mut stream = client.search_laptop(req).await?.into_inner();

        let mut found = Vec::new();
        while let Some(resp) = stream.message().await? {
            if let Some(laptop) = resp.laptop {
                found.push(laptop_from_proto(laptop));
            }
        }
        Ok(found)
    }

    /// Upload the file at `path` as an image of `laptop_id`.
    ///
    /// The image type is the file extension. A spawned task reads the file
    /// in [`CHUNK_SIZE`] pieces and feeds the request stream.
    pub async fn upload_image(
        &self,
        laptop_id: &str,
        path: &Path,
    ) -> anyhow::Result<UploadedImage> {
        let image_type = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| anyhow::anyhow!("{} has no file extension", path.display()))?
            .to_owned();
        let mut file = tokio::fs::File::open(path).await?;

        let (tx, rx) = mpsc::channel(16);
        let info = proto::ImageInfo { laptop_id: laptop_id.to_owned(), image_type };
        tx.send(proto::UploadImageRequest { data: Some(Data::Info(info)) })
            .await
            .map_err(|_| anyhow::anyhow!("upload stream closed"))?;

        let reader = tokio::spawn(async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                let chunk =
                    proto::UploadImageRequest { data: Some(Data::ChunkData(buf[..n].to_vec())) };
                // The server ended the call; its status explains why.
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            anyhow::Ok(())
        });

        let mut client = self.laptops.clone();
        let result = client.upload_image(self.request(ReceiverStream::new(rx))).await;
        let read = reader.await?;
        let resp = result?.into_inner();
        read?;

        tracing::info!(id = %resp.id, size = resp.size, "image uploaded");
        Ok(UploadedImage { id: resp.id, size: resp.size })
    }

    /// Rate several laptops on one stream; replies come back in request
    /// order.
    pub async fn rate_laptops(
        &self,
        scores: &[(String, f64)],
    ) -> anyhow::Result<Vec<RatingSummary>> {
        let (tx, rx) = mpsc::channel(16);
        let mut client = self.laptops.clone();
        let mut replies =
            client.rate_laptop(self.request(ReceiverStream::new(rx))).await?.into_inner();

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut received = Vec::new();
            let result = loop {
                match replies.message().await {
                    Ok(Some(reply)) => {
                        tracing::debug!(
                            laptop_id = %reply.laptop_id,
                            count = reply.rated_count,
                            average = reply.average_score,
                            "received rating"
                        );
                        received.push(RatingSummary {
                            laptop_id: reply.laptop_id,
                            rated_count: reply.rated_count,
                            average_score: reply.average_score,
                        });
                    }
                    Ok(None) => break Ok(received),
                    Err(status) => break Err(status),
                }
            };
            let _ = done_tx.send(result);
        });

        for (laptop_id, score) in scores {
            let req = proto::RateLaptopRequest { laptop_id: laptop_id.clone(), score: *score };
            if tx.send(req).await.is_err() {
                break;
            }
        }
        drop(tx);

        let received = done_rx.await.map_err(|_| anyhow::anyhow!("rating reader stopped"))??;
        Ok(received)
    }

    /// Stop the background refresh.
    pub async fn close(self) {
        self.refresher.stop().await;
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
