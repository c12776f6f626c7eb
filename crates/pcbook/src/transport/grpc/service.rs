// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service trait implementations: login plus the catalog handlers.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};

use super::convert::{filter_from_proto, laptop_from_proto, laptop_to_proto};
use super::proto::upload_image_request::Data;
use super::{proto, AuthGrpc, GrpcStream, LaptopGrpc};
use crate::auth::INVALID_CREDENTIALS;
use crate::context::CallContext;
use crate::error::ErrorCode;
use crate::store::normalize_image_type;
use crate::transport::AppState;

fn context_status(code: ErrorCode) -> Status {
    code.to_grpc_status(code.default_message())
}

#[tonic::async_trait]
impl proto::auth_service_server::AuthService for AuthGrpc {
    async fn login(
        &self,
        request: Request<proto::LoginRequest>,
    ) -> Result<Response<proto::LoginResponse>, Status> {
        let req = request.into_inner();
        let issued = self.state.auth.login(&req.username, &req.password).await.map_err(|code| {
            match code {
                ErrorCode::NotFound => code.to_grpc_status(INVALID_CREDENTIALS),
                _ => code.to_grpc_status("cannot generate access token"),
            }
        })?;
        Ok(Response::new(proto::LoginResponse {
            access_token: issued.token,
            expires_at: i64::try_from(issued.expires_at).unwrap_or(i64::MAX),
        }))
    }
}

#[tonic::async_trait]
impl proto::laptop_service_server::LaptopService for LaptopGrpc {
    async fn create_laptop(
        &self,
        request: Request<proto::CreateLaptopRequest>,
    ) -> Result<Response<proto::CreateLaptopResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let laptop = request
            .into_inner()
            .laptop
            .map(laptop_from_proto)
            .ok_or_else(|| Status::invalid_argument("laptop is required"))?;
        tracing::debug!(id = %laptop.id, brand = %laptop.brand, "create laptop");

        ctx.check().map_err(context_status)?;

        let requested = laptop.id.clone();
        let id = self.state.laptops.save(laptop).map_err(|code| match code {
            ErrorCode::InvalidArgument => {
                code.to_grpc_status(format!("laptop ID is not a valid UUID: {requested}"))
            }
            _ => code.to_grpc_status(format!("cannot save laptop to the store: {code}")),
        })?;
        tracing::info!(%id, "laptop saved");
        Ok(Response::new(proto::CreateLaptopResponse { id }))
    }

    type SearchLaptopStream = GrpcStream<proto::SearchLaptopResponse>;

    async fn search_laptop(
        &self,
        request: Request<proto::SearchLaptopRequest>,
    ) -> Result<Response<Self::SearchLaptopStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let filter =
            request.into_inner().filter.as_ref().map(filter_from_proto).unwrap_or_default();
        tracing::debug!(?filter, "search laptops");

        let (tx, rx) = mpsc::channel(16);
        let laptops = Arc::clone(&self.state.laptops);
        tokio::spawn(async move {
            let result = laptops
                .search(&filter, &ctx, |laptop| {
                    let tx = tx.clone();
                    async move {
                        tracing::debug!(id = %laptop.id, "found laptop");
                        let found = proto::SearchLaptopResponse {
                            laptop: Some(laptop_to_proto(&laptop)),
                        };
                        // A closed channel means the client went away.
                        tx.send(Ok(found)).await.map_err(|_| ErrorCode::Cancelled)
                    }
                })
                .await;
            if let Err(code) = result {
                tracing::debug!(%code, "search ended early");
                let _ = tx.send(Err(context_status(code))).await;
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }

    async fn upload_image(
        &self,
        request: Request<Streaming<proto::UploadImageRequest>>,
    ) -> Result<Response<proto::UploadImageResponse>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let mut stream = request.into_inner();

        let info = match stream.message().await?.and_then(|m| m.data) {
            Some(Data::Info(info)) => info,
            Some(Data::ChunkData(_)) => {
                return Err(Status::invalid_argument("image info must be sent before image data"))
            }
            None => return Err(Status::invalid_argument("missing image info")),
        };
        let image_type = normalize_image_type(&info.image_type).ok_or_else(|| {
            Status::invalid_argument(format!("invalid image type: {:?}", info.image_type))
        })?;
        if !self.state.laptops.contains(&info.laptop_id) {
            return Err(ErrorCode::NotFound
                .to_grpc_status(format!("laptop {} doesn't exist", info.laptop_id)));
        }
        tracing::debug!(laptop_id = %info.laptop_id, %image_type, "receiving image");

        let max = self.state.max_image_size;
        let mut image = BytesMut::new();
        loop {
            ctx.check().map_err(context_status)?;
            let Some(message) = stream.message().await? else {
                break;
            };
            match message.data {
                Some(Data::ChunkData(chunk)) => {
                    let size = image.len() + chunk.len();
                    if size > max {
                        return Err(Status::invalid_argument(format!(
                            "image is too large: {size} > {max}"
                        )));
                    }
                    image.extend_from_slice(&chunk);
                }
                Some(Data::Info(_)) => {
                    return Err(Status::invalid_argument("image info sent more than once"))
                }
                None => return Err(Status::invalid_argument("empty upload message")),
            }
        }

        let size = image.len() as u64;
        let id = self
            .state
            .images
            .save(&info.laptop_id, &image_type, image.freeze())
            .await
            .map_err(|e| {
                tracing::error!(laptop_id = %info.laptop_id, err = %e, "cannot save image");
                ErrorCode::Internal.to_grpc_status("cannot save image to the store")
            })?;
        tracing::info!(%id, laptop_id = %info.laptop_id, size, "image saved");
        Ok(Response::new(proto::UploadImageResponse { id, size }))
    }

    type RateLaptopStream = GrpcStream<proto::RateLaptopResponse>;

    async fn rate_laptop(
        &self,
        request: Request<Streaming<proto::RateLaptopRequest>>,
    ) -> Result<Response<Self::RateLaptopStream>, Status> {
        let ctx = CallContext::from_metadata(request.metadata());
        let mut stream = request.into_inner();
        let (tx, rx) = mpsc::channel(16);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            loop {
                if let Err(code) = ctx.check() {
                    let _ = tx.send(Err(context_status(code))).await;
                    break;
                }
                let message = tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!("rating client went away");
                        break;
                    }
                    code = ctx.done() => {
                        let _ = tx.send(Err(context_status(code))).await;
                        break;
                    }
                    message = stream.message() => message,
                };

                let req = match message {
                    Ok(Some(req)) => req,
                    Ok(None) => break,
                    Err(status) => {
                        tracing::warn!(%status, "cannot receive rating request");
                        // The client may already be gone.
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                };
                let reply = match rate_one(&state, req) {
                    Ok(reply) => reply,
                    Err(status) => {
                        let _ = tx.send(Err(status)).await;
                        break;
                    }
                };
                if tx.send(Ok(reply)).await.is_err() {
                    break;
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

/// Apply one score and build its reply.
fn rate_one(
    state: &AppState,
    req: proto::RateLaptopRequest,
) -> Result<proto::RateLaptopResponse, Status> {
    if !state.laptops.contains(&req.laptop_id) {
        return Err(ErrorCode::NotFound
            .to_grpc_status(format!("laptop {} doesn't exist", req.laptop_id)));
    }
    let rating = state.ratings.add(&req.laptop_id, req.score).map_err(|code| {
        code.to_grpc_status(format!("cannot rate laptop {}: score {}", req.laptop_id, req.score))
    })?;
    tracing::debug!(
        laptop_id = %req.laptop_id,
        score = req.score,
        count = rating.count,
        "laptop rated"
    );
    Ok(proto::RateLaptopResponse {
        laptop_id: req.laptop_id,
        rated_count: rating.count,
        average_score: rating.average(),
    })
}
