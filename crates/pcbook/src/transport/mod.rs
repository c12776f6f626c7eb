// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod grpc;

use std::sync::Arc;

use crate::auth::{AuthService, Authorizer};
use crate::store::{ImageStore, LaptopStore, RatingStore};

pub use auth::{AuthLayer, AuthMiddleware};

/// Default cap on one uploaded image.
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 1 << 20;

/// Everything the gRPC handlers and the auth layer share.
pub struct AppState {
    pub laptops: Arc<LaptopStore>,
    pub images: Arc<ImageStore>,
    pub ratings: Arc<RatingStore>,
    pub auth: AuthService,
    pub authorizer: Authorizer,
    pub max_image_size: usize,
}
