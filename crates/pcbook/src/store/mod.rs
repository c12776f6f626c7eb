// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory stores. Each store owns exactly one `RwLock` over its map and
//! never holds the guard across an `.await`.

pub mod image;
pub mod laptop;
pub mod rating;

pub use image::{normalize_image_type, ArtifactSink, DiskSink, ImageInfo, ImageStore, MemorySink};
pub use laptop::LaptopStore;
pub use rating::RatingStore;
