// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::ErrorCode;
use crate::model::Rating;

/// Running score aggregates keyed by laptop id.
#[derive(Debug, Default)]
pub struct RatingStore {
    ratings: RwLock<HashMap<String, Rating>>,
}

impl RatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one score and return the updated aggregate.
    ///
    /// The entry is created on the first score; count and sum change together
    /// under one write lock.
    pub fn add(&self, laptop_id: &str, score: f64) -> Result<Rating, ErrorCode> {
        if !score.is_finite() {
            return Err(ErrorCode::InvalidArgument);
        }

        let mut ratings = self.ratings.write();
        let rating = ratings.entry(laptop_id.to_owned()).or_default();
        rating.count = rating.count.checked_add(1).ok_or(ErrorCode::Internal)?;
        rating.sum += score;
        Ok(*rating)
    }

    pub fn get(&self, laptop_id: &str) -> Option<Rating> {
        self.ratings.read().get(laptop_id).copied()
    }
}
