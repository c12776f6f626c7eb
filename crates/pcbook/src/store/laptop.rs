// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::context::CallContext;
use crate::error::ErrorCode;
use crate::model::{Filter, Laptop};

/// Laptop catalog keyed by UUID string.
#[derive(Debug, Default)]
pub struct LaptopStore {
    data: RwLock<HashMap<String, Laptop>>,
}

impl LaptopStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a laptop and return its id.
    ///
    /// A caller-supplied id must be a valid, unused UUID; an empty id gets a
    /// fresh v4 UUID. The uniqueness check and the insert share one write
    /// lock.
    pub fn save(&self, mut laptop: Laptop) -> Result<String, ErrorCode> {
        if !laptop.id.is_empty() && Uuid::parse_str(&laptop.id).is_err() {
            return Err(ErrorCode::InvalidArgument);
        }

        let mut data = self.data.write();
        if laptop.id.is_empty() {
            laptop.id = Uuid::new_v4().to_string();
        } else if data.contains_key(&laptop.id) {
            return Err(ErrorCode::AlreadyExists);
        }

        let id = laptop.id.clone();
        data.insert(id.clone(), laptop);
        Ok(id)
    }

    pub fn find(&self, id: &str) -> Result<Laptop, ErrorCode> {
        self.data.read().get(id).cloned().ok_or(ErrorCode::NotFound)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Emit a copy of every laptop matching `filter` through `found`.
    ///
    /// Matches are copied out under the read lock, which is released before
    /// the first `found` call. The context is checked before each emit; the
    /// first error (cancellation or from `found`) ends the search.
    pub async fn search<F, Fut>(
        &self,
        filter: &Filter,
        ctx: &CallContext,
        mut found: F,
    ) -> Result<(), ErrorCode>
    where
        F: FnMut(Laptop) -> Fut,
        Fut: Future<Output = Result<(), ErrorCode>>,
    {
        ctx.check()?;
        let matches: Vec<Laptop> =
            self.data.read().values().filter(|laptop| filter.matches(laptop)).cloned().collect();

        for laptop in matches {
            if let Err(code) = ctx.check() {
                tracing::debug!(%code, "search aborted");
                return Err(code);
            }
            found(laptop).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "laptop_tests.rs"]
mod tests;
