// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod run;
pub mod store;
pub mod test_support;
pub mod transport;
