// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

pub mod cache;
pub mod entities;
pub mod errors;
pub mod grab;
pub mod interfaces;
pub mod locator;
pub mod models;
pub mod streaming;
