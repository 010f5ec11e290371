// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::locator::ProbedBuild;
use std::fmt::Debug;
use std::hash::Hash;

pub trait Grabbable {
    type Attribute: Copy + Eq + Hash + Debug;
    type Value;
    type Source;

    async fn grab_one(&self, source: &mut Self::Source, attribute: Self::Attribute) -> anyhow::Result<Self::Value>;
}

pub trait BuildProbe {
    async fn probe(&mut self, number: u64) -> anyhow::Result<ProbedBuild>;
}
