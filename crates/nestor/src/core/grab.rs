// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::cache::EntityCache;
use crate::core::entities::{BuildId, JobId};
use crate::core::interfaces::Grabbable;
use crate::core::models::{BuildResult, BuildSnapshot, JobStatus};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobAttribute {
    Status,
    HealthReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuildAttribute {
    Source,
    Result,
    Children,
}

#[derive(Clone, Debug)]
pub enum AttributeValue {
    Status(JobStatus),
    HealthReport(Vec<String>),
    Source(Box<BuildSnapshot>),
    Result(BuildResult),
    Children(Vec<BuildId>),
}

impl AttributeValue {
    pub fn as_status(&self) -> Option<&JobStatus> {
        match self {
            AttributeValue::Status(status) => Some(status),
            _ => None,
        }
    }

    pub fn as_health_report(&self) -> Option<&[String]> {
        match self {
            AttributeValue::HealthReport(reports) => Some(reports.as_slice()),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&BuildSnapshot> {
        match self {
            AttributeValue::Source(snapshot) => Some(snapshot.as_ref()),
            _ => None,
        }
    }

    pub fn as_result(&self) -> Option<&BuildResult> {
        match self {
            AttributeValue::Result(result) => Some(result),
            _ => None,
        }
    }

    pub fn as_children(&self) -> Option<&[BuildId]> {
        match self {
            AttributeValue::Children(children) => Some(children.as_slice()),
            _ => None,
        }
    }
}

impl Grabbable for JobId {
    type Attribute = JobAttribute;
    type Value = AttributeValue;
    type Source = EntityCache;

    async fn grab_one(&self, cache: &mut EntityCache, attribute: JobAttribute) -> anyhow::Result<AttributeValue> {
        let value = match attribute {
            JobAttribute::Status => AttributeValue::Status(cache.job_status(*self).await?),
            JobAttribute::HealthReport => AttributeValue::HealthReport(cache.job_health_report(*self).await?),
        };

        Ok(value)
    }
}

impl Grabbable for BuildId {
    type Attribute = BuildAttribute;
    type Value = AttributeValue;
    type Source = EntityCache;

    async fn grab_one(&self, cache: &mut EntityCache, attribute: BuildAttribute) -> anyhow::Result<AttributeValue> {
        let value = match attribute {
            BuildAttribute::Source => AttributeValue::Source(Box::new(cache.build_source(*self).await?)),
            BuildAttribute::Result => AttributeValue::Result(cache.build_result(*self).await?),
            BuildAttribute::Children => AttributeValue::Children(cache.build_children(*self).await?),
        };

        Ok(value)
    }
}

/// Resolved attributes, keyed by attribute, plus the entity they were grabbed from
pub struct Grabbed<E: Grabbable> {
    pub origin: E,
    pub values: HashMap<E::Attribute, E::Value>,
}

impl<E: Grabbable> Grabbed<E> {
    pub fn get(&self, attribute: E::Attribute) -> Option<&E::Value> {
        self.values.get(&attribute)
    }
}

pub struct GrabFailure<E: Grabbable> {
    pub error: anyhow::Error,
    pub partial: Grabbed<E>,
}

impl<E: Grabbable> GrabFailure<E> {
    pub fn into_error(self) -> anyhow::Error {
        self.error
    }
}

impl<E> Debug for Grabbed<E>
where
    E: Grabbable + Debug,
    E::Value: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grabbed")
            .field("origin", &self.origin)
            .field("values", &self.values)
            .finish()
    }
}

impl<E> Debug for GrabFailure<E>
where
    E: Grabbable + Debug,
    E::Value: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrabFailure")
            .field("error", &self.error)
            .field("partial", &self.partial)
            .finish()
    }
}

/// Resolves attributes one after another, stopping at the first failure.
///
/// On failure the partial result (origin plus everything resolved so far) comes
/// back with the error; attributes after the failing one are never requested.
pub async fn grab<E: Grabbable>(
    source: &mut E::Source,
    entity: E,
    attributes: &[E::Attribute],
) -> Result<Grabbed<E>, GrabFailure<E>> {
    let mut grabbed = Grabbed {
        origin: entity,
        values: HashMap::new(),
    };

    for attribute in attributes {
        match grabbed.origin.grab_one(source, *attribute).await {
            Ok(value) => {
                grabbed.values.insert(*attribute, value);
            },
            Err(error) => {
                log::info!("[nestor.grab] cannot resolve {:?} : {}", attribute, error);
                return Err(GrabFailure {
                    error,
                    partial: grabbed,
                });
            },
        }
    }

    Ok(grabbed)
}
