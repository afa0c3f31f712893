// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Step configuration.
//!
//! Pipelines loaded from route files use `String` context keys:
//!
//! ```json
//! [
//!   {"call": {"key": "user", "request": {"method": "GET", "base_url": "https://api.example.com", "path": "/users/1"}}},
//!   {"inspect": {"key": "user"}},
//!   {"map": {"source": "user", "entries": [
//!     {"from": {"path": "user", "key": "email"}, "to": {"path": "profile", "key": "contact"}}
//!   ]}}
//! ]
//! ```

use flowgate_mapping::{MappingEntryConfig, MappingTable};
use flowgate_tree::ParseMode;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use crate::executor::Pipeline;
use crate::jobs::{CallJob, InspectJob, MappingJob};
use crate::request::{RequestConfig, RequestDescriptor};

/// One configured pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepConfig {
    Call {
        key: String,
        request: RequestConfig,
    },
    Map {
        source: String,
        #[serde(default)]
        parse_mode: ParseMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        store_as: Option<String>,
        entries: Vec<MappingEntryConfig>,
    },
    Inspect {
        key: String,
        #[serde(default = "enabled")]
        status: bool,
        #[serde(default)]
        headers: bool,
        #[serde(default = "enabled")]
        body: bool,
    },
}

fn enabled() -> bool {
    true
}

impl Pipeline<String> {
    /// Build a pipeline from configured steps.
    ///
    /// Method, type and converter names are validated here, so a built
    /// pipeline never meets an unknown name at runtime.
    pub fn from_config(
        name: impl Into<String>,
        steps: &[StepConfig],
        client: &reqwest::Client,
    ) -> Result<Self, BuildError> {
        let mut pipeline = Pipeline::new(name);
        for (index, step) in steps.iter().enumerate() {
            pipeline = match step {
                StepConfig::Call { key, request } => {
                    let descriptor = RequestDescriptor::from_config(request)
                        .map_err(|source| BuildError::Request { index, source })?;
                    pipeline.then(CallJob::new(key.clone(), descriptor, client.clone()))
                }
                StepConfig::Map {
                    source,
                    parse_mode,
                    store_as,
                    entries,
                } => {
                    let table = MappingTable::from_config(entries)
                        .map_err(|source| BuildError::Mapping { index, source })?;
                    let mut job = MappingJob::new(source.clone(), table).with_parse_mode(*parse_mode);
                    if let Some(target) = store_as {
                        job = job.also_store_as(target.clone());
                    }
                    pipeline.then(job)
                }
                StepConfig::Inspect {
                    key,
                    status,
                    headers,
                    body,
                } => pipeline.then(
                    InspectJob::new(key.clone())
                        .with_status(*status)
                        .with_headers(*headers)
                        .with_body(*body),
                ),
            };
        }
        Ok(pipeline)
    }
}
