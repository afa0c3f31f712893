// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flowgate Pipeline
//!
//! Runs an ordered list of jobs against a per-request context: outbound HTTP
//! calls store raw responses, mapping jobs shape them into the final result.
//!
//! ```no_run
//! use flowgate_mapping::{FieldType, MappingEntry, MappingTable, SourceField, TargetField};
//! use flowgate_pipeline::{CallJob, HttpMethod, MappingJob, Pipeline, PipelineContext, RequestDescriptor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//! let table = MappingTable::new().with_entry(MappingEntry::new(
//!     SourceField::new("user", "email", FieldType::String),
//!     TargetField::new("profile", "contact"),
//! ));
//!
//! let pipeline = Pipeline::new("profile")
//!     .then(CallJob::new(
//!         "user",
//!         RequestDescriptor::new(HttpMethod::Get, "https://api.example.com").path("/users/1"),
//!         client,
//!     ))
//!     .then(MappingJob::new("user", table));
//!
//! let result = pipeline
//!     .run(PipelineContext::new(), CancellationToken::new())
//!     .await
//!     .into_result()?;
//! println!("{result}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod jobs;
pub mod request;

pub use config::StepConfig;
pub use context::{ContextKey, ContextValue, PipelineContext};
pub use error::{BuildError, JobError, PipelineError, RequestError};
pub use executor::{Pipeline, PipelineRun, PipelineState};
pub use jobs::{CallJob, Control, FnJob, InspectJob, Job, MappingJob};
pub use request::{HttpMethod, RawResponse, RequestConfig, RequestDescriptor};

// Re-exported so callers need not depend on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
