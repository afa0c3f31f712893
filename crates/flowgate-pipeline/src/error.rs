// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for outbound calls, jobs and pipeline runs.
//!
//! Only [`PipelineError`] leaves a run. A job error of any kind aborts the
//! remaining jobs; the executor never retries.

use flowgate_mapping::MappingError;
use flowgate_tree::TreeError;
use thiserror::Error;

/// Errors building or executing a single outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Method name outside GET, POST, PUT, DELETE, HEAD, OPTIONS, PATCH.
    #[error(
        "unsupported HTTP method '{0}' (expected one of: GET, POST, PUT, DELETE, HEAD, OPTIONS, PATCH)"
    )]
    UnsupportedMethod(String),

    /// The URL, a header or the body could not be turned into a request.
    #[error("invalid request to '{url}': {message}")]
    InvalidRequest { url: String, message: String },

    /// No response was received (DNS, connection refused, timeout, ...).
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },
}

/// Errors returned by a job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Request(#[from] RequestError),

    /// A job expected a value in the context that no earlier job stored.
    #[error("no value stored under context key {0}")]
    MissingContextValue(String),

    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The run was cancelled while this job was in flight.
    #[error("cancelled")]
    Cancelled,

    /// A nested pipeline failed.
    #[error(transparent)]
    Nested(Box<PipelineError>),

    #[error("{0}")]
    Custom(String),
}

impl JobError {
    pub fn custom(message: impl Into<String>) -> Self {
        JobError::Custom(message.into())
    }

    /// Whether this error (or a nested one) is a transport failure.
    pub fn is_transport(&self) -> bool {
        match self {
            JobError::Request(RequestError::Transport { .. }) => true,
            JobError::Nested(inner) => inner.is_transport(),
            _ => false,
        }
    }
}

/// The first error of a failed pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job '{job}' failed: {source}")]
    Job {
        job: String,
        #[source]
        source: JobError,
    },

    #[error("pipeline cancelled at job '{job}'")]
    Cancelled { job: String },

    #[error("pipeline completed without a final result")]
    MissingFinalResult,
}

impl PipelineError {
    /// Whether the run failed because an outbound call got no response.
    pub fn is_transport(&self) -> bool {
        match self {
            PipelineError::Job { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    /// Whether the run was cancelled before completing.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled { .. })
    }

    /// Stable error code for boundary responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            _ if self.is_transport() => "TRANSPORT_ERROR",
            PipelineError::Job { .. } => "JOB_FAILED",
            PipelineError::Cancelled { .. } => "CANCELLED",
            PipelineError::MissingFinalResult => "MISSING_FINAL_RESULT",
        }
    }
}

/// Errors turning step configuration into a pipeline.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("step {index}: {source}")]
    Request {
        index: usize,
        #[source]
        source: RequestError,
    },

    #[error("step {index}: {source}")]
    Mapping {
        index: usize,
        #[source]
        source: MappingError,
    },
}
