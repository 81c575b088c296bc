//! # contract: seams between the pipeline stages
//!
//! The traits here are the points where a run touches the outside world:
//! [`Fetcher`] reads source documents, [`ScheduledJob`] is the unit of work the
//! [`Scheduler`](crate::schedule::Scheduler) repeats.
//!
//! Both are annotated for `mockall`, so pipeline tests can script fetch
//! outcomes without a network or a checkout on disk.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Where a source document can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(PathBuf),
    Remote(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => f.write_str(url),
        }
    }
}

/// Why a fetch produced no content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The document does not exist (HTTP 404 or missing file).
    #[error("not found")]
    NotFound,
    /// Anything else: timeout, DNS, connection reset, 5xx, unreadable file.
    #[error("transient fetch failure: {0}")]
    Transient(String),
}

pub type FetchResult = Result<String, FetchError>;

/// Reads the raw markdown behind a [`Location`].
///
/// Implementations never panic on a missing document and never fail the run:
/// every problem is classified into a [`FetchError`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, location: &Location) -> FetchResult;
}

/// Error type for scheduled jobs (boxed, like every other job-level error).
pub type JobError = Box<dyn std::error::Error + Send + Sync>;

/// One full pipeline run as seen by the scheduler.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    /// Human-readable name used in log lines.
    fn name(&self) -> String;

    async fn run_once(&self) -> Result<(), JobError>;
}
