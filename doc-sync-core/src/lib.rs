#![doc = "doc-sync-core: core logic library for doc-sync."]

//! This crate contains the pipelines that keep a static documentation site in
//! sync with the markdown of its sibling repositories:
//!
//! - [`synchronise`]: fetch a declared table of documents, rewrite them and write
//!   them into the site's docs tree;
//! - [`generate`]: scan a local checkout for per-module READMEs and rebuild a
//!   per-module documentation tree;
//! - [`schedule`]: re-run a job on a fixed interval until shut down.
//!
//! # Usage
//! The `doc-sync` binary crate owns CLI parsing and config file loading; all
//! pipeline logic lives here and takes its configuration explicitly.

pub mod config;
pub mod contract;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod locate;
pub mod markup;
pub mod scan;
pub mod schedule;
pub mod sidebar;
pub mod synchronise;
pub mod transform;
pub mod write;

pub use error::SyncError;
