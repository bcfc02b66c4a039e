//! Change detection for incremental code generation.
//!
//! A host pipeline re-scans source and hands over, per declaration key, an
//! ordered snapshot of text fragments. This crate decides whether each
//! snapshot is content-equal to the one seen on the previous pass, records the
//! outcome on the key's [`Entry`], and lets an [`EmitPolicy`] decide whether
//! the expensive generation step has to run. Cache state can be persisted
//! between process runs through [`Cache`].

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod compare;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod policy;
pub mod snapshot;
pub mod store;

pub use cache::Cache;
pub use compare::{
    compare, merge_flags, snapshots_equal, Comparison, ContentEq, FirstRunPolicy,
    FragmentComparer,
};
pub use entry::{validate_key, ChangeReason, Entry, Verdict};
pub use error::CacheError;
pub use pipeline::{run_pass, MemorySink, OutputSink, PassReport};
pub use policy::{EmitMode, EmitPolicy};
pub use snapshot::Snapshot;
pub use store::{ChangeCache, ScanReport};
