//! Run orchestration for the two CLI entry points.

pub mod ingest;
pub mod transform;
