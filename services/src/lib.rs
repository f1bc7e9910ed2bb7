//! Service layer: the progress-aggregation pipeline and the write flows that
//! feed it.
//!
//! Reads go through [`fetchers::RecordFetcher`] (read-only client, bounded by a
//! timeout), are reduced per student in [`progress`], aggregated per class in
//! [`class_progress`], and wrapped by [`progress_service::ProgressService`],
//! which decides when to degrade to [`fallback`] data.

pub mod class_progress;
pub mod content;
pub mod fallback;
pub mod fetchers;
pub mod password_reset;
pub mod progress;
pub mod progress_service;
