//! Core repository components
//!
//! - `database`: content-addressed object store (blobs, trees, commits)
//! - `refs`: branch and tag registry (the only mutable state)
//! - `repository`: wiring plus the configured committer identity

pub mod database;
pub mod refs;
pub mod repository;
