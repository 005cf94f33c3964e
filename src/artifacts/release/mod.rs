//! Release workflow
//!
//! - `config`: validated settings for a release cycle
//! - `commit_factory`: fabricates commits by copying metadata from a source
//!   commit with fresh, strictly advancing timestamps
//! - `orchestrator`: drives a cycle through its stages in order

pub mod commit_factory;
pub mod config;
pub mod orchestrator;
