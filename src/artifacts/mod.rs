//! Release engine data structures and algorithms
//!
//! - `branch`: validated branch names
//! - `filter`: copy-on-write tree rewriting (the release filter)
//! - `objects`: git object types (blob, tree, commit)
//! - `release`: release configuration, commit factory and orchestrator
//! - `remote`: transport capability and remote repository synchronization

pub mod branch;
pub mod filter;
pub mod objects;
pub mod release;
pub mod remote;
