//! Remote side of the release workflow
//!
//! - `transport`: command execution seam (local and remote), with a process
//!   implementation used in production
//! - `sync`: pushing release branches to the deployment repository and
//!   switching its checkout

pub mod sync;
pub mod transport;
