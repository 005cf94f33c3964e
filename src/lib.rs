//! gitship: a git release engine.
//!
//! Fabricates release commits directly in a repository's loose-object store,
//! with no working directory involved, filters their trees copy-on-write and
//! deploys them by pushing a `release/<branch>` branch to a remote checkout.

pub mod areas;
pub mod artifacts;
pub mod errors;
