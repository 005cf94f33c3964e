//! Typed failure kinds of the release engine
//!
//! Every variant is fatal to the operation that raised it; nothing here is
//! retried. Retry policy for transient transport failures belongs to the
//! `Transport` implementation, not to this crate. Errors travel inside
//! `anyhow::Error` and can be recovered with `downcast_ref::<ReleaseError>()`.

use crate::artifacts::objects::object_id::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReleaseError {
    /// A required configuration field was missing or empty at construction
    /// time, before any I/O happened.
    #[error("missing required configuration: {0}")]
    Configuration(&'static str),

    /// An object hash was dereferenced but no object with that id exists in
    /// the object database.
    #[error("object {0} not found in the object database")]
    ObjectNotFound(ObjectId),

    /// A branch or tag was referenced where its presence was assumed, e.g.
    /// tagging before any release commit exists.
    #[error("ref '{0}' not found")]
    RefNotFound(String),

    /// A filter removal named a path that does not exist in the tree being
    /// rewritten. A silent no-op would hide typos in cleanup rules.
    #[error("path '{0}' not found in the release tree")]
    PathNotFound(String),

    /// A remote path exists but is not of the expected kind. Remediation
    /// would be destructive, so the engine refuses to do it silently.
    #[error("remote path '{path}' exists but is not {expected}")]
    RemoteState {
        path: String,
        expected: &'static str,
    },

    /// An object write did not yield a resolvable hash. The object database
    /// is presumed corrupt and the cycle aborts.
    #[error("object {0} was written but cannot be resolved back from the store")]
    WriteIntegrity(ObjectId),
}
