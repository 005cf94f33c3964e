//! Git object types and operations
//!
//! Everything the engine persists is a content-addressed object identified by
//! the SHA-1 of its canonical serialization `<type> <size>\0<content>`:
//!
//! - **Blob**: file content plus a file mode
//! - **Tree**: directory listing (names, modes, object ids)
//! - **Commit**: tree snapshot with parents, identities and message
//!
//! Identical content always hashes to the identical id; this is the invariant
//! the whole release engine leans on.

pub mod blob;
pub mod commit;
pub mod entry_mode;
pub mod object;
pub mod object_id;
pub mod object_type;
pub mod tree;

/// Length of a SHA-1 hash in hexadecimal format
pub const OBJECT_ID_LENGTH: usize = 40;
