//! Tree entry modes
//!
//! Release trees carry every entry kind a real repository tree can: regular
//! and executable files, symbolic links, directories and submodule (gitlink)
//! references. Symlinks and submodules are leaves to the filter; a submodule
//! is never recursed into.

/// Mode of a blob entry.
#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
    Symlink,
}

/// Mode of a tree entry.
#[derive(Debug, Clone, Eq, Ord, Default, PartialEq, PartialOrd)]
pub enum EntryMode {
    File(FileMode),
    #[default]
    Directory,
    /// Submodule reference (gitlink): the oid names a commit in another
    /// repository, so there is nothing local to recurse into.
    Submodule,
}

impl EntryMode {
    pub fn as_str(&self) -> &str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::File(FileMode::Symlink) => "120000",
            EntryMode::Directory => "40000",
            EntryMode::Submodule => "160000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::File(FileMode::Symlink) => 0o120000,
            EntryMode::Directory => 0o40000,
            EntryMode::Submodule => 0o160000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

impl TryFrom<&str> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "100644" => Ok(EntryMode::File(FileMode::Regular)),
            "100755" => Ok(EntryMode::File(FileMode::Executable)),
            "120000" => Ok(EntryMode::File(FileMode::Symlink)),
            // git serializes tree modes without the leading zero
            "40000" | "040000" => Ok(EntryMode::Directory),
            "160000" => Ok(EntryMode::Submodule),
            _ => Err(anyhow::anyhow!("Invalid entry mode: {value}")),
        }
    }
}
