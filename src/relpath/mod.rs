//! On-disk relation path resolution.
//!
//! Reproduces the server's file-naming rules byte-for-byte: a wrong path at
//! restore time corrupts or loses data, so the grammar here must track the
//! target major version exactly. Pure and deterministic; the only lookup is
//! the in-memory [`catalog`] table.

use crate::error::{Error, Result};

pub mod catalog;

/// An object identifier, as the server defines it.
pub type Oid = u32;

/// Tablespace for shared system relations, `{datadir}/global`.
pub const GLOBALTABLESPACE_OID: Oid = 1664;
/// The default tablespace, `{datadir}/base`.
pub const DEFAULTTABLESPACE_OID: Oid = 1663;

/// Names per fork, indexed by [`ForkNumber`]. A fork other than `Main`
/// contributes a literal `_<name>` suffix token; `Main` contributes none.
const FORK_NAMES: [&str; 4] = ["main", "fsm", "vm", "init"];

/// One of the parallel data files a relation may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForkNumber {
    Main,
    FreeSpaceMap,
    VisibilityMap,
    Init,
}

impl ForkNumber {
    pub fn name(self) -> &'static str {
        FORK_NAMES[self as usize]
    }

    /// The `_<name>` suffix this fork contributes to a file name, empty for
    /// the main fork.
    fn suffix(self) -> String {
        match self {
            ForkNumber::Main => String::new(),
            other => format!("_{}", other.name()),
        }
    }
}

impl TryFrom<u32> for ForkNumber {
    type Error = Error;

    /// Decode a raw fork number, e.g. from a WAL record. Values outside the
    /// four known forks are rejected rather than defaulted.
    fn try_from(raw: u32) -> Result<Self> {
        match raw {
            0 => Ok(ForkNumber::Main),
            1 => Ok(ForkNumber::FreeSpaceMap),
            2 => Ok(ForkNumber::VisibilityMap),
            3 => Ok(ForkNumber::Init),
            other => Err(Error::InvalidArgument(format!(
                "invalid fork number: {other}"
            ))),
        }
    }
}

/// Identifies one relation fork on disk. Immutable value type.
///
/// `backend` distinguishes a session-temporary relation file from the
/// persistent one; `None` means "not a temporary file".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelFileLocator {
    pub dbnode: Oid,
    pub spcnode: Oid,
    pub relnode: Oid,
    pub backend: Option<i32>,
    pub fork: ForkNumber,
}

impl RelFileLocator {
    /// A persistent relation in the default tablespace.
    pub fn permanent(dbnode: Oid, relnode: Oid, fork: ForkNumber) -> Self {
        Self {
            dbnode,
            spcnode: DEFAULTTABLESPACE_OID,
            relnode,
            backend: None,
            fork,
        }
    }
}

/// Construct the path to a relation's file, relative to the data directory.
///
/// `version` is the target server's major version and is consulted only for
/// relations in user-defined tablespaces, which live behind a versioned
/// indirection directory.
pub fn relation_path(rel: &RelFileLocator, version: u32) -> Result<String> {
    let suffix = rel.fork.suffix();

    let path = if rel.spcnode == GLOBALTABLESPACE_OID {
        // Shared system relations live in {datadir}/global.
        if rel.dbnode != 0 || rel.backend.is_some() {
            return Err(Error::InvalidArgument(format!(
                "global tablespace relation {} must have database oid 0 and no backend id",
                rel.relnode
            )));
        }
        format!("global/{}{}", rel.relnode, suffix)
    } else if rel.spcnode == DEFAULTTABLESPACE_OID {
        match rel.backend {
            None => format!("base/{}/{}{}", rel.dbnode, rel.relnode, suffix),
            Some(backend) => {
                format!("base/{}/t{}_{}{}", rel.dbnode, backend, rel.relnode, suffix)
            }
        }
    } else {
        // All other tablespaces are accessed via the versioned symlink
        // directory.
        let version_dir = catalog::version_directory(version)?;
        match rel.backend {
            None => format!(
                "pg_tblspc/{}/{}/{}/{}{}",
                rel.spcnode, version_dir, rel.dbnode, rel.relnode, suffix
            ),
            Some(backend) => format!(
                "pg_tblspc/{}/{}/{}/t{}_{}{}",
                rel.spcnode, version_dir, rel.dbnode, backend, rel.relnode, suffix
            ),
        }
    };

    Ok(path)
}
