//! Catalog version constants per supported PostgreSQL major version.
//!
//! The catalog version number names the version-specific indirection
//! directory used for relations in user-defined tablespaces. The constants
//! are fixed per major release and must match the server byte-for-byte.

use crate::error::{Error, Result};

pub const MIN_PG_VERSION: u32 = 13;
pub const MAX_PG_VERSION: u32 = 17;

const CATALOG_VERSIONS: [(u32, &str); 5] = [
    (13, "202004022"),
    (14, "202104081"),
    (15, "202204062"),
    (16, "202303311"),
    (17, "202407111"),
];

/// The 9-digit catalog version number for a major version, or
/// [`Error::UnsupportedVersion`] outside `[13, 17]`.
pub fn catalog_version_number(version: u32) -> Result<&'static str> {
    CATALOG_VERSIONS
        .iter()
        .find(|(v, _)| *v == version)
        .map(|(_, catalog)| *catalog)
        .ok_or(Error::UnsupportedVersion(version))
}

/// The tablespace indirection directory name, `PG_<version>_<catalog>`.
pub fn version_directory(version: u32) -> Result<String> {
    let catalog = catalog_version_number(version)?;
    Ok(format!("PG_{version}_{catalog}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_versions_resolve() {
        assert_eq!(catalog_version_number(13).unwrap(), "202004022");
        assert_eq!(catalog_version_number(17).unwrap(), "202407111");
        assert_eq!(version_directory(14).unwrap(), "PG_14_202104081");
        assert_eq!(version_directory(16).unwrap(), "PG_16_202303311");
    }

    #[test]
    fn versions_outside_the_supported_range_fail() {
        assert!(matches!(
            version_directory(12),
            Err(Error::UnsupportedVersion(12))
        ));
        assert!(matches!(
            version_directory(18),
            Err(Error::UnsupportedVersion(18))
        ));
        assert!(matches!(
            catalog_version_number(0),
            Err(Error::UnsupportedVersion(0))
        ));
    }
}
