//! Bytecode format version and compatibility table

use std::ops::RangeInclusive;

/// Magic bytes identifying a module: `63 70 6d 80`
///
/// The last byte is outside ASCII; compare as raw bytes, never as a string.
pub const MAGIC: [u8; 4] = [0x63, 0x70, 0x6d, 0x80];

/// Bytecode major version written by this crate
pub const VERSION_MAJOR: u32 = 0;

/// Bytecode minor version written by this crate
pub const VERSION_MINOR: u32 = 0;

/// Which minor versions a rule admits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MinorVersions {
    /// Minor version is not gated
    Any,
    /// Inclusive range of admitted minor versions
    Within(RangeInclusive<u32>),
}

impl MinorVersions {
    fn admits(&self, minor: u32) -> bool {
        match self {
            MinorVersions::Any => true,
            MinorVersions::Within(range) => range.contains(&minor),
        }
    }
}

/// One row of the compatibility table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRule {
    /// Exact major version
    pub major: u32,
    /// Admitted minor versions
    pub minor: MinorVersions,
}

/// Versions this reader accepts
///
/// The minor version is currently always 0 and is not gated.
pub const SUPPORTED_VERSIONS: &[VersionRule] = &[VersionRule {
    major: VERSION_MAJOR,
    minor: MinorVersions::Any,
}];

/// Whether a module of version `major.minor` can be read
pub fn is_supported(major: u32, minor: u32) -> bool {
    SUPPORTED_VERSIONS
        .iter()
        .any(|rule| rule.major == major && rule.minor.admits(minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_version_supported() {
        assert!(is_supported(VERSION_MAJOR, VERSION_MINOR));
    }

    #[test]
    fn test_minor_not_gated() {
        assert!(is_supported(0, 1));
        assert!(is_supported(0, u32::MAX));
    }

    #[test]
    fn test_other_major_rejected() {
        assert!(!is_supported(1, 0));
        assert!(!is_supported(u32::MAX, 0));
    }

    #[test]
    fn test_minor_range_rule() {
        let rule = MinorVersions::Within(2..=4);
        assert!(!rule.admits(1));
        assert!(rule.admits(2));
        assert!(rule.admits(4));
        assert!(!rule.admits(5));
    }
}
