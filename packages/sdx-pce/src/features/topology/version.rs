//! Super-topology version arithmetic
//!
//! Versions are "major.minor" strings. Incremental ingest (add/remove of a
//! domain) bumps the minor component; a full re-ingest (update) bumps the
//! major component and resets minor to zero.

/// Which component of a "major.minor" version to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
}

/// Compute the next version string. A version lacking a `.` is treated as
/// a bare major with minor "0".
pub fn new_version(version: &str, bump: VersionBump) -> String {
    let (major, minor) = match version.split_once('.') {
        Some((major, minor)) => (major, minor),
        None => (version, "0"),
    };
    let major: u64 = major.trim().parse().unwrap_or(0);
    let minor: u64 = minor.trim().parse().unwrap_or(0);

    match bump {
        VersionBump::Major => format!("{}.0", major + 1),
        VersionBump::Minor => format!("{}.{}", major, minor + 1),
    }
}
