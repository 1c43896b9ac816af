//! Topology merging and versioning

mod merger;
mod version;

pub use merger::{LinkProperty, TopologyMerger, INTERDOMAIN_LINK_ID_PREFIX};
pub use version::{new_version, VersionBump};
