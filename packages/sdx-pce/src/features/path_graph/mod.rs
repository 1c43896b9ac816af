//! Routing graph construction and connectivity checks

mod builder;
mod connectivity;

pub use builder::{LinkMetrics, PathGraphBuilder, RoutingGraph};
pub use connectivity::ConnectivityChecker;
