//! sdx-pce: path computation engine for a multi-domain SDX controller
//!
//! Per-domain topologies are merged into one super-topology with
//! discovered inter-domain links and a monotonic version; a routing graph
//! is built from the merge; connection requests are normalized into
//! traffic matrices, solved paths are decomposed into per-domain segments,
//! and VLAN tags are reserved for each segment.
//!
//! The controller talks to [`TeManager`]; everything below it is exposed
//! for direct use and testing.

pub mod errors;
pub mod features;
pub mod shared;
pub mod usecases;

pub use errors::{PceError, Result};
pub use features::path_graph::{ConnectivityChecker, PathGraphBuilder, RoutingGraph};
pub use features::te::{PathBreakdownDecomposer, TrafficMatrixBuilder, VlanReservationAllocator};
pub use features::topology::{LinkProperty, TopologyMerger};
pub use usecases::{TeManager, TopologyManager};
