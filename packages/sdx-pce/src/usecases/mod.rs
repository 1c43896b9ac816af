//! Controller-facing façades

mod te_manager;
mod topology_manager;

pub use te_manager::TeManager;
pub use topology_manager::TopologyManager;
