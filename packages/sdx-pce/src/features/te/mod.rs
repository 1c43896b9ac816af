//! Traffic engineering: request normalization, breakdown, VLAN assignment

mod breakdown;
mod traffic_matrix;
mod vlan;

pub use breakdown::PathBreakdownDecomposer;
pub use traffic_matrix::TrafficMatrixBuilder;
pub use vlan::VlanReservationAllocator;
