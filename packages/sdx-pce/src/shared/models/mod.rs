//! Shared data models

mod connection;
mod topology;

pub use connection::{
    BreakdownRequest, ConnectionPath, ConnectionRequest, ConnectionSolution, DomainBreakdown,
    DomainPaths, DomainSegment, PortPair, RequestPort, TagSpec, TrafficMatrix, TrafficRequest,
    UserPort, VlanTag, VlanTaggedBreakdown, VlanTaggedBreakdowns, VlanTaggedPort,
};
pub use topology::{
    FailedLink, L2vpnPtpService, LabelRange, LabelSpec, Link, Node, Port, PortRef, PortServices,
    Topology, INITIAL_VERSION, MERGED_TOPOLOGY_ID, PORT_ID_PREFIX, TOPOLOGY_ID_PREFIX,
};
