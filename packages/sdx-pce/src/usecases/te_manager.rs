//! Traffic engineering façade
//!
//! The single entry point the controller talks to. All engine state (the
//! topology manager, the VLAN tables, the cached routing graph) lives
//! behind one `parking_lot::Mutex`: breakdown generation reads the tables
//! and then writes reservations, and interleaving two such sequences can
//! hand the same tag to two requests, so every entry point serializes on
//! the one lock.

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::errors::{PceError, Result};
use crate::features::path_graph::{ConnectivityChecker, RoutingGraph};
use crate::features::te::{PathBreakdownDecomposer, TrafficMatrixBuilder, VlanReservationAllocator};
use crate::features::topology::LinkProperty;
use crate::shared::models::{
    BreakdownRequest, ConnectionRequest, ConnectionSolution, FailedLink, PortPair, TrafficMatrix,
    VlanTaggedBreakdowns,
};
use crate::usecases::TopologyManager;

#[derive(Debug, Default)]
struct TeState {
    topology: TopologyManager,
    vlan: VlanReservationAllocator,
    graph: Option<RoutingGraph>,
}

#[derive(Debug, Default)]
pub struct TeManager {
    inner: Mutex<TeState>,
}

impl TeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a new domain topology: merge it, register its VLAN ranges
    /// under its own topology id, and rebuild the routing graph. Returns
    /// the domain topology id.
    pub fn add_topology(&self, payload: Value) -> Result<String> {
        let TeState {
            topology,
            vlan,
            graph,
        } = &mut *self.inner.lock();
        let domain = topology.add_topology(payload)?;
        register_domain_vlans(topology, vlan, &domain)?;
        *graph = Some(topology.generate_graph()?);
        Ok(domain)
    }

    /// Re-ingest a changed domain topology. VLAN tables gain any
    /// newly-allowed tags; existing reservations are kept.
    pub fn update_topology(&self, payload: Value) -> Result<String> {
        let TeState {
            topology,
            vlan,
            graph,
        } = &mut *self.inner.lock();
        let domain = topology.update_topology(payload)?;
        register_domain_vlans(topology, vlan, &domain)?;
        *graph = Some(topology.generate_graph()?);
        Ok(domain)
    }

    pub fn remove_topology(&self, topology_id: &str) {
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        topology.remove_topology(topology_id);
        *graph = topology.generate_graph().ok();
    }

    pub fn get_failed_links(&self) -> Vec<FailedLink> {
        self.inner.lock().topology.get_failed_links()
    }

    /// Apply a monitored property change to a link of the merged topology
    /// and rebuild the routing graph so weights reflect it.
    pub fn update_link_property(&self, link_id: &str, property: &LinkProperty) {
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        topology.update_link_property(link_id, property);
        *graph = topology.generate_graph().ok();
    }

    /// Normalize a connection request payload into a traffic matrix in
    /// graph-vertex terms.
    pub fn generate_traffic_matrix(&self, payload: Value) -> Result<TrafficMatrix> {
        let request: ConnectionRequest = serde_json::from_value(payload)?;
        debug!("generating traffic matrix for request {}", request.id);
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        let graph = ensure_graph(topology, graph)?;
        let merged = topology
            .get_topology()
            .ok_or_else(|| PceError::not_found("merged topology"))?;
        TrafficMatrixBuilder::build(merged, graph, &request)
    }

    /// Approximate node connectivity between two graph vertices.
    pub fn graph_node_connectivity(&self, source: usize, destination: usize) -> Result<usize> {
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        let graph = ensure_graph(topology, graph)?;
        Ok(ConnectivityChecker::node_connectivity(
            graph,
            source,
            destination,
        ))
    }

    /// Whether every request of a traffic matrix has non-zero connectivity
    /// between its endpoints.
    pub fn requests_connectivity(&self, matrix: &TrafficMatrix) -> Result<bool> {
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        let graph = ensure_graph(topology, graph)?;
        Ok(ConnectivityChecker::requests_connectivity(graph, matrix))
    }

    /// Decompose a solved path into per-domain segments and reserve VLAN
    /// tags for each, in one critical section.
    pub fn generate_connection_breakdown(
        &self,
        solution: &ConnectionSolution,
        request: &BreakdownRequest,
    ) -> Result<VlanTaggedBreakdowns> {
        let TeState {
            topology,
            vlan,
            graph,
        } = &mut *self.inner.lock();
        let graph = ensure_graph(topology, graph)?;
        let decomposer = PathBreakdownDecomposer::new(topology.merger(), graph);
        let breakdown = decomposer.decompose(solution, request)?;
        vlan.reserve_breakdown(
            &breakdown,
            &solution.request_id,
            topology.merger().port_link_map(),
        )
    }

    /// The port pairs a solved path traverses, in order.
    pub fn links_on_path(&self, solution: &ConnectionSolution) -> Result<Vec<PortPair>> {
        let TeState {
            topology, graph, ..
        } = &mut *self.inner.lock();
        let graph = ensure_graph(topology, graph)?;
        PathBreakdownDecomposer::new(topology.merger(), graph).links_on_path(solution)
    }

    /// Release every VLAN tag held by a request.
    pub fn unreserve_vlan(&self, request_id: &str) {
        self.inner.lock().vlan.unreserve_request(request_id);
    }

    pub fn clear(&self) {
        let state = &mut *self.inner.lock();
        state.topology.clear();
        state.vlan.clear();
        state.graph = None;
    }
}

/// Register the just-ingested domain's own ports into the VLAN tables.
/// The ranges were validated during ingest, so this cannot fail after the
/// merge has been committed.
fn register_domain_vlans(
    topology: &TopologyManager,
    vlan: &mut VlanReservationAllocator,
    domain: &str,
) -> Result<()> {
    let domain_topology = topology
        .domain_topology(domain)
        .ok_or_else(|| PceError::not_found(format!("domain topology {domain}")))?;
    vlan.register_topology(domain_topology)
}

/// The cached routing graph, built from the merged topology on first use.
fn ensure_graph<'a>(
    topology: &TopologyManager,
    graph: &'a mut Option<RoutingGraph>,
) -> Result<&'a RoutingGraph> {
    if graph.is_none() {
        *graph = Some(topology.generate_graph()?);
    }
    graph
        .as_ref()
        .ok_or_else(|| PceError::not_found("routing graph"))
}
