//! Traffic matrix generation
//!
//! Normalizes a raw point-to-point connection request into graph-vertex
//! terms for the solver: each endpoint UNI port is resolved to its owning
//! node, then to the node's dense vertex id. Unresolvable endpoints are
//! expected during partial-topology states and surface as `NotFound`.

use tracing::warn;

use crate::errors::{PceError, Result};
use crate::features::path_graph::RoutingGraph;
use crate::shared::models::{ConnectionRequest, Topology, TrafficMatrix, TrafficRequest};

#[derive(Debug, Default)]
pub struct TrafficMatrixBuilder;

impl TrafficMatrixBuilder {
    /// Build a single-request traffic matrix from a connection request.
    /// P2MP requests (more than two endpoints) are rejected upstream.
    pub fn build(
        topology: &Topology,
        graph: &RoutingGraph,
        request: &ConnectionRequest,
    ) -> Result<TrafficMatrix> {
        let ingress_node = topology
            .get_node_by_port(&request.ingress_port.id)
            .ok_or_else(|| {
                warn!("no node found for ingress port {}", request.ingress_port.id);
                PceError::not_found(format!("ingress port {}", request.ingress_port.id))
            })?;
        let egress_node = topology
            .get_node_by_port(&request.egress_port.id)
            .ok_or_else(|| {
                warn!("no node found for egress port {}", request.egress_port.id);
                PceError::not_found(format!("egress port {}", request.egress_port.id))
            })?;

        let source = graph.node_index(&ingress_node.id).ok_or_else(|| {
            warn!("ingress node {} not in the routing graph", ingress_node.id);
            PceError::not_found(format!("graph vertex for node {}", ingress_node.id))
        })?;
        let destination = graph.node_index(&egress_node.id).ok_or_else(|| {
            warn!("egress node {} not in the routing graph", egress_node.id);
            PceError::not_found(format!("graph vertex for node {}", egress_node.id))
        })?;

        Ok(TrafficMatrix {
            requests: vec![TrafficRequest {
                source: source.index(),
                destination: destination.index(),
                required_bandwidth: request.bandwidth_required.unwrap_or(0.0),
                required_latency: request.latency_required.unwrap_or(f64::INFINITY),
            }],
            request_id: request.id.clone(),
        })
    }
}
