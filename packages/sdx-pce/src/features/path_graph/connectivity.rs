//! Approximate node-connectivity checks
//!
//! Fast approximation of local node connectivity between two vertices:
//! repeatedly find a shortest path, then exclude its interior vertices,
//! counting how many vertex-disjoint paths were found before the pair
//! disconnects. The count is capped at the smaller endpoint degree. For
//! admission purposes only the zero/non-zero distinction matters.

use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::shared::models::TrafficMatrix;

use super::builder::RoutingGraph;

/// Approximate connectivity checks over a routing graph.
#[derive(Debug, Default)]
pub struct ConnectivityChecker;

impl ConnectivityChecker {
    /// Approximate node connectivity between two vertices. Zero means the
    /// pair is disconnected (or a vertex is unknown).
    pub fn node_connectivity(graph: &RoutingGraph, source: usize, destination: usize) -> usize {
        let source = NodeIndex::new(source);
        let destination = NodeIndex::new(destination);
        let inner = graph.graph();

        if source == destination
            || inner.node_weight(source).is_none()
            || inner.node_weight(destination).is_none()
        {
            return 0;
        }

        let cutoff = usize::min(
            inner.neighbors(source).count(),
            inner.neighbors(destination).count(),
        );

        let mut excluded: HashSet<NodeIndex> = HashSet::new();
        let mut disjoint_paths = 0;
        while disjoint_paths < cutoff {
            let Some(path) = shortest_path_avoiding(graph, source, destination, &excluded) else {
                break;
            };
            for vertex in path {
                if vertex != source && vertex != destination {
                    excluded.insert(vertex);
                }
            }
            disjoint_paths += 1;
        }
        disjoint_paths
    }

    /// True iff every request in the matrix has non-zero connectivity
    /// between its source and destination vertices.
    pub fn requests_connectivity(graph: &RoutingGraph, matrix: &TrafficMatrix) -> bool {
        for request in &matrix.requests {
            let connectivity =
                Self::node_connectivity(graph, request.source, request.destination);
            debug!(
                "request connectivity: source {} destination {} = {}",
                request.source, request.destination, connectivity
            );
            if connectivity == 0 {
                warn!(
                    "no connectivity between {} and {} for request {}",
                    request.source, request.destination, matrix.request_id
                );
                return false;
            }
        }
        true
    }
}

/// BFS shortest path from `source` to `destination` that never enters an
/// excluded vertex.
fn shortest_path_avoiding(
    graph: &RoutingGraph,
    source: NodeIndex,
    destination: NodeIndex,
    excluded: &HashSet<NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    let inner = graph.graph();
    let mut predecessor: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut queue = VecDeque::new();

    visited.insert(source);
    queue.push_back(source);

    while let Some(vertex) = queue.pop_front() {
        for neighbor in inner.neighbors(vertex) {
            if excluded.contains(&neighbor) || !visited.insert(neighbor) {
                continue;
            }
            predecessor.insert(neighbor, vertex);
            if neighbor == destination {
                let mut path = vec![destination];
                let mut current = destination;
                while let Some(&previous) = predecessor.get(&current) {
                    path.push(previous);
                    current = previous;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(neighbor);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::path_graph::builder::PathGraphBuilder;
    use crate::shared::models::{Topology, TrafficRequest};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ring_of_three() -> RoutingGraph {
        let topology: Topology = serde_json::from_value(json!({
            "id": "urn:sdx:topology:amlight.net",
            "nodes": [
                {"id": "urn:sdx:node:amlight.net:A1",
                 "ports": [{"id": "urn:sdx:port:amlight.net:A1:1"},
                           {"id": "urn:sdx:port:amlight.net:A1:2"}]},
                {"id": "urn:sdx:node:amlight.net:A2",
                 "ports": [{"id": "urn:sdx:port:amlight.net:A2:1"},
                           {"id": "urn:sdx:port:amlight.net:A2:2"}]},
                {"id": "urn:sdx:node:amlight.net:A3",
                 "ports": [{"id": "urn:sdx:port:amlight.net:A3:1"},
                           {"id": "urn:sdx:port:amlight.net:A3:2"}]},
            ],
            "links": [
                {"id": "l1", "ports": ["urn:sdx:port:amlight.net:A1:1",
                                        "urn:sdx:port:amlight.net:A2:1"]},
                {"id": "l2", "ports": ["urn:sdx:port:amlight.net:A2:2",
                                        "urn:sdx:port:amlight.net:A3:1"]},
                {"id": "l3", "ports": ["urn:sdx:port:amlight.net:A3:2",
                                        "urn:sdx:port:amlight.net:A1:2"]},
            ],
        }))
        .unwrap();
        PathGraphBuilder::build(&topology)
    }

    #[test]
    fn test_ring_connectivity_is_two() {
        let graph = ring_of_three();
        assert_eq!(ConnectivityChecker::node_connectivity(&graph, 0, 2), 2);
    }

    #[test]
    fn test_disconnected_pair() {
        let topology: Topology = serde_json::from_value(json!({
            "id": "urn:sdx:topology:amlight.net",
            "nodes": [
                {"id": "n1", "ports": [{"id": "p1"}]},
                {"id": "n2", "ports": [{"id": "p2"}]},
            ],
            "links": [],
        }))
        .unwrap();
        let graph = PathGraphBuilder::build(&topology);
        assert_eq!(ConnectivityChecker::node_connectivity(&graph, 0, 1), 0);
    }

    #[test]
    fn test_unknown_vertex_is_disconnected() {
        let graph = ring_of_three();
        assert_eq!(ConnectivityChecker::node_connectivity(&graph, 0, 99), 0);
    }

    #[test]
    fn test_requests_connectivity() {
        let graph = ring_of_three();
        let matrix = TrafficMatrix {
            requests: vec![TrafficRequest {
                source: 0,
                destination: 1,
                required_bandwidth: 0.0,
                required_latency: f64::INFINITY,
            }],
            request_id: "req-1".to_string(),
        };
        assert!(ConnectivityChecker::requests_connectivity(&graph, &matrix));

        let unreachable = TrafficMatrix {
            requests: vec![TrafficRequest {
                source: 0,
                destination: 42,
                required_bandwidth: 0.0,
                required_latency: f64::INFINITY,
            }],
            request_id: "req-2".to_string(),
        };
        assert!(!ConnectivityChecker::requests_connectivity(&graph, &unreachable));
    }
}
