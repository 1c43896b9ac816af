//! Routing graph construction
//!
//! Converts the merged super-topology into a weighted undirected graph for
//! the path solver. Vertices are nodes (dense `NodeIndex` values, with the
//! original node id kept as the vertex weight); edges are healthy links.
//! Edge weight grows as residual bandwidth shrinks, so congested links are
//! avoided: `weight = 1000 / residual_bandwidth`, with zero residual
//! special-cased to an infinite weight.

use ahash::AHashMap;
use petgraph::graph::{NodeIndex, UnGraph};
use tracing::warn;

use crate::shared::models::Topology;

/// Residual bandwidth assumed for links that do not advertise one.
const DEFAULT_RESIDUAL_BANDWIDTH: f64 = 100.0;

/// Metrics carried on every routing-graph edge.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkMetrics {
    pub link_id: String,
    pub weight: f64,
    pub bandwidth: f64,
    pub residual_bandwidth: f64,
    pub latency: f64,
    pub packet_loss: f64,
    pub availability: f64,
}

/// The routing graph: a petgraph undirected graph whose vertex weights are
/// the original node ids, plus the id→vertex index.
#[derive(Debug, Clone, Default)]
pub struct RoutingGraph {
    graph: UnGraph<String, LinkMetrics>,
    index_of: AHashMap<String, NodeIndex>,
}

impl RoutingGraph {
    pub fn graph(&self) -> &UnGraph<String, LinkMetrics> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Vertex of a node id.
    pub fn node_index(&self, node_id: &str) -> Option<NodeIndex> {
        self.index_of.get(node_id).copied()
    }

    /// Node id of a vertex, by its dense integer value.
    pub fn node_id(&self, vertex: usize) -> Option<&str> {
        self.graph
            .node_weight(NodeIndex::new(vertex))
            .map(String::as_str)
    }
}

/// Builds a [`RoutingGraph`] from a merged topology.
#[derive(Debug, Default)]
pub struct PathGraphBuilder;

impl PathGraphBuilder {
    pub fn build(topology: &Topology) -> RoutingGraph {
        let mut graph = UnGraph::default();
        let mut index_of = AHashMap::with_capacity(topology.nodes.len());

        for node in &topology.nodes {
            let index = graph.add_node(node.id.clone());
            index_of.insert(node.id.clone(), index);
        }

        for link in &topology.links {
            if !link.is_healthy() {
                continue;
            }

            let port_ids: Vec<&str> = link.port_ids().collect();
            if port_ids.len() != 2 {
                warn!("link {} does not join exactly two ports, skipped", link.id);
                continue;
            }

            // A port that resolves to no known node is the far side of a
            // stub toward a non-SDX peer; the link cannot be routed over.
            let endpoints: Option<Vec<NodeIndex>> = port_ids
                .iter()
                .map(|port_id| {
                    let node = topology.get_node_by_port(port_id);
                    if node.is_none() {
                        warn!(
                            "port {} on link {} belongs to no known node, \
                             likely a non-SDX stub; link skipped",
                            port_id, link.id
                        );
                    }
                    node.and_then(|node| index_of.get(node.id.as_str()).copied())
                })
                .collect();
            let Some(endpoints) = endpoints else {
                continue;
            };

            let residual = link
                .residual_bandwidth
                .unwrap_or(DEFAULT_RESIDUAL_BANDWIDTH);
            let weight = if residual <= 0.0 {
                f64::INFINITY
            } else {
                1000.0 / residual
            };

            graph.add_edge(
                endpoints[0],
                endpoints[1],
                LinkMetrics {
                    link_id: link.id.clone(),
                    weight,
                    bandwidth: link.bandwidth.unwrap_or(0.0),
                    residual_bandwidth: residual,
                    latency: link.latency.unwrap_or(0.0),
                    packet_loss: link.packet_loss.unwrap_or(0.0),
                    availability: link.availability.unwrap_or(0.0),
                },
            );
        }

        RoutingGraph { graph, index_of }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn two_node_topology(link: serde_json::Value) -> Topology {
        serde_json::from_value(json!({
            "id": "urn:sdx:topology:amlight.net",
            "nodes": [
                {"id": "urn:sdx:node:amlight.net:A1",
                 "ports": [{"id": "urn:sdx:port:amlight.net:A1:1"}]},
                {"id": "urn:sdx:node:amlight.net:B1",
                 "ports": [{"id": "urn:sdx:port:amlight.net:B1:1"}]},
            ],
            "links": [link],
        }))
        .unwrap()
    }

    #[test]
    fn test_weight_from_residual_bandwidth() {
        let topology = two_node_topology(json!({
            "id": "urn:sdx:link:amlight.net:A1/1_B1/1",
            "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:amlight.net:B1:1"],
            "residual_bandwidth": 50.0,
        }));
        let graph = PathGraphBuilder::build(&topology);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let metrics = graph.graph().edge_weights().next().unwrap();
        assert_eq!(metrics.weight, 20.0);
    }

    #[test]
    fn test_zero_residual_is_infinite_weight() {
        let topology = two_node_topology(json!({
            "id": "urn:sdx:link:amlight.net:A1/1_B1/1",
            "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:amlight.net:B1:1"],
            "residual_bandwidth": 0.0,
        }));
        let graph = PathGraphBuilder::build(&topology);
        let metrics = graph.graph().edge_weights().next().unwrap();
        assert!(metrics.weight.is_infinite());
    }

    #[test]
    fn test_unhealthy_link_skipped() {
        let topology = two_node_topology(json!({
            "id": "urn:sdx:link:amlight.net:A1/1_B1/1",
            "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:amlight.net:B1:1"],
            "status": "down",
        }));
        let graph = PathGraphBuilder::build(&topology);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_non_sdx_stub_skipped() {
        let topology = two_node_topology(json!({
            "id": "urn:sdx:link:amlight.net:A1/1_elsewhere",
            "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:elsewhere.net:X:9"],
        }));
        let graph = PathGraphBuilder::build(&topology);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_vertex_relabeling_is_dense() {
        let topology = two_node_topology(json!({
            "id": "urn:sdx:link:amlight.net:A1/1_B1/1",
            "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:amlight.net:B1:1"],
        }));
        let graph = PathGraphBuilder::build(&topology);
        let a = graph.node_index("urn:sdx:node:amlight.net:A1").unwrap();
        let b = graph.node_index("urn:sdx:node:amlight.net:B1").unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(graph.node_id(1), Some("urn:sdx:node:amlight.net:B1"));
    }
}
