//! End-to-end connection flow
//!
//! Merge two domains, normalize a connection request into a traffic
//! matrix, decompose a solved path into per-domain segments, and reserve
//! VLAN tags, all through the `TeManager` façade. The solver itself is
//! out of scope, so solved paths are written out by hand: with four
//! vertices in ingest order (A1=0, A2=1, S1=2, S2=3) the end-to-end path
//! is 0-1, 1-2, 2-3.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use sdx_pce::shared::models::{
    BreakdownRequest, ConnectionPath, ConnectionRequest, ConnectionSolution, DomainPaths,
};
use sdx_pce::{PathBreakdownDecomposer, PceError, TeManager, TopologyManager};

fn manager() -> TeManager {
    let manager = TeManager::new();
    manager.add_topology(amlight()).unwrap();
    manager.add_topology(sax()).unwrap();
    manager
}

fn solved_path(request_id: &str) -> ConnectionSolution {
    ConnectionSolution {
        request_id: request_id.to_string(),
        connection_map: vec![DomainPaths {
            domain: AMLIGHT.to_string(),
            paths: vec![
                ConnectionPath { source: 0, destination: 1 },
                ConnectionPath { source: 1, destination: 2 },
                ConnectionPath { source: 2, destination: 3 },
            ],
        }],
    }
}

fn breakdown_request(id: &str, ingress_vlan: Option<u16>, egress_vlan: Option<u16>) -> BreakdownRequest {
    let request: ConnectionRequest =
        serde_json::from_value(connection_request(id, ingress_vlan, egress_vlan)).unwrap();
    BreakdownRequest::PointToPoint(request)
}

#[test]
fn test_traffic_matrix_from_request() {
    let manager = manager();
    let matrix = manager
        .generate_traffic_matrix(connection_request("req-1", None, None))
        .unwrap();

    assert_eq!(matrix.request_id, "req-1");
    let request = &matrix.requests[0];
    assert_eq!(request.source, 0);
    assert_eq!(request.destination, 3);
    assert_eq!(request.required_bandwidth, 10.0);
    assert!(manager.requests_connectivity(&matrix).unwrap());
}

#[test]
fn test_traffic_matrix_unknown_port() {
    let manager = manager();
    let mut payload = connection_request("req-1", None, None);
    payload["ingress_port"]["id"] = serde_json::json!("urn:sdx:port:tenet.ac.za:T1:1");
    assert!(matches!(
        manager.generate_traffic_matrix(payload),
        Err(PceError::NotFound(_))
    ));
}

#[test]
fn test_chain_connectivity_is_one() {
    let manager = manager();
    assert_eq!(manager.graph_node_connectivity(0, 3).unwrap(), 1);
    // unknown vertex
    assert_eq!(manager.graph_node_connectivity(0, 17).unwrap(), 0);
}

#[test]
fn test_breakdown_with_explicit_vlans() {
    let manager = manager();
    let solution = solved_path("req-1");
    let request = breakdown_request("req-1", Some(100), Some(150));

    let tagged = manager
        .generate_connection_breakdown(&solution, &request)
        .unwrap();

    assert_eq!(tagged.breakdowns.len(), 2);
    // segment order follows the path: amlight first, sax second
    assert_eq!(tagged.breakdowns[0].0, AMLIGHT);
    assert_eq!(tagged.breakdowns[1].0, SAX);

    let amlight_segment = tagged.get(AMLIGHT).unwrap();
    assert_eq!(amlight_segment.uni_a.port_id, AMLIGHT_UNI);
    assert_eq!(amlight_segment.uni_a.tag.value, 100);
    assert_eq!(amlight_segment.uni_a.tag.tag_type, 1);
    assert_eq!(amlight_segment.uni_z.port_id, AMLIGHT_NNI);
    assert!(amlight_segment.dynamic_backup_path);
    assert!(amlight_segment.name.starts_with("AMLIGHT_vlan_100_"));

    let sax_segment = tagged.get(SAX).unwrap();
    assert_eq!(sax_segment.uni_a.port_id, SAX_NNI);
    assert_eq!(sax_segment.uni_z.port_id, SAX_UNI);
    assert_eq!(sax_segment.uni_z.tag.value, 150);
}

#[test]
fn test_breakdown_without_explicit_vlans_picks_smallest() {
    let manager = manager();
    let tagged = manager
        .generate_connection_breakdown(&solved_path("req-1"), &breakdown_request("req-1", None, None))
        .unwrap();

    // every port's table starts at 100, and this is the first reservation
    let amlight_segment = tagged.get(AMLIGHT).unwrap();
    assert_eq!(amlight_segment.uni_a.tag.value, 100);
    assert_eq!(amlight_segment.uni_z.tag.value, 100);
}

#[test]
fn test_held_tag_rejects_second_request() {
    let manager = manager();
    manager
        .generate_connection_breakdown(&solved_path("req-1"), &breakdown_request("req-1", Some(100), None))
        .unwrap();

    // req-2 wants the same explicit tag on the same ingress UNI
    let result = manager.generate_connection_breakdown(
        &solved_path("req-2"),
        &breakdown_request("req-2", Some(100), None),
    );
    assert!(matches!(result, Err(PceError::VlanUnavailable(_))));

    // req-1's reservation is untouched: releasing it frees the tag again
    manager.unreserve_vlan("req-2");
    manager.unreserve_vlan("req-1");
    let retry = manager.generate_connection_breakdown(
        &solved_path("req-2"),
        &breakdown_request("req-2", Some(100), None),
    );
    assert_eq!(retry.unwrap().get(AMLIGHT).unwrap().uni_a.tag.value, 100);
}

#[test]
fn test_links_on_path() {
    let manager = manager();
    let pairs = manager.links_on_path(&solved_path("req-1")).unwrap();

    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs[0].source, "urn:sdx:port:amlight.net:A1:1");
    assert_eq!(pairs[0].destination, "urn:sdx:port:amlight.net:A2:1");
    assert_eq!(pairs[1].source, AMLIGHT_NNI);
    assert_eq!(pairs[1].destination, SAX_NNI);
    assert_eq!(pairs[2].source, "urn:sdx:port:sax.net:S1:1");
    assert_eq!(pairs[2].destination, "urn:sdx:port:sax.net:S2:1");
}

#[test]
fn test_noncontiguous_connection_map_keeps_domains_apart() {
    // a solver may hand in per-domain edge lists with the crossing edge
    // omitted; the second domain's edges must not be folded into the
    // first domain's run
    let mut topology = TopologyManager::new();
    topology.add_topology(amlight()).unwrap();
    topology.add_topology(sax()).unwrap();
    let graph = topology.generate_graph().unwrap();
    let decomposer = PathBreakdownDecomposer::new(topology.merger(), &graph);

    let solution = ConnectionSolution {
        request_id: "req-1".to_string(),
        connection_map: vec![
            DomainPaths {
                domain: AMLIGHT.to_string(),
                paths: vec![ConnectionPath { source: 0, destination: 1 }],
            },
            DomainPaths {
                domain: SAX.to_string(),
                paths: vec![ConnectionPath { source: 2, destination: 3 }],
            },
        ],
    };

    let breakdown = decomposer
        .decompose(&solution, &BreakdownRequest::PerDomain(vec![]))
        .unwrap();
    let domains: Vec<&str> = breakdown
        .segments
        .iter()
        .map(|segment| segment.domain.as_str())
        .collect();
    assert_eq!(domains, vec![AMLIGHT, SAX]);
}

#[test]
fn test_breakdown_same_domain_request() {
    let manager = manager();
    // both UNIs inside amlight: A1:40 to A2's access port via the intra link
    let request: ConnectionRequest = serde_json::from_value(serde_json::json!({
        "id": "req-1",
        "ingress_port": {"id": AMLIGHT_UNI},
        "egress_port": {"id": "urn:sdx:port:amlight.net:A2:1"},
    }))
    .unwrap();
    let solution = ConnectionSolution {
        request_id: "req-1".to_string(),
        connection_map: vec![DomainPaths {
            domain: AMLIGHT.to_string(),
            paths: vec![ConnectionPath { source: 0, destination: 1 }],
        }],
    };

    let tagged = manager
        .generate_connection_breakdown(&solution, &BreakdownRequest::PointToPoint(request))
        .unwrap();
    assert_eq!(tagged.breakdowns.len(), 1);
    let segment = tagged.get(AMLIGHT).unwrap();
    assert_eq!(segment.uni_a.port_id, AMLIGHT_UNI);
}
