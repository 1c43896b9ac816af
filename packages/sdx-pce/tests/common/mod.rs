//! Shared fixtures for integration tests
//!
//! Two small OXP domain topologies, amlight and sax, joined by one
//! reciprocal NNI port pair (amlight A2:50 <-> sax S1:50). Both carry a
//! user-facing UNI with VLAN range 100-300 (amlight A1:40, sax S2:40).

#![allow(dead_code)]

use serde_json::{json, Value};

pub const AMLIGHT: &str = "urn:sdx:topology:amlight.net";
pub const SAX: &str = "urn:sdx:topology:sax.net";

pub const AMLIGHT_UNI: &str = "urn:sdx:port:amlight.net:A1:40";
pub const AMLIGHT_NNI: &str = "urn:sdx:port:amlight.net:A2:50";
pub const SAX_NNI: &str = "urn:sdx:port:sax.net:S1:50";
pub const SAX_UNI: &str = "urn:sdx:port:sax.net:S2:40";

pub const AMLIGHT_INTRA_LINK: &str = "urn:sdx:link:amlight.net:A1/1_A2/1";
pub const SAX_INTRA_LINK: &str = "urn:sdx:link:sax.net:S1/1_S2/1";
pub const INTERDOMAIN_LINK: &str =
    "urn:sdx:link:interdomain:amlight.net:A2:50:sax.net:S1:50";

fn port(id: &str) -> Value {
    json!({
        "id": id,
        "status": "up",
        "state": "enabled",
        "type": "10GE",
        "vlan_range": ["100-300"],
    })
}

fn nni_port(id: &str, remote: &str) -> Value {
    let mut port = port(id);
    port["nni"] = json!(remote);
    port
}

pub fn amlight() -> Value {
    json!({
        "id": AMLIGHT,
        "name": "AmLight-OXP",
        "version": "1.0",
        "nodes": [
            {"id": "urn:sdx:node:amlight.net:A1",
             "ports": [port("urn:sdx:port:amlight.net:A1:1"), port(AMLIGHT_UNI)]},
            {"id": "urn:sdx:node:amlight.net:A2",
             "ports": [port("urn:sdx:port:amlight.net:A2:1"),
                       nni_port(AMLIGHT_NNI, SAX_NNI)]},
        ],
        "links": [
            {"id": AMLIGHT_INTRA_LINK,
             "ports": ["urn:sdx:port:amlight.net:A1:1", "urn:sdx:port:amlight.net:A2:1"],
             "status": "up", "state": "enabled",
             "bandwidth": 100.0, "residual_bandwidth": 100.0,
             "latency": 2.0, "packet_loss": 0.0, "availability": 100.0},
        ],
    })
}

pub fn sax() -> Value {
    json!({
        "id": SAX,
        "name": "SAX-OXP",
        "version": "1.0",
        "nodes": [
            {"id": "urn:sdx:node:sax.net:S1",
             "ports": [port("urn:sdx:port:sax.net:S1:1"),
                       nni_port(SAX_NNI, AMLIGHT_NNI)]},
            {"id": "urn:sdx:node:sax.net:S2",
             "ports": [port("urn:sdx:port:sax.net:S2:1"), port(SAX_UNI)]},
        ],
        "links": [
            {"id": SAX_INTRA_LINK,
             "ports": ["urn:sdx:port:sax.net:S1:1", "urn:sdx:port:sax.net:S2:1"],
             "status": "up", "state": "enabled",
             "bandwidth": 100.0, "residual_bandwidth": 100.0,
             "latency": 3.0, "packet_loss": 0.0, "availability": 100.0},
        ],
    })
}

pub fn connection_request(id: &str, ingress_vlan: Option<u16>, egress_vlan: Option<u16>) -> Value {
    let mut request = json!({
        "id": id,
        "ingress_port": {"id": AMLIGHT_UNI},
        "egress_port": {"id": SAX_UNI},
        "bandwidth_required": 10.0,
    });
    if let Some(tag) = ingress_vlan {
        request["ingress_port"]["vlan_range"] = json!(tag);
    }
    if let Some(tag) = egress_vlan {
        request["egress_port"]["vlan_range"] = json!(tag);
    }
    request
}
