//! Connection request, solver output and breakdown models
//!
//! The solver itself is an external collaborator: this crate produces its
//! inputs (a `TrafficMatrix` in graph-vertex terms) and consumes its output
//! (a `ConnectionSolution` of ordered per-domain edges).

use serde::{Deserialize, Serialize};

use super::topology::Port;
use crate::errors::{PceError, Result};

/// An endpoint of a point-to-point L2VPN request. `vlan_range` here is the
/// user's explicit tag request for that endpoint, when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPort {
    pub id: String,
    #[serde(default)]
    pub vlan_range: Option<TagSpec>,
}

impl RequestPort {
    /// The explicitly requested tag, normalized. Malformed specs are
    /// validation errors.
    pub fn requested_tag(&self) -> Result<Option<u16>> {
        match &self.vlan_range {
            None => Ok(None),
            Some(spec) => spec.parse().map(Some),
        }
    }
}

/// A user-requested VLAN tag: a bare number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagSpec {
    Tag(u16),
    Text(String),
}

impl TagSpec {
    pub fn parse(&self) -> Result<u16> {
        let tag = match self {
            TagSpec::Tag(tag) => *tag,
            TagSpec::Text(text) => text.trim().parse::<u16>().map_err(|_| {
                PceError::validation(format!("invalid VLAN spec: {text:?}"))
            })?,
        };
        if tag == 0 {
            return Err(PceError::validation("invalid VLAN spec: 0"));
        }
        Ok(tag)
    }
}

/// A raw point-to-point connection request, as handed in by the API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRequest {
    pub id: String,
    pub ingress_port: RequestPort,
    pub egress_port: RequestPort,
    #[serde(default)]
    pub bandwidth_required: Option<f64>,
    #[serde(default)]
    pub latency_required: Option<f64>,
}

/// One request in graph-vertex terms, ready for the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRequest {
    pub source: usize,
    pub destination: usize,
    pub required_bandwidth: f64,
    pub required_latency: f64,
}

/// Requests normalized into graph-vertex terms, plus the originating
/// request id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficMatrix {
    pub requests: Vec<TrafficRequest>,
    pub request_id: String,
}

/// One solved edge: a pair of graph-vertex ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPath {
    pub source: usize,
    pub destination: usize,
}

/// The solver's edges for one domain, in path order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainPaths {
    pub domain: String,
    pub paths: Vec<ConnectionPath>,
}

/// Solver output. `connection_map` is an explicitly ordered sequence: the
/// concatenation of its `paths` is the end-to-end path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionSolution {
    pub request_id: String,
    pub connection_map: Vec<DomainPaths>,
}

/// The shape of the request a breakdown is generated for. The pre-split
/// form carries no user-facing endpoint ports, so UNI substitution and
/// explicit-tag handling only apply to the point-to-point form.
#[derive(Debug, Clone)]
pub enum BreakdownRequest {
    PointToPoint(ConnectionRequest),
    PerDomain(Vec<TrafficMatrix>),
}

/// One contiguous per-domain segment of a decomposed path, with resolved
/// ingress/egress ports.
#[derive(Debug, Clone)]
pub struct DomainSegment {
    pub domain: String,
    pub ingress: Port,
    pub egress: Port,
}

/// A user-facing endpoint that was substituted into a segment, carrying
/// the explicitly requested tag if any.
#[derive(Debug, Clone)]
pub struct UserPort {
    pub port_id: String,
    pub tag: Option<u16>,
}

/// Decomposer output: ordered per-domain segments plus the user-facing
/// endpoints that were substituted at the two ends.
#[derive(Debug, Clone)]
pub struct DomainBreakdown {
    pub segments: Vec<DomainSegment>,
    pub ingress_user_port: Option<UserPort>,
    pub egress_user_port: Option<UserPort>,
}

/// A reserved VLAN tag. Tag type 1 denotes a plain IEEE 802.1Q tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanTag {
    pub value: u16,
    pub tag_type: u8,
}

impl VlanTag {
    pub fn new(value: u16) -> Self {
        VlanTag { value, tag_type: 1 }
    }
}

/// A port with its reserved tag, as delivered southbound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanTaggedPort {
    pub port_id: String,
    pub tag: VlanTag,
}

/// One domain's share of a connection, ready for southbound delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanTaggedBreakdown {
    pub name: String,
    pub dynamic_backup_path: bool,
    pub uni_a: VlanTaggedPort,
    pub uni_z: VlanTaggedPort,
}

/// The whole per-domain breakdown, in path order.
#[derive(Debug, Clone, Default)]
pub struct VlanTaggedBreakdowns {
    pub breakdowns: Vec<(String, VlanTaggedBreakdown)>,
}

impl VlanTaggedBreakdowns {
    pub fn get(&self, domain: &str) -> Option<&VlanTaggedBreakdown> {
        self.breakdowns
            .iter()
            .find(|(entry_domain, _)| entry_domain == domain)
            .map(|(_, breakdown)| breakdown)
    }
}

/// A path hop as a pair of port ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortPair {
    pub source: String,
    pub destination: String,
}
