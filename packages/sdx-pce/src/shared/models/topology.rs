//! Topology data model
//!
//! Typed form of the per-domain topology descriptions published by OXPs,
//! and of the merged super-topology derived from them. The wire shapes are
//! polymorphic in a few places (link port refs are either bare id strings
//! or inline objects, label ranges are ints, "a-b" strings or [a, b]
//! pairs); untagged enums absorb that here so the rest of the crate works
//! with one normalized form.

use serde::{Deserialize, Serialize};

use crate::errors::{PceError, Result};

/// Id prefix of SDX topology URNs, e.g. `urn:sdx:topology:amlight.net`.
pub const TOPOLOGY_ID_PREFIX: &str = "urn:sdx:topology:";

/// Id prefix of SDX port URNs, e.g. `urn:sdx:port:amlight.net:A1:1`.
pub const PORT_ID_PREFIX: &str = "urn:sdx:port:";

/// Id assigned to the merged super-topology.
pub const MERGED_TOPOLOGY_ID: &str = "urn:sdx:topology:sdx";

/// Version assigned to the super-topology when it is first created.
pub const INITIAL_VERSION: &str = "1.0";

fn initial_version() -> String {
    INITIAL_VERSION.to_string()
}

/// A single domain's topology, or the merged super-topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "initial_version")]
    pub version: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Topology {
    pub fn add_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes.extend(nodes);
    }

    pub fn add_links(&mut self, links: Vec<Link>) {
        self.links.extend(links);
    }

    pub fn remove_node(&mut self, node_id: &str) {
        self.nodes.retain(|node| node.id != node_id);
    }

    pub fn remove_link(&mut self, link_id: &str) {
        self.links.retain(|link| link.id != link_id);
    }

    pub fn has_node(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == node_id)
    }

    pub fn get_link(&self, link_id: &str) -> Option<&Link> {
        self.links.iter().find(|link| link.id == link_id)
    }

    pub fn get_link_mut(&mut self, link_id: &str) -> Option<&mut Link> {
        self.links.iter_mut().find(|link| link.id == link_id)
    }

    /// Find the node owning the given port.
    pub fn get_node_by_port(&self, port_id: &str) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| node.ports.iter().any(|port| port.id == port_id))
    }

    /// Find a port anywhere in the topology by its id.
    pub fn get_port_by_id(&self, port_id: &str) -> Option<&Port> {
        self.nodes
            .iter()
            .flat_map(|node| node.ports.iter())
            .find(|port| port.id == port_id)
    }

    /// Find the port pair of a link joining two nodes, oriented so that the
    /// first port belongs to `node_a`. Links whose endpoints do not resolve
    /// to known nodes are skipped.
    pub fn port_pair_between(&self, node_a: &str, node_b: &str) -> Option<(Port, Port)> {
        for link in &self.links {
            let ids: Vec<&str> = link.port_ids().collect();
            if ids.len() != 2 {
                continue;
            }
            let (Some(owner_0), Some(owner_1)) =
                (self.get_node_by_port(ids[0]), self.get_node_by_port(ids[1]))
            else {
                continue;
            };
            let (first, second) = if owner_0.id == node_a && owner_1.id == node_b {
                (ids[0], ids[1])
            } else if owner_0.id == node_b && owner_1.id == node_a {
                (ids[1], ids[0])
            } else {
                continue;
            };
            let (Some(p1), Some(p2)) = (self.get_port_by_id(first), self.get_port_by_id(second))
            else {
                continue;
            };
            return Some((p1.clone(), p2.clone()));
        }
        None
    }
}

/// A switching node inside one domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ports: Vec<Port>,
}

/// A node port. `nni` carries the remote port id when this port faces
/// another domain; a UNI (user-facing) port leaves it unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    /// Speed class (100FE, 1GE, 10GE, ..., Other).
    #[serde(default, rename = "type")]
    pub port_type: Option<String>,
    #[serde(default)]
    pub nni: Option<String>,
    #[serde(default)]
    pub vlan_range: Option<Vec<LabelSpec>>,
    #[serde(default)]
    pub services: Option<PortServices>,
}

impl Port {
    /// The declared remote port id, if this is an NNI port.
    pub fn remote_port(&self) -> Option<&str> {
        self.nni.as_deref().filter(|id| !id.is_empty())
    }

    /// Display name falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// The advertised VLAN label range: the v2 per-service range wins over
    /// the v1 port-level range. `None` means the port advertises nothing.
    pub fn label_specs(&self) -> Option<&[LabelSpec]> {
        if let Some(range) = self
            .services
            .as_ref()
            .and_then(|services| services.l2vpn_ptp.as_ref())
            .and_then(|l2vpn| l2vpn.vlan_range.as_deref())
        {
            return Some(range);
        }
        self.vlan_range.as_deref()
    }

    /// Parse the advertised label range into normalized inclusive ranges.
    /// Returns `Ok(None)` when nothing is advertised; malformed entries are
    /// validation errors.
    pub fn label_ranges(&self) -> Result<Option<Vec<LabelRange>>> {
        match self.label_specs() {
            None => Ok(None),
            Some(specs) => specs
                .iter()
                .map(LabelRange::from_spec)
                .collect::<Result<Vec<_>>>()
                .map(Some),
        }
    }
}

/// Services advertised on a port (topology spec 2.x).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortServices {
    #[serde(default)]
    pub l2vpn_ptp: Option<L2vpnPtpService>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct L2vpnPtpService {
    #[serde(default)]
    pub vlan_range: Option<Vec<LabelSpec>>,
}

/// One entry of an advertised VLAN range, as found on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelSpec {
    /// A bare tag number, e.g. `300`
    Single(u16),
    /// A string range, e.g. `"100-200"` (or a bare `"300"`)
    Range(String),
    /// A two-element list range, e.g. `[100, 200]`
    Pair((u16, u16)),
}

/// Normalized inclusive VLAN label range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelRange {
    pub start: u16,
    pub end: u16,
}

impl LabelRange {
    /// Normalize one wire-shape entry. Zero or inverted ranges are
    /// rejected here, at ingest, so they can never surface at use time.
    pub fn from_spec(spec: &LabelSpec) -> Result<Self> {
        let (start, end) = match spec {
            LabelSpec::Single(tag) => (*tag, *tag),
            LabelSpec::Pair((start, end)) => (*start, *end),
            LabelSpec::Range(text) => {
                let mut parts = text.split('-');
                let first = parts.next().unwrap_or("");
                let last = parts.next_back().unwrap_or(first);
                let parse = |part: &str| {
                    part.trim().parse::<u16>().map_err(|_| {
                        PceError::validation(format!("invalid label range: {text:?}"))
                    })
                };
                (parse(first)?, parse(last)?)
            }
        };
        if start == 0 || end == 0 || start > end {
            return Err(PceError::validation(format!(
                "invalid label range: {start}-{end}"
            )));
        }
        Ok(LabelRange { start, end })
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

/// A reference to a port from a link: either a bare id or an inline object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortRef {
    Id(String),
    Inline(Port),
}

impl PortRef {
    pub fn id(&self) -> &str {
        match self {
            PortRef::Id(id) => id,
            PortRef::Inline(port) => &port.id,
        }
    }
}

/// An intra-domain link, or a synthesized inter-domain link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub ports: Vec<PortRef>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub bandwidth: Option<f64>,
    #[serde(default)]
    pub residual_bandwidth: Option<f64>,
    #[serde(default)]
    pub latency: Option<f64>,
    #[serde(default)]
    pub packet_loss: Option<f64>,
    #[serde(default)]
    pub availability: Option<f64>,
}

impl Link {
    pub fn port_ids(&self) -> impl Iterator<Item = &str> {
        self.ports.iter().map(PortRef::id)
    }

    /// A link participates in routing only when up and enabled; unset
    /// fields are treated as healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.as_deref(), Some("up") | None)
            && matches!(self.state.as_deref(), Some("enabled") | None)
    }
}

/// A link excluded from routing, as reported by `get_failed_links`.
#[derive(Debug, Clone, Serialize)]
pub struct FailedLink {
    pub id: String,
    pub ports: Vec<String>,
}
