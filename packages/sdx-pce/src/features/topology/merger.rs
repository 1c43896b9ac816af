//! Topology merger
//!
//! Owns the per-domain topology map and the merged super-topology, and
//! keeps the port→link / port→port indices that the rest of the engine
//! resolves against. Inter-domain links are discovered two ways:
//!
//! - legacy: the same port id appears in two domains' link lists, in which
//!   case the older (now superseded) link is dropped from the merge;
//! - spec 2.x: a port's `nni` names a remote port whose domain component
//!   differs from the advertising topology's.
//!
//! Either way a link `interdomain:{low}:{high}` is synthesized once both
//! ends are known and reciprocal. Multi-domain state is expected to be
//! transiently inconsistent, so a missing or non-reciprocal remote is a
//! warning and a skip, never an error.

use ahash::AHashMap;
use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::errors::{PceError, Result};
use crate::shared::models::{
    FailedLink, Link, Node, Port, PortRef, Topology, INITIAL_VERSION, MERGED_TOPOLOGY_ID,
    PORT_ID_PREFIX, TOPOLOGY_ID_PREFIX,
};

use super::version::{new_version, VersionBump};

/// Id prefix of synthesized inter-domain links.
pub const INTERDOMAIN_LINK_ID_PREFIX: &str = "urn:sdx:link:interdomain:";

/// A single typed property change on a link, fed in by whoever monitors
/// the physical network.
#[derive(Debug, Clone)]
pub enum LinkProperty {
    Status(String),
    State(String),
    Bandwidth(f64),
    ResidualBandwidth(f64),
    Latency(f64),
    PacketLoss(f64),
    Availability(f64),
}

/// Merges per-domain topologies into one super-topology with discovered
/// inter-domain links.
#[derive(Debug, Default)]
pub struct TopologyMerger {
    /// The merged super-topology. Created on the first ingest and only
    /// ever patched afterwards, so its identity survives for long-lived
    /// inter-domain computations.
    topology: Option<Topology>,

    /// Domain topology id → topology, as last ingested.
    topology_map: HashMap<String, Topology>,

    /// Port id → port, across all ingested domains.
    port_map: AHashMap<String, Port>,

    /// Port id → owning link id. A port absent from this index is a UNI.
    port_link_map: AHashMap<String, String>,

    /// Number of inter-domain ports discovered so far.
    interdomain_port_count: usize,
}

impl TopologyMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topology(&self) -> Option<&Topology> {
        self.topology.as_ref()
    }

    pub fn topology_map(&self) -> &HashMap<String, Topology> {
        &self.topology_map
    }

    pub fn port_map(&self) -> &AHashMap<String, Port> {
        &self.port_map
    }

    pub fn port_link_map(&self) -> &AHashMap<String, String> {
        &self.port_link_map
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Ingest a new domain topology. The first ingest seeds the
    /// super-topology; later ones are appended with inter-domain
    /// discovery and a minor version bump.
    pub fn add_topology(&mut self, topology: Topology) {
        self.topology_map
            .insert(topology.id.clone(), topology.clone());

        let interdomain_ports = if self.topology.is_none() {
            let mut merged = topology.clone();
            merged.id = MERGED_TOPOLOGY_ID.to_string();
            merged.version = INITIAL_VERSION.to_string();
            self.topology = Some(merged);
            Vec::new()
        } else {
            let ports = self.inter_domain_check(&topology);
            self.interdomain_port_count += ports.len();
            if self.interdomain_port_count == 0 {
                debug!("no interdomain links detected in {}", topology.id);
            }
            if let Some(merged) = self.topology.as_mut() {
                merged.add_nodes(topology.nodes.clone());
                merged.add_links(topology.links.clone());
            }
            self.bump_version(VersionBump::Minor);
            ports
        };

        self.index_domain(&topology);
        self.synthesize_interdomain_links(&interdomain_ports);
        self.touch_timestamp();
    }

    /// Re-ingest a domain: its previously merged nodes and intra-domain
    /// links are dropped and replaced, inter-domain links are
    /// resynthesized, and the major version component is bumped.
    pub fn update_topology(&mut self, topology: Topology) -> Result<()> {
        if self.topology.is_none() {
            return Err(PceError::not_found(
                "no merged topology exists yet; add a topology first",
            ));
        }

        self.topology_map
            .insert(topology.id.clone(), topology.clone());

        // Interdomain links survive the re-ingest; everything else owned
        // by this domain is removed before re-adding.
        let intra_links: Vec<Link> = topology
            .links
            .iter()
            .filter(|link| !self.is_link_interdomain(link))
            .cloned()
            .collect();
        if let Some(merged) = self.topology.as_mut() {
            for node in &topology.nodes {
                merged.remove_node(&node.id);
            }
            for link in &intra_links {
                merged.remove_link(&link.id);
            }
        }
        for link in &intra_links {
            for port_id in link.port_ids() {
                self.port_link_map.remove(port_id);
            }
        }

        let interdomain_ports = self.inter_domain_check(&topology);
        if interdomain_ports.is_empty() {
            warn!("no interdomain links detected in {}", topology.id);
        }

        if let Some(merged) = self.topology.as_mut() {
            merged.add_nodes(topology.nodes.clone());
            merged.add_links(topology.links.clone());
        }

        self.index_domain(&topology);
        self.synthesize_interdomain_links(&interdomain_ports);
        self.bump_version(VersionBump::Major);
        self.touch_timestamp();
        Ok(())
    }

    /// Forget a domain. The super-topology keeps whatever was merged; only
    /// the domain map entry goes away.
    pub fn remove_topology(&mut self, topology_id: &str) {
        self.topology_map.remove(topology_id);
        self.bump_version(VersionBump::Minor);
        self.touch_timestamp();
    }

    /// Find the domain (topology id) owning a node.
    pub fn get_domain_name(&self, node_id: &str) -> Option<&str> {
        self.topology_map
            .iter()
            .find(|(_, topology)| topology.has_node(node_id))
            .map(|(topology_id, _)| topology_id.as_str())
    }

    /// Find a port in the merged topology.
    pub fn get_port_by_id(&self, port_id: &str) -> Option<&Port> {
        self.topology.as_ref()?.get_port_by_id(port_id)
    }

    /// Whether two ports resolve to nodes of the same domain.
    pub fn are_ports_same_domain(&self, port_a: &str, port_b: &str) -> bool {
        let Some(merged) = self.topology.as_ref() else {
            return false;
        };
        let (Some(node_a), Some(node_b)) =
            (merged.get_node_by_port(port_a), merged.get_node_by_port(port_b))
        else {
            return false;
        };
        match (
            self.get_domain_name(&node_a.id),
            self.get_domain_name(&node_b.id),
        ) {
            (Some(domain_a), Some(domain_b)) => domain_a == domain_b,
            _ => false,
        }
    }

    /// Links excluded from routing (not up and enabled).
    pub fn get_failed_links(&self) -> Vec<FailedLink> {
        let Some(merged) = self.topology.as_ref() else {
            return Vec::new();
        };
        merged
            .links
            .iter()
            .filter(|link| !link.is_healthy())
            .map(|link| FailedLink {
                id: link.id.clone(),
                ports: link.port_ids().map(str::to_string).collect(),
            })
            .collect()
    }

    /// Apply a monitored property change to a link, in the owning domain
    /// copy and in the super-topology. Bumps the minor version.
    pub fn update_link_property(&mut self, link_id: &str, property: &LinkProperty) {
        for topology in self.topology_map.values_mut() {
            if let Some(link) = topology.get_link_mut(link_id) {
                apply_link_property(link, property);
            }
        }
        if let Some(link) = self
            .topology
            .as_mut()
            .and_then(|merged| merged.get_link_mut(link_id))
        {
            apply_link_property(link, property);
        }
        self.bump_version(VersionBump::Minor);
        self.touch_timestamp();
    }

    /// A link is inter-domain when any of its ports is untracked in the
    /// port→link index.
    fn is_link_interdomain(&self, link: &Link) -> bool {
        link.port_ids()
            .any(|port_id| !self.port_link_map.contains_key(port_id))
    }

    /// Whether a port id (in `urn:sdx:port:domain:node:port` form) names a
    /// domain other than the advertising topology's.
    fn is_interdomain_port(port_id: &str, topology_id: &str) -> bool {
        if !port_id.starts_with(PORT_ID_PREFIX) || !topology_id.starts_with(TOPOLOGY_ID_PREFIX) {
            return false;
        }
        match (port_id.split(':').nth(3), topology_id.split(':').nth(3)) {
            (Some(port_domain), Some(topology_domain)) => port_domain != topology_domain,
            _ => false,
        }
    }

    /// Detect inter-domain ports of an incoming topology against the
    /// existing index, dropping stale legacy links on port-id collision,
    /// and fold the incoming link ports into the index.
    fn inter_domain_check(&mut self, topology: &Topology) -> Vec<Port> {
        let mut collided: Vec<String> = Vec::new();

        // Collisions are judged against the index as it stood before this
        // ingest; a port shared by two of the incoming domain's own links
        // is not a cross-ingest collision.
        for link in &topology.links {
            for port_id in link.port_ids() {
                if let Some(stale_link_id) = self.port_link_map.get(port_id).cloned() {
                    // The port was already claimed by a link from another
                    // ingest: that link is superseded by this one.
                    if let Some(merged) = self.topology.as_mut() {
                        merged.remove_link(&stale_link_id);
                    }
                    collided.push(port_id.to_string());
                }
            }
        }
        for link in &topology.links {
            for port_id in link.port_ids() {
                self.port_link_map
                    .insert(port_id.to_string(), link.id.clone());
            }
        }

        let mut interdomain_ports = Vec::new();
        for node in &topology.nodes {
            for port in &node.ports {
                if collided.iter().any(|port_id| *port_id == port.id) {
                    interdomain_ports.push(port.clone());
                } else if port
                    .remote_port()
                    .is_some_and(|remote| Self::is_interdomain_port(remote, &topology.id))
                {
                    interdomain_ports.push(port.clone());
                }
            }
        }
        interdomain_ports
    }

    /// Refresh the port→link and port→port indices from a domain.
    fn index_domain(&mut self, topology: &Topology) {
        for link in &topology.links {
            for port_id in link.port_ids() {
                self.port_link_map
                    .insert(port_id.to_string(), link.id.clone());
            }
        }
        for node in &topology.nodes {
            for port in &node.ports {
                self.port_map.insert(port.id.clone(), port.clone());
            }
        }
    }

    /// Synthesize or update one inter-domain link per discovered port
    /// whose declared remote is known and reciprocal.
    fn synthesize_interdomain_links(&mut self, interdomain_ports: &[Port]) {
        for port in interdomain_ports {
            let Some(remote_id) = port.remote_port() else {
                warn!("interdomain port {} declares no remote port", port.id);
                continue;
            };
            let Some(remote) = self.port_map.get(remote_id).cloned() else {
                warn!(
                    "interdomain link not added yet: remote port {} of {} unknown",
                    remote_id, port.id
                );
                continue;
            };
            if remote.remote_port() != Some(port.id.as_str()) {
                warn!(
                    "interdomain link not added: {} and {} are not reciprocal",
                    port.id, remote.id
                );
                continue;
            }
            self.create_update_interdomain_link(port, &remote);
        }
    }

    /// Create-or-update the single link joining two reciprocal NNI ports.
    fn create_update_interdomain_link(&mut self, port_a: &Port, port_b: &Port) {
        let (low, high) = if port_b.id < port_a.id {
            (port_b, port_a)
        } else {
            (port_a, port_b)
        };

        let link_id = format!(
            "{}{}:{}",
            INTERDOMAIN_LINK_ID_PREFIX,
            low.id.strip_prefix(PORT_ID_PREFIX).unwrap_or(&low.id),
            high.id.strip_prefix(PORT_ID_PREFIX).unwrap_or(&high.id),
        );

        let Some(merged) = self.topology.as_mut() else {
            return;
        };

        if merged.get_link(&link_id).is_none() {
            let bandwidth = f64::min(
                speed_class_bandwidth(low.port_type.as_deref()),
                speed_class_bandwidth(high.port_type.as_deref()),
            );
            merged.add_links(vec![Link {
                id: link_id.clone(),
                name: Some(format!("{}--{}", low.display_name(), high.display_name())),
                ports: vec![PortRef::Id(low.id.clone()), PortRef::Id(high.id.clone())],
                status: None,
                state: None,
                bandwidth: Some(bandwidth),
                residual_bandwidth: Some(100.0),
                latency: Some(0.0),
                packet_loss: Some(0.0),
                availability: Some(100.0),
            }]);
        }

        if let Some(link) = merged.get_link_mut(&link_id) {
            link.status = Some(derive_status(low, high).to_string());
            link.state = Some(derive_state(low, high).to_string());
        }
    }

    fn bump_version(&mut self, bump: VersionBump) {
        if let Some(merged) = self.topology.as_mut() {
            merged.version = new_version(&merged.version, bump);
        }
    }

    fn touch_timestamp(&mut self) {
        if let Some(merged) = self.topology.as_mut() {
            merged.timestamp = Utc::now().to_rfc3339();
        }
    }
}

/// Combined status of an inter-domain link: up only when both ends are up;
/// an explicit down wins over an error; anything incomplete is down.
fn derive_status(port_a: &Port, port_b: &Port) -> &'static str {
    let a = port_a.status.as_deref();
    let b = port_b.status.as_deref();
    match (a, b) {
        (Some("up"), Some("up")) => "up",
        _ if a == Some("down") || b == Some("down") => "down",
        _ if a == Some("error") || b == Some("error") => "error",
        _ => "down",
    }
}

/// Combined state: enabled only when both ends are enabled; maintenance on
/// either end puts the link in maintenance; anything else is disabled.
fn derive_state(port_a: &Port, port_b: &Port) -> &'static str {
    let a = port_a.state.as_deref();
    let b = port_b.state.as_deref();
    match (a, b) {
        (Some("enabled"), Some("enabled")) => "enabled",
        _ if a == Some("maintenance") || b == Some("maintenance") => "maintenance",
        _ => "disabled",
    }
}

/// Bandwidth guaranteed by a port speed class, in Gbps. "Other" guarantees
/// nothing; an unknown class defaults to 100.
fn speed_class_bandwidth(port_type: Option<&str>) -> f64 {
    match port_type {
        Some("100FE") => 0.1,
        Some("1GE") => 1.0,
        Some("10GE") => 10.0,
        Some("25GE") => 25.0,
        Some("40GE") => 40.0,
        Some("100GE") => 100.0,
        Some("400GE") => 400.0,
        Some("Other") => 0.0,
        _ => 100.0,
    }
}

fn apply_link_property(link: &mut Link, property: &LinkProperty) {
    match property {
        LinkProperty::Status(status) => link.status = Some(status.clone()),
        LinkProperty::State(state) => link.state = Some(state.clone()),
        LinkProperty::Bandwidth(value) => link.bandwidth = Some(*value),
        LinkProperty::ResidualBandwidth(value) => link.residual_bandwidth = Some(*value),
        LinkProperty::Latency(value) => link.latency = Some(*value),
        LinkProperty::PacketLoss(value) => link.packet_loss = Some(*value),
        LinkProperty::Availability(value) => link.availability = Some(*value),
    }
}
