//! Topology ingest façade
//!
//! Owns the merger and fronts it with JSON entry points: ingest payloads
//! arrive as `serde_json::Value` from the API layer, are deserialized into
//! the typed model and validated before any state is touched.

use serde_json::Value;
use tracing::info;

use crate::errors::{PceError, Result};
use crate::features::path_graph::{PathGraphBuilder, RoutingGraph};
use crate::features::topology::{LinkProperty, TopologyMerger};
use crate::shared::models::{FailedLink, Topology};

#[derive(Debug, Default)]
pub struct TopologyManager {
    merger: TopologyMerger,
}

impl TopologyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merger(&self) -> &TopologyMerger {
        &self.merger
    }

    /// Ingest a new domain topology from its JSON payload. Returns the
    /// domain topology id. Nothing is mutated if the payload fails to
    /// parse or declares a malformed VLAN range.
    pub fn add_topology(&mut self, payload: Value) -> Result<String> {
        let topology: Topology = serde_json::from_value(payload)?;
        validate_label_ranges(&topology)?;
        let domain = topology.id.clone();
        info!("adding topology {domain}");
        self.merger.add_topology(topology);
        Ok(domain)
    }

    /// Re-ingest a changed domain topology (major version bump). Returns
    /// the domain topology id.
    pub fn update_topology(&mut self, payload: Value) -> Result<String> {
        let topology: Topology = serde_json::from_value(payload)?;
        validate_label_ranges(&topology)?;
        let domain = topology.id.clone();
        info!("updating topology {domain}");
        self.merger.update_topology(topology)?;
        Ok(domain)
    }

    pub fn remove_topology(&mut self, topology_id: &str) {
        info!("removing topology {topology_id}");
        self.merger.remove_topology(topology_id);
    }

    /// The merged super-topology, if any domain has been ingested.
    pub fn get_topology(&self) -> Option<&Topology> {
        self.merger.topology()
    }

    /// A domain topology as last ingested.
    pub fn domain_topology(&self, topology_id: &str) -> Option<&Topology> {
        self.merger.topology_map().get(topology_id)
    }

    pub fn get_failed_links(&self) -> Vec<FailedLink> {
        self.merger.get_failed_links()
    }

    pub fn update_link_property(&mut self, link_id: &str, property: &LinkProperty) {
        self.merger.update_link_property(link_id, property);
    }

    /// Build a routing graph from the current merged topology.
    pub fn generate_graph(&self) -> Result<RoutingGraph> {
        let topology = self
            .merger
            .topology()
            .ok_or_else(|| PceError::not_found("merged topology"))?;
        Ok(PathGraphBuilder::build(topology))
    }

    pub fn clear(&mut self) {
        self.merger.clear();
    }
}

/// Reject malformed VLAN range declarations before they reach any table.
fn validate_label_ranges(topology: &Topology) -> Result<()> {
    for node in &topology.nodes {
        for port in &node.ports {
            port.label_ranges()?;
        }
    }
    Ok(())
}
