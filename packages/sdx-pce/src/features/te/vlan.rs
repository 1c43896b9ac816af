//! VLAN tag reservation
//!
//! Per-domain, per-port tag tables. A port's table maps each allowed tag
//! to the id of the request holding it, or `None` when free. Tables are
//! keyed `domain -> port -> tag`, with the tags in a `BTreeMap` so that
//! the first-free scan always picks the smallest available tag.

use std::collections::{BTreeMap, HashMap};

use ahash::AHashMap;
use tracing::{info, warn};

use crate::errors::{PceError, Result};
use crate::shared::models::{
    DomainBreakdown, LabelRange, Topology, VlanTag, VlanTaggedBreakdown, VlanTaggedBreakdowns,
    VlanTaggedPort,
};

type PortTable = BTreeMap<u16, Option<String>>;

#[derive(Debug, Default)]
pub struct VlanReservationAllocator {
    table: HashMap<String, HashMap<String, PortTable>>,
}

impl VlanReservationAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every port of a domain topology under the domain's own id,
    /// seeding each port's table from its declared VLAN ranges. Existing
    /// reservations are kept: re-registration only adds newly-allowed tags.
    ///
    /// Fails without mutating anything if any port declares a malformed
    /// range.
    pub fn register_topology(&mut self, topology: &Topology) -> Result<()> {
        let mut port_ranges: Vec<(String, Vec<LabelRange>)> = Vec::new();
        for node in &topology.nodes {
            for port in &node.ports {
                match port.label_ranges()? {
                    Some(ranges) => port_ranges.push((port.id.clone(), ranges)),
                    None => {
                        info!("port {} declares no VLAN range, skipping", port.id);
                    }
                }
            }
        }

        let domain_table = self.table.entry(topology.id.clone()).or_default();
        for (port_id, ranges) in port_ranges {
            let port_table = domain_table.entry(port_id).or_default();
            for range in ranges {
                for tag in range.iter() {
                    port_table.entry(tag).or_insert(None);
                }
            }
        }
        Ok(())
    }

    /// Reserve a tag on one port. With an explicit tag the reservation is
    /// strict: the tag must be allowed on the port and currently free.
    /// Without one, the smallest free tag is taken. Returns `None` when
    /// nothing could be reserved.
    pub fn reserve(
        &mut self,
        domain: &str,
        port_id: &str,
        request_id: &str,
        explicit: Option<u16>,
    ) -> Option<u16> {
        let Some(domain_table) = self.table.get_mut(domain) else {
            warn!("no VLAN table for domain {domain}");
            return None;
        };
        let Some(port_table) = domain_table.get_mut(port_id) else {
            warn!("no VLAN table for port {port_id} in domain {domain}");
            return None;
        };

        match explicit {
            Some(tag) => match port_table.get_mut(&tag) {
                Some(holder @ None) => {
                    *holder = Some(request_id.to_owned());
                    Some(tag)
                }
                Some(_) => {
                    warn!("requested VLAN {tag} on port {port_id} is already in use");
                    None
                }
                None => {
                    warn!("requested VLAN {tag} is not allowed on port {port_id}");
                    None
                }
            },
            None => {
                let (tag, holder) = port_table.iter_mut().find(|(_, holder)| holder.is_none())?;
                *holder = Some(request_id.to_owned());
                Some(*tag)
            }
        }
    }

    /// Reserve tags for every segment of a breakdown and emit the tagged
    /// per-domain breakdowns, keyed in segment order.
    ///
    /// Explicitly requested tags apply where a segment's endpoint is the
    /// substituted user port, and are strict: an unavailable explicit tag
    /// fails the domain. Without an explicit tag, an endpoint absent from
    /// `port_link_map` (a UNI not modeled in any domain's table) borrows
    /// the tag reserved on the segment's other end. Failure releases the
    /// failing domain's reservations; domains committed earlier in the
    /// walk stay committed.
    pub fn reserve_breakdown(
        &mut self,
        breakdown: &DomainBreakdown,
        request_id: &str,
        port_link_map: &AHashMap<String, String>,
    ) -> Result<VlanTaggedBreakdowns> {
        let mut breakdowns = Vec::with_capacity(breakdown.segments.len());
        for segment in &breakdown.segments {
            let domain = &segment.domain;
            let ingress_tag = breakdown
                .ingress_user_port
                .as_ref()
                .filter(|user| user.port_id == segment.ingress.id)
                .and_then(|user| user.tag);
            let egress_tag = breakdown
                .egress_user_port
                .as_ref()
                .filter(|user| user.port_id == segment.egress.id)
                .and_then(|user| user.tag);

            let mut ingress_vlan =
                self.reserve(domain, &segment.ingress.id, request_id, ingress_tag);
            let mut egress_vlan = self.reserve(domain, &segment.egress.id, request_id, egress_tag);

            // Borrowing never overrides an explicitly requested tag: the
            // user asked for that tag or nothing.
            if ingress_vlan.is_none()
                && ingress_tag.is_none()
                && !port_link_map.contains_key(segment.ingress.id.as_str())
            {
                warn!(
                    "ingress port {} is not attached to any link, borrowing the egress tag",
                    segment.ingress.id
                );
                ingress_vlan = egress_vlan;
            }
            if egress_vlan.is_none()
                && egress_tag.is_none()
                && !port_link_map.contains_key(segment.egress.id.as_str())
            {
                warn!(
                    "egress port {} is not attached to any link, borrowing the ingress tag",
                    segment.egress.id
                );
                egress_vlan = ingress_vlan;
            }

            let (Some(ingress_vlan), Some(egress_vlan)) = (ingress_vlan, egress_vlan) else {
                self.release_domain(domain, request_id);
                warn!("VLAN reservation failed in domain {domain}, releasing its tags");
                return Err(PceError::VlanUnavailable(domain.clone()));
            };

            let name = format!(
                "{}_vlan_{ingress_vlan}_{egress_vlan}",
                domain_display_name(domain)
            );
            breakdowns.push((
                domain.clone(),
                VlanTaggedBreakdown {
                    name,
                    dynamic_backup_path: true,
                    uni_a: VlanTaggedPort {
                        port_id: segment.ingress.id.clone(),
                        tag: VlanTag::new(ingress_vlan),
                    },
                    uni_z: VlanTaggedPort {
                        port_id: segment.egress.id.clone(),
                        tag: VlanTag::new(egress_vlan),
                    },
                },
            ));
        }
        Ok(VlanTaggedBreakdowns { breakdowns })
    }

    /// Release every tag held by a request, across all domains.
    pub fn unreserve_request(&mut self, request_id: &str) {
        for domain_table in self.table.values_mut() {
            for port_table in domain_table.values_mut() {
                for holder in port_table.values_mut() {
                    if holder.as_deref() == Some(request_id) {
                        *holder = None;
                    }
                }
            }
        }
    }

    /// Searching for one tag that is free on every port of a breakdown is
    /// not supported yet.
    pub fn find_vlan_on_path(&self, _breakdown: &DomainBreakdown) -> Result<u16> {
        Err(PceError::NotImplemented("path-level VLAN continuity search"))
    }

    /// See [`VlanReservationAllocator::find_vlan_on_path`].
    pub fn reserve_vlan_on_path(
        &mut self,
        _breakdown: &DomainBreakdown,
        _vlan: u16,
    ) -> Result<VlanTaggedBreakdowns> {
        Err(PceError::NotImplemented("path-level VLAN continuity search"))
    }

    /// Path-scoped unreservation is not supported; release by request id
    /// with [`VlanReservationAllocator::unreserve_request`] instead.
    pub fn unreserve_breakdown(&mut self, _breakdown: &DomainBreakdown) -> Result<()> {
        Err(PceError::NotImplemented("path-scoped VLAN unreservation"))
    }

    /// The request currently holding a tag, if the tag is allowed and held.
    pub fn holder(&self, domain: &str, port_id: &str, tag: u16) -> Option<&str> {
        self.table
            .get(domain)?
            .get(port_id)?
            .get(&tag)?
            .as_deref()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    fn release_domain(&mut self, domain: &str, request_id: &str) {
        let Some(domain_table) = self.table.get_mut(domain) else {
            return;
        };
        for port_table in domain_table.values_mut() {
            for holder in port_table.values_mut() {
                if holder.as_deref() == Some(request_id) {
                    *holder = None;
                }
            }
        }
    }

    #[cfg(test)]
    fn held_count(&self) -> usize {
        self.table
            .values()
            .flat_map(|domain| domain.values())
            .flat_map(|port| port.values())
            .filter(|holder| holder.is_some())
            .count()
    }
}

/// Short upper-cased domain name for breakdown naming:
/// `urn:sdx:topology:amlight.net` becomes `AMLIGHT`.
fn domain_display_name(domain: &str) -> String {
    domain
        .rsplit(':')
        .next()
        .and_then(|tail| tail.split('.').next())
        .unwrap_or(domain)
        .to_uppercase()
}
