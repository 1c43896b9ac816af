//! Per-domain breakdown of a solved path
//!
//! The solver hands back an ordered list of graph edges; the controller
//! needs per-domain segments with concrete ingress and egress ports. The
//! decomposer walks the edge sequence, groups consecutive same-domain
//! edges into runs, and resolves each run's boundary edges to ports of
//! the merged topology. User-facing UNI ports that are not attached to
//! any link are substituted at the two ends.

use tracing::warn;

use crate::errors::{PceError, Result};
use crate::features::path_graph::RoutingGraph;
use crate::features::topology::TopologyMerger;
use crate::shared::models::{
    BreakdownRequest, ConnectionPath, ConnectionSolution, DomainBreakdown, DomainSegment, Port,
    PortPair, UserPort,
};

pub struct PathBreakdownDecomposer<'a> {
    merger: &'a TopologyMerger,
    graph: &'a RoutingGraph,
}

impl<'a> PathBreakdownDecomposer<'a> {
    pub fn new(merger: &'a TopologyMerger, graph: &'a RoutingGraph) -> Self {
        Self { merger, graph }
    }

    /// Decompose a solved path into ordered per-domain segments.
    ///
    /// The first run's ingress and the last run's egress come from the
    /// request's UNI ports when the request is point-to-point; interior
    /// boundaries come from the inter-domain links crossed between runs,
    /// with the far end of each crossing carried over as the next run's
    /// ingress.
    pub fn decompose(
        &self,
        solution: &ConnectionSolution,
        request: &BreakdownRequest,
    ) -> Result<DomainBreakdown> {
        let runs = self.group_runs(solution)?;
        if runs.is_empty() {
            return Err(PceError::not_found(format!(
                "empty connection map for request {}",
                solution.request_id
            )));
        }

        let p2p = match request {
            BreakdownRequest::PointToPoint(request) => Some(request),
            BreakdownRequest::PerDomain(_) => None,
        };
        let same_domain = p2p
            .map(|r| {
                self.merger
                    .are_ports_same_domain(&r.ingress_port.id, &r.egress_port.id)
            })
            .unwrap_or(false);
        let port_link_map = self.merger.port_link_map();

        let mut ingress_user_port = None;
        let mut egress_user_port = None;
        let mut segments = Vec::with_capacity(runs.len());
        let mut next_ingress: Option<Port> = None;
        let last_index = runs.len() - 1;

        for (i, (domain, edges)) in runs.iter().enumerate() {
            let first_edge = edges
                .first()
                .ok_or_else(|| PceError::not_found(format!("empty run for domain {domain}")))?;
            let last_edge = edges
                .last()
                .ok_or_else(|| PceError::not_found(format!("empty run for domain {domain}")))?;

            let ingress;
            let egress;
            if i == 0 {
                ingress = match p2p {
                    Some(request) => {
                        if !port_link_map.contains_key(request.ingress_port.id.as_str()) {
                            warn!(
                                "ingress port {} is not attached to any link, \
                                 treating it as a user port",
                                request.ingress_port.id
                            );
                            ingress_user_port = Some(UserPort {
                                port_id: request.ingress_port.id.clone(),
                                tag: request.ingress_port.requested_tag()?,
                            });
                        }
                        self.resolve_port(&request.ingress_port.id)?
                    }
                    None => self.ports_of_edge(first_edge)?.0,
                };
                egress = match p2p {
                    Some(request)
                        if same_domain
                            && !port_link_map.contains_key(request.egress_port.id.as_str()) =>
                    {
                        warn!(
                            "egress port {} is not attached to any link, \
                             treating it as a user port",
                            request.egress_port.id
                        );
                        egress_user_port = Some(UserPort {
                            port_id: request.egress_port.id.clone(),
                            tag: request.egress_port.requested_tag()?,
                        });
                        let (_, carry) = self.ports_of_edge(last_edge)?;
                        next_ingress = Some(carry);
                        self.resolve_port(&request.egress_port.id)?
                    }
                    _ => {
                        let (boundary, carry) = self.ports_of_edge(last_edge)?;
                        let egress = if same_domain { carry.clone() } else { boundary };
                        next_ingress = Some(carry);
                        egress
                    }
                };
            } else if i == last_index {
                ingress = next_ingress.take().ok_or_else(|| {
                    PceError::not_found(format!("missing carry-over ingress for domain {domain}"))
                })?;
                egress = match p2p {
                    Some(request)
                        if !port_link_map.contains_key(request.egress_port.id.as_str()) =>
                    {
                        warn!(
                            "egress port {} is not attached to any link, \
                             treating it as a user port",
                            request.egress_port.id
                        );
                        egress_user_port = Some(UserPort {
                            port_id: request.egress_port.id.clone(),
                            tag: request.egress_port.requested_tag()?,
                        });
                        self.resolve_port(&request.egress_port.id)?
                    }
                    _ => self.ports_of_edge(last_edge)?.1,
                };
            } else {
                ingress = next_ingress.take().ok_or_else(|| {
                    PceError::not_found(format!("missing carry-over ingress for domain {domain}"))
                })?;
                let (boundary, carry) = self.ports_of_edge(last_edge)?;
                egress = boundary;
                next_ingress = Some(carry);
            }

            segments.push(DomainSegment {
                domain: domain.clone(),
                ingress,
                egress,
            });
        }

        Ok(DomainBreakdown {
            segments,
            ingress_user_port,
            egress_user_port,
        })
    }

    /// Resolve every solved edge to its port pair, in path order.
    pub fn links_on_path(&self, solution: &ConnectionSolution) -> Result<Vec<PortPair>> {
        let mut pairs = Vec::new();
        for domain_paths in &solution.connection_map {
            for edge in &domain_paths.paths {
                let (source, destination) = self.ports_of_edge(edge)?;
                pairs.push(PortPair {
                    source: source.id,
                    destination: destination.id,
                });
            }
        }
        Ok(pairs)
    }

    /// Group the flattened edge sequence into runs of consecutive edges
    /// whose source vertices share a domain. A run is closed by any edge
    /// crossing into another domain (the crossing edge is the last edge
    /// of the run it leaves), and by an edge starting in a different
    /// domain than the open run — a solver handing in per-domain lists
    /// with the crossing edge omitted still gets one run per domain.
    fn group_runs(
        &self,
        solution: &ConnectionSolution,
    ) -> Result<Vec<(String, Vec<ConnectionPath>)>> {
        let mut runs = Vec::new();
        let mut current: Vec<ConnectionPath> = Vec::new();
        let mut current_domain: Option<String> = None;

        for domain_paths in &solution.connection_map {
            for edge in &domain_paths.paths {
                let src_domain = self.domain_of_vertex(edge.source)?;
                let dst_domain = self.domain_of_vertex(edge.destination)?;
                if current_domain
                    .as_deref()
                    .is_some_and(|domain| domain != src_domain)
                {
                    if let Some(domain) = current_domain.take() {
                        runs.push((domain, std::mem::take(&mut current)));
                    }
                }
                if current_domain.is_none() {
                    current_domain = Some(src_domain.clone());
                }
                current.push(*edge);
                if src_domain != dst_domain {
                    if let Some(domain) = current_domain.take() {
                        runs.push((domain, std::mem::take(&mut current)));
                    }
                }
            }
        }
        if let (Some(domain), false) = (current_domain, current.is_empty()) {
            runs.push((domain, current));
        }
        Ok(runs)
    }

    fn domain_of_vertex(&self, vertex: usize) -> Result<String> {
        let node_id = self
            .graph
            .node_id(vertex)
            .ok_or_else(|| PceError::not_found(format!("graph vertex {vertex}")))?;
        self.merger
            .get_domain_name(node_id)
            .map(str::to_owned)
            .ok_or_else(|| PceError::not_found(format!("owning domain of node {node_id}")))
    }

    /// Ports of the link joining a solved edge's two vertices, oriented
    /// source-first.
    fn ports_of_edge(&self, edge: &ConnectionPath) -> Result<(Port, Port)> {
        let source = self
            .graph
            .node_id(edge.source)
            .ok_or_else(|| PceError::not_found(format!("graph vertex {}", edge.source)))?;
        let destination = self
            .graph
            .node_id(edge.destination)
            .ok_or_else(|| PceError::not_found(format!("graph vertex {}", edge.destination)))?;
        let topology = self
            .merger
            .topology()
            .ok_or_else(|| PceError::not_found("merged topology".to_string()))?;
        topology.port_pair_between(source, destination).ok_or_else(|| {
            PceError::not_found(format!("link between nodes {source} and {destination}"))
        })
    }

    fn resolve_port(&self, port_id: &str) -> Result<Port> {
        self.merger
            .get_port_by_id(port_id)
            .cloned()
            .ok_or_else(|| PceError::not_found(format!("port {port_id}")))
    }
}
