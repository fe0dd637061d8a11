// src/graph/builder.rs
// =============================================================================
// Turns crawl results into a "who is connected to whom" graph.
//
// Only people we have an accepted relationship with can show up:
// 1. The universe of valid ids is our accepted connections (plus ourselves,
//    so our friends can point back at us)
// 2. An event whose source is outside the universe is ignored
// 3. Its neighbors are filtered down to the universe
// 4. A source left with no neighbors gets no node at all
//
// The universe is computed once in GraphBuilder::new and reused for every
// event, so events can be fed in while the crawl is still running.
// =============================================================================

use crate::api::{Identity, UserId};
use crate::crawl::DiscoveryEvent;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub label: String,
    pub neighbors: BTreeSet<UserId>,
}

/// Directed graph keyed by user id
///
/// Ordered maps keep iteration (and therefore rendering) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    nodes: BTreeMap<UserId, GraphNode>,
    /// Labels of everything referenced, including neighbor-only ids
    #[serde(skip)]
    labels: BTreeMap<UserId, String>,
}

impl Graph {
    pub fn nodes(&self) -> &BTreeMap<UserId, GraphNode> {
        &self.nodes
    }

    pub fn node(&self, id: &UserId) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// Display label for any id that appears in the graph
    pub fn label(&self, id: &UserId) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|node| node.neighbors.len()).sum()
    }
}

pub struct GraphBuilder {
    universe: BTreeMap<UserId, String>,
    nodes: BTreeMap<UserId, BTreeSet<UserId>>,
}

impl GraphBuilder {
    pub fn new(identity: &Identity) -> Self {
        // Accepted connections only; pending and blocked ones are left out
        let mut universe: BTreeMap<UserId, String> = identity
            .connections
            .iter()
            .filter(|connection| connection.kind.is_accepted())
            .map(|connection| (connection.id.clone(), connection.user.label().to_string()))
            .collect();
        // Friends list us too, and those edges belong in the graph
        universe
            .entry(identity.id.clone())
            .or_insert_with(|| identity.label().to_string());

        Self {
            universe,
            nodes: BTreeMap::new(),
        }
    }

    /// Fold one event into the graph
    ///
    /// A later event for the same source replaces the earlier one.
    pub fn add(&mut self, event: &DiscoveryEvent) {
        // Step 1: the source itself has to be one of our friends
        if !self.universe.contains_key(&event.source_id) {
            return;
        }

        // Step 2: keep only neighbors we know; strangers are dropped
        let neighbors: BTreeSet<UserId> = event
            .neighbor_ids
            .iter()
            .filter(|id| self.universe.contains_key(*id))
            .cloned()
            .collect();
        if neighbors.is_empty() {
            return;
        }

        // insert() overwrites, so the latest event for a source wins
        self.nodes.insert(event.source_id.clone(), neighbors);
    }

    pub fn finish(self) -> Graph {
        let mut labels = BTreeMap::new();
        let mut nodes = BTreeMap::new();

        for (id, neighbors) in self.nodes {
            // Label every id the renderer will reference, not just sources
            for neighbor in &neighbors {
                if let Some(label) = self.universe.get(neighbor) {
                    labels.insert(neighbor.clone(), label.clone());
                }
            }

            let label = self.universe.get(&id).cloned().unwrap_or_default();
            labels.insert(id.clone(), label.clone());
            nodes.insert(id, GraphNode { label, neighbors });
        }

        Graph { nodes, labels }
    }
}

/// Build the graph in one go from a finished (or cancelled) crawl
pub fn build_graph<'a, I>(identity: &Identity, events: I) -> Graph
where
    I: IntoIterator<Item = &'a DiscoveryEvent>,
{
    let mut builder = GraphBuilder::new(identity);
    for event in events {
        builder.add(event);
    }
    builder.finish()
}
