use std::ops::Deref;

use unnamed_entity::EntityVec;

use crate::{NodeId, RrEdge, RrGraph, RrNode, SwitchId};

/// Derived map from each node to the set of nodes driving it.
///
/// Pass-scoped: built from the forward edges at pass start, kept in
/// lockstep by [`GraphEdit`], and discarded when the pass ends. The
/// invariant is that `drivers(v)` holds exactly one entry per edge
/// `u → v`, and its length always equals `v`'s fan-in count.
pub struct ReverseMap {
    drivers: EntityVec<NodeId, Vec<NodeId>>,
}

impl ReverseMap {
    pub fn build(graph: &RrGraph) -> Self {
        let mut drivers: EntityVec<NodeId, Vec<NodeId>> = graph
            .nodes
            .values()
            .map(|node| Vec::with_capacity(node.fan_in as usize))
            .collect();
        for (src, node) in graph.nodes.iter() {
            for edge in &node.edges {
                let slots = &mut drivers[edge.to];
                // a full slot list means the node's fan_in undercounts
                // its actual drivers, i.e. an accounting bug upstream
                assert!(
                    slots.len() < graph.nodes[edge.to].fan_in as usize,
                    "node {dst} has more drivers than its fan_in of {fan_in}",
                    dst = edge.to,
                    fan_in = graph.nodes[edge.to].fan_in,
                );
                slots.push(src);
            }
        }
        for (node, slots) in drivers.iter() {
            assert_eq!(
                slots.len(),
                graph.nodes[node].fan_in as usize,
                "node {node} has fan_in {fan_in} but {actual} drivers",
                fan_in = graph.nodes[node].fan_in,
                actual = slots.len(),
            );
        }
        ReverseMap { drivers }
    }

    pub fn drivers(&self, node: NodeId) -> &[NodeId] {
        &self.drivers[node]
    }
}

/// Exclusive editing handle over a graph plus its reverse map.
///
/// `create_connection` and `delete_connection` are the only legal way
/// to change connectivity while the reverse map is alive; both update
/// the forward edge list and the reverse entry atomically.
pub struct GraphEdit<'a> {
    graph: &'a mut RrGraph,
    rmap: ReverseMap,
}

impl Deref for GraphEdit<'_> {
    type Target = RrGraph;
    fn deref(&self) -> &RrGraph {
        self.graph
    }
}

impl<'a> GraphEdit<'a> {
    pub fn new(graph: &'a mut RrGraph) -> Self {
        let rmap = ReverseMap::build(graph);
        GraphEdit { graph, rmap }
    }

    pub fn drivers(&self, node: NodeId) -> &[NodeId] {
        self.rmap.drivers(node)
    }

    /// Mutable access to a node's scalar attributes (geometry, R/C, …).
    /// Edge storage stays private, so connectivity cannot drift here.
    pub fn node_mut(&mut self, node: NodeId) -> &mut RrNode {
        &mut self.graph.nodes[node]
    }

    /// Appends a fresh node to the arena, extending the reverse map.
    pub fn add_node(&mut self, node: RrNode) -> NodeId {
        assert!(
            node.edges.is_empty() && node.fan_in == 0,
            "new nodes must start disconnected"
        );
        let id = self.graph.nodes.push(node);
        let rid = self.rmap.drivers.push(vec![]);
        assert_eq!(id, rid);
        id
    }

    /// No-op if the edge already exists; otherwise appends
    /// `(dst, switch)` to `src`'s edge list and `src` to `dst`'s
    /// driver list, bumping both counts by one.
    pub fn create_connection(&mut self, src: NodeId, dst: NodeId, switch: SwitchId) {
        if self.graph.nodes[src].edges.iter().any(|e| e.to == dst) {
            return;
        }
        self.graph.nodes[src].edges.push(RrEdge { to: dst, switch });
        self.graph.nodes[dst].fan_in += 1;
        self.rmap.drivers[dst].push(src);
    }

    /// No-op if no such edge exists; otherwise removes the matching
    /// `(dst, switch)` pair and the one matching reverse entry. Order
    /// among the remaining edges is not preserved.
    pub fn delete_connection(&mut self, src: NodeId, dst: NodeId) {
        let Some(pos) = self.graph.nodes[src].edges.iter().position(|e| e.to == dst) else {
            return;
        };
        self.graph.nodes[src].edges.swap_remove(pos);
        self.graph.nodes[dst].fan_in -= 1;
        let slots = &mut self.rmap.drivers[dst];
        let rpos = slots
            .iter()
            .position(|&u| u == src)
            .unwrap_or_else(|| panic!("reverse map out of sync: no driver {src} for {dst}"));
        slots.swap_remove(rpos);
    }

    pub fn set_edge_switch(&mut self, src: NodeId, dst: NodeId, switch: SwitchId) {
        self.graph.set_edge_switch(src, dst, switch);
    }

    /// Debug aid: prints both adjacency directions of one node.
    pub fn print_node(&self, node: NodeId) {
        let fanouts: Vec<String> = self.graph.nodes[node]
            .edges
            .iter()
            .map(|e| e.to.to_string())
            .collect();
        println!("Fanouts of node {node}: {}", fanouts.join(","));
        let fanins: Vec<String> = self
            .rmap
            .drivers(node)
            .iter()
            .map(|u| u.to_string())
            .collect();
        println!("Fanins of node {node}: {}", fanins.join(","));
    }
}
