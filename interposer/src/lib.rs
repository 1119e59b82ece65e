//! RR graph transform modeling a silicon interposer that splits an
//! FPGA into vertically stacked bands.
//!
//! The transform takes an already-built routing resource graph and,
//! per horizontal cut line: splits every vertical wire spanning the
//! cut into two half-wires, materializes explicit interposer nodes at
//! the boundary, disconnects a planned fraction of them to model
//! limited interposer bandwidth, and retags the surviving cross-cut
//! connections with increased-delay switches. The result keeps the
//! same external routing semantics and is consumed by an unmodified
//! router and timing analyzer.

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use unnamed_entity::EntityVec;

use prjinterposer_rrgraph::{GraphEdit, NodeId, NodeLocIndex, RrGraph, SwitchId};

pub mod cross;
pub mod cuts;
mod delay;
mod expand;
mod switch_only;
mod verify;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Directionality {
    UniDirectional,
    BiDirectional,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CutPolicy {
    /// Split crossing wires and insert dedicated interposer nodes.
    NodeDuplication,
    /// Delete crossing edges in place and retag switch delays; coarser
    /// model, kept as a configuration option.
    SwitchOnly,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterposerConfig {
    pub num_cuts: usize,
    /// Percent of wires electrically removed at each cut, per channel.
    pub percent_wires_cut: u32,
    pub policy: CutPolicy,
    pub directionality: Directionality,
    /// Switch joining the two halves of a split wire (plain wire
    /// continuation, no extra delay).
    pub bridge_switch: SwitchId,
    /// Zero-delay switch for hops into/out of an interposer node.
    pub hop_switch: SwitchId,
    /// Maps each ordinary switch id to its increased-delay variant.
    pub increased_delay_switch: EntityVec<SwitchId, SwitchId>,
}

/// Lookup table from (x-channel, cut index, track) to the interposer
/// node materialized there, if any. Persists past the transform so the
/// base graph builder can late-bind stale references.
pub struct InterposerMap {
    cuts: Vec<u32>,
    nodes: Array3<Option<NodeId>>,
}

impl InterposerMap {
    fn new(graph: &RrGraph, cuts: &[u32]) -> Self {
        InterposerMap {
            cuts: cuts.to_vec(),
            nodes: Array3::from_elem(
                (graph.width as usize + 1, cuts.len(), graph.chan_width as usize),
                None,
            ),
        }
    }

    /// The y-coordinates of the cut lines, in ascending order.
    pub fn cuts(&self) -> &[u32] {
        &self.cuts
    }

    pub fn get(&self, x: u32, cut: usize, track: u32) -> Option<NodeId> {
        self.nodes[[x as usize, cut, track as usize]]
    }

    fn set(&mut self, x: u32, cut: usize, track: u32, node: NodeId) {
        let slot = &mut self.nodes[[x as usize, cut, track as usize]];
        assert!(
            slot.is_none(),
            "duplicate interposer node at x={x} cut={cut} track={track}"
        );
        *slot = Some(node);
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter_map(|&n| n)
    }
}

/// Entry point: restructures `graph` to model `cfg.num_cuts` interposer
/// boundaries. Returns the interposer node lookup table for the
/// node-duplication policy, or `None` when nothing was inserted (the
/// switch-only policy, or a bidirectional architecture, which is
/// unsupported and skips the transform entirely).
pub fn modify_rr_graph_for_interposer(
    graph: &mut RrGraph,
    cfg: &InterposerConfig,
) -> Option<InterposerMap> {
    if cfg.directionality == Directionality::BiDirectional {
        return None;
    }
    let cuts = cuts::cut_locations(graph.height, cfg.num_cuts);
    match cfg.policy {
        CutPolicy::NodeDuplication => {
            let mut edit = GraphEdit::new(graph);
            let imap = expand::expand_graph(&mut edit, &cuts, cfg);
            delay::disconnect_cut_tracks(&mut edit, &imap, cfg);
            delay::increase_interposer_delays(&mut edit, &imap, cfg);
            verify::verify_post_transform(&edit, &imap);
            Some(imap)
        }
        CutPolicy::SwitchOnly => {
            let index = NodeLocIndex::build(graph);
            let mut edit = GraphEdit::new(graph);
            switch_only::cut_crossing_edges(&mut edit, &index, &cuts, cfg);
            switch_only::increase_crossing_delays(&mut edit, &cuts, cfg);
            None
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{chany, config};
    use prjinterposer_rrgraph::WireDir;

    #[test]
    fn node_duplication_registers_interposer_nodes_on_cut_rows() {
        let mut graph = RrGraph::new(4, 12, 2);
        let cfg = config(&mut graph, 2, 0);
        for track in 0..2 {
            graph.add_node(chany(1, 1, 11, WireDir::Inc, track));
        }
        let before = graph.nodes.len();
        let imap = modify_rr_graph_for_interposer(&mut graph, &cfg).unwrap();

        assert_eq!(imap.cuts(), &[4, 8]);
        // each wire splits twice and gains one interposer node per cut
        assert_eq!(graph.nodes.len(), before + 2 * 4);
        for ip in imap.nodes() {
            let node = &graph.nodes[ip];
            assert!(imap.cuts().contains(&node.y_low));
            assert_eq!(node.y_low, node.y_high);
        }
        for (cut_idx, _) in imap.cuts().iter().enumerate() {
            for track in 0..2 {
                assert!(imap.get(1, cut_idx, track).is_some());
            }
        }
    }

    #[test]
    fn bidirectional_architectures_are_skipped() {
        let mut graph = RrGraph::new(2, 8, 2);
        let mut cfg = config(&mut graph, 1, 50);
        cfg.directionality = Directionality::BiDirectional;
        let a = graph.add_node(chany(0, 2, 6, WireDir::Inc, 0));
        let before = graph.nodes.len();
        assert!(modify_rr_graph_for_interposer(&mut graph, &cfg).is_none());
        assert_eq!(graph.nodes.len(), before);
        assert_eq!(graph.nodes[a].y_high, 6);
    }
}
