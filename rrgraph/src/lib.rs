//! Routing resource graph substrate for interposer-based architectures.
//!
//! Nodes live in a single growable [`EntityVec`] arena; a [`NodeId`] is a
//! stable index into it and stays valid as nodes are appended. Edge lists
//! and fan-in counts are kept consistent with the derived reverse map by
//! routing every mutation through [`GraphEdit`] — the raw storage is not
//! reachable from outside this crate.

use serde::{Deserialize, Serialize};
use unnamed_entity::{EntityIds, EntityVec, entity_id};

mod dump;
mod edit;
mod index;

pub use dump::dump_connections;
pub use edit::{GraphEdit, ReverseMap};
pub use index::NodeLocIndex;

entity_id! {
    pub id NodeId u32, reserve 1;
    pub id SwitchId u16, reserve 1;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum RrKind {
    Source,
    Sink,
    Ipin,
    Opin,
    Chanx,
    Chany,
}

impl RrKind {
    pub fn is_pin(self) -> bool {
        matches!(
            self,
            RrKind::Source | RrKind::Sink | RrKind::Ipin | RrKind::Opin
        )
    }
}

impl std::fmt::Display for RrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                RrKind::Source => "SOURCE",
                RrKind::Sink => "SINK",
                RrKind::Ipin => "IPIN",
                RrKind::Opin => "OPIN",
                RrKind::Chanx => "CHANX",
                RrKind::Chany => "CHANY",
            }
        )
    }
}

/// Signal direction of a channel wire; meaningless for pin kinds.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum WireDir {
    Inc,
    Dec,
    None,
}

impl std::fmt::Display for WireDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                WireDir::Inc => "INC",
                WireDir::Dec => "DEC",
                WireDir::None => "NONE",
            }
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RrEdge {
    pub to: NodeId,
    pub switch: SwitchId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RrNode {
    pub kind: RrKind,
    pub dir: WireDir,
    /// Inclusive grid-cell span. CHANX wires have `y_low == y_high`,
    /// CHANY wires have `x_low == x_high`.
    pub x_low: u32,
    pub x_high: u32,
    pub y_low: u32,
    pub y_high: u32,
    /// Track index within the channel cross-section (`ptc_num`).
    pub ptc: u32,
    pub r: f64,
    pub c: f64,
    pub capacity: u32,
    pub occ: u32,
    pub cost_index: u32,
    // paired (destination, switch) lists; mutated only by this crate
    edges: Vec<RrEdge>,
    fan_in: u32,
}

impl RrNode {
    pub fn new(kind: RrKind, dir: WireDir) -> Self {
        RrNode {
            kind,
            dir,
            x_low: 0,
            x_high: 0,
            y_low: 0,
            y_high: 0,
            ptc: 0,
            r: 0.0,
            c: 0.0,
            capacity: 1,
            occ: 0,
            cost_index: 0,
            edges: vec![],
            fan_in: 0,
        }
    }

    pub fn edges(&self) -> &[RrEdge] {
        &self.edges
    }

    pub fn fan_in(&self) -> u32 {
        self.fan_in
    }

    /// Wire length in grid cells along the channel axis.
    pub fn wire_len(&self) -> u32 {
        match self.kind {
            RrKind::Chanx => self.x_high - self.x_low + 1,
            RrKind::Chany => self.y_high - self.y_low + 1,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RrSwitch {
    /// Propagation delay, in seconds.
    pub tdel: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RrGraph {
    pub nodes: EntityVec<NodeId, RrNode>,
    pub switches: EntityVec<SwitchId, RrSwitch>,
    /// Grid width (`nx`); vertical channels sit at x in `0..=width`.
    pub width: u32,
    /// Grid height (`ny`).
    pub height: u32,
    /// Tracks per channel cross-section.
    pub chan_width: u32,
}

impl RrGraph {
    pub fn new(width: u32, height: u32, chan_width: u32) -> Self {
        RrGraph {
            nodes: EntityVec::new(),
            switches: EntityVec::new(),
            width,
            height,
            chan_width,
        }
    }

    pub fn add_switch(&mut self, tdel: f64) -> SwitchId {
        self.switches.push(RrSwitch { tdel })
    }

    pub fn add_node(&mut self, node: RrNode) -> NodeId {
        self.nodes.push(node)
    }

    pub fn node_ids(&self) -> EntityIds<NodeId> {
        self.nodes.ids()
    }

    /// Appends an edge during base graph construction. Once a
    /// [`GraphEdit`] exists for this graph, use its mutation primitives
    /// instead — they keep the reverse map in sync.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId, switch: SwitchId) {
        self.nodes[src].edges.push(RrEdge { to: dst, switch });
        self.nodes[dst].fan_in += 1;
    }

    /// Replaces the switch of the `src → dst` edge. Connectivity and
    /// fan-in are untouched, so this is safe alongside a live reverse map.
    #[track_caller]
    pub fn set_edge_switch(&mut self, src: NodeId, dst: NodeId, switch: SwitchId) {
        let edge = self.nodes[src]
            .edges
            .iter_mut()
            .find(|e| e.to == dst)
            .unwrap_or_else(|| panic!("no edge {src} -> {dst}"));
        edge.switch = switch;
    }
}
