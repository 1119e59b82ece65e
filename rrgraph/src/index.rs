use std::collections::HashMap;

use crate::{NodeId, RrGraph, RrKind};

/// Coordinate → node resolver, the equivalent of the base graph
/// builder's channel lookup table. Channel wires are registered at
/// every grid cell they span, so a long wire can be found from any
/// row (CHANY) or column (CHANX) it passes through.
///
/// The index is a snapshot: splitting wires or adding nodes makes it
/// stale, so build it before transforming and only consult it for
/// pre-transform topology.
pub struct NodeLocIndex {
    map: HashMap<(RrKind, u32, u32, u32), NodeId>,
}

impl NodeLocIndex {
    pub fn build(graph: &RrGraph) -> Self {
        let mut map = HashMap::new();
        for (id, node) in graph.nodes.iter() {
            for x in node.x_low..=node.x_high {
                for y in node.y_low..=node.y_high {
                    let old = map.insert((node.kind, x, y, node.ptc), id);
                    assert!(
                        old.is_none(),
                        "duplicate {kind} node at ({x}, {y}) track {ptc}: {old} and {id}",
                        kind = node.kind,
                        ptc = node.ptc,
                        old = old.unwrap(),
                    );
                }
            }
        }
        NodeLocIndex { map }
    }

    #[track_caller]
    pub fn get(&self, x: u32, y: u32, kind: RrKind, ptc: u32) -> NodeId {
        self.try_get(x, y, kind, ptc)
            .unwrap_or_else(|| panic!("no {kind} node at ({x}, {y}) track {ptc}"))
    }

    pub fn try_get(&self, x: u32, y: u32, kind: RrKind, ptc: u32) -> Option<NodeId> {
        self.map.get(&(kind, x, y, ptc)).copied()
    }
}
