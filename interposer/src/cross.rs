//! Geometric test for whether a connection crosses a cut line.

use prjinterposer_rrgraph::{NodeId, RrGraph, RrKind, WireDir};

/// Returns true if the `src → dst` connection crosses the interposer
/// boundary at `cut`. The cut line lies at `cut + 0.5`, strictly
/// between grid rows `cut` and `cut + 1`, so a row is below the cut
/// iff `y <= cut` and above iff `y > cut`.
///
/// Only connections sourced by a CHANY wire can cross; everything else
/// returns false. A CHANY→CHANY connection with opposite directions is
/// a U-turn within one vertical channel and indicates a malformed
/// graph.
pub fn edge_crosses_cut(graph: &RrGraph, src: NodeId, dst: NodeId, cut: u32) -> bool {
    let src = &graph.nodes[src];
    let dst_node = &graph.nodes[dst];
    if src.kind != RrKind::Chany {
        return false;
    }
    let (sl, sh) = (src.y_low, src.y_high);
    let (dl, dh) = (dst_node.y_low, dst_node.y_high);

    match dst_node.kind {
        RrKind::Chany => match (src.dir, dst_node.dir) {
            (WireDir::Inc, WireDir::Inc) => (sl <= cut && sh > cut) || (sh <= cut && dl > cut),
            (WireDir::Dec, WireDir::Dec) => (sl <= cut && sh > cut) || (dh <= cut && sl > cut),
            (WireDir::Inc, WireDir::Dec) | (WireDir::Dec, WireDir::Inc) => {
                panic!("U-turn in a vertical channel: {src:?} -> {dst}: {dst_node:?}")
            }
            _ => false,
        },
        RrKind::Chanx => {
            assert_eq!(dl, dh);
            match src.dir {
                WireDir::Inc => {
                    assert!(dl >= sl);
                    (sl <= cut && sh > cut && dl > cut) || (sh <= cut && dl > cut)
                }
                WireDir::Dec => {
                    assert!(dl <= sh);
                    (sl <= cut && sh > cut && dl <= cut) || (dh <= cut && sl > cut)
                }
                WireDir::None => false,
            }
        }
        RrKind::Ipin | RrKind::Opin => match src.dir {
            // pins can span several rows, e.g. on a tall block
            WireDir::Inc => (sl <= cut && sh > cut && dl > cut) || (sh <= cut && dl > cut),
            WireDir::Dec => (sl <= cut && sh > cut && dh <= cut) || (dh <= cut && sl > cut),
            WireDir::None => false,
        },
        RrKind::Source | RrKind::Sink => false,
    }
}
