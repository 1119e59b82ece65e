//! The switch-only cut policy: no nodes are added or split. Planned
//! tracks lose their cross-cut edges in place, and the crossings that
//! survive are retagged with increased-delay switches. Coarser than
//! node duplication (an uncut wire still conducts across the boundary
//! inside its own span), but leaves the node count untouched.

use itertools::Itertools;
use prjinterposer_rrgraph::{GraphEdit, NodeLocIndex, RrKind};

use crate::{InterposerConfig, cross, cuts};

pub(crate) fn cut_crossing_edges(
    edit: &mut GraphEdit<'_>,
    index: &NodeLocIndex,
    cut_lines: &[u32],
    cfg: &InterposerConfig,
) {
    let grid_width = edit.width + 1;
    let chan_width = edit.chan_width;
    for &cut in cut_lines {
        for x in 0..grid_width {
            let tracks =
                cuts::select_cut_tracks(chan_width, cfg.percent_wires_cut, x, grid_width);
            for track in tracks {
                // the wire occupying this track at the cut row, if any
                let Some(wire) = index.try_get(x, cut, RrKind::Chany, track) else {
                    continue;
                };
                let fanouts = edit.nodes[wire].edges().iter().copied().collect_vec();
                for edge in fanouts {
                    if cross::edge_crosses_cut(edit, wire, edge.to, cut) {
                        edit.delete_connection(wire, edge.to);
                    }
                }
                let drivers = edit.drivers(wire).to_vec();
                for src in drivers {
                    if cross::edge_crosses_cut(edit, src, wire, cut) {
                        edit.delete_connection(src, wire);
                    }
                }
            }
        }
        cut_chanx_edges(edit, index, cut);
    }
}

/// Horizontal wires on the cut row also reach across the boundary; no
/// interposer node can mediate them under this policy, so every track
/// on the row loses its connections to vertical wires on the far side.
/// Only interior columns carry horizontal channels, and the top cut of
/// a grid has no row above it.
fn cut_chanx_edges(edit: &mut GraphEdit<'_>, index: &NodeLocIndex, cut: u32) {
    if cut + 1 >= edit.height {
        return;
    }
    for x in 1..edit.width {
        for track in 0..edit.chan_width {
            let Some(wire) = index.try_get(x, cut, RrKind::Chanx, track) else {
                continue;
            };
            let fanouts = edit.nodes[wire].edges().iter().map(|e| e.to).collect_vec();
            for dst in fanouts {
                let node = &edit.nodes[dst];
                if node.kind == RrKind::Chany && node.y_low > cut {
                    edit.delete_connection(wire, dst);
                }
            }
            let drivers = edit.drivers(wire).to_vec();
            for src in drivers {
                let node = &edit.nodes[src];
                if node.kind == RrKind::Chany && node.y_low > cut {
                    edit.delete_connection(src, wire);
                }
            }
        }
    }
}

/// Retags every surviving cross-cut edge with the increased-delay
/// variant of its switch.
pub(crate) fn increase_crossing_delays(
    edit: &mut GraphEdit<'_>,
    cut_lines: &[u32],
    cfg: &InterposerConfig,
) {
    let ids = edit.node_ids().collect_vec();
    for src in ids {
        if edit.nodes[src].kind != RrKind::Chany {
            continue;
        }
        let fanouts = edit.nodes[src].edges().iter().copied().collect_vec();
        for edge in fanouts {
            if cut_lines
                .iter()
                .any(|&cut| cross::edge_crosses_cut(edit, src, edge.to, cut))
            {
                edit.set_edge_switch(src, edge.to, cfg.increased_delay_switch[edge.switch]);
            }
        }
    }
}
