//! Post-expansion passes: disconnecting the planned fraction of tracks
//! at each cut, then retagging the surviving interposer crossings with
//! increased-delay switches.

use prjinterposer_rrgraph::{GraphEdit, NodeId};

use crate::{InterposerConfig, InterposerMap, cuts};

/// Electrically removes the planned tracks at every cut: each selected
/// track's interposer node is stripped of every fanout and fan-in,
/// staying in the graph at degree zero. A selected track with no
/// interposer node (no wire ends there) has nothing to remove and is
/// skipped.
pub(crate) fn disconnect_cut_tracks(
    edit: &mut GraphEdit<'_>,
    imap: &InterposerMap,
    cfg: &InterposerConfig,
) {
    let grid_width = edit.width + 1;
    let chan_width = edit.chan_width;
    for cut_idx in 0..imap.cuts().len() {
        for x in 0..grid_width {
            let tracks =
                cuts::select_cut_tracks(chan_width, cfg.percent_wires_cut, x, grid_width);
            for track in tracks {
                let Some(ip) = imap.get(x, cut_idx, track) else {
                    continue;
                };
                disconnect_node(edit, ip);
            }
        }
    }
}

fn disconnect_node(edit: &mut GraphEdit<'_>, ip: NodeId) {
    let fanouts: Vec<NodeId> = edit.nodes[ip].edges().iter().map(|e| e.to).collect();
    for dst in fanouts {
        edit.delete_connection(ip, dst);
    }
    let drivers = edit.drivers(ip).to_vec();
    for src in drivers {
        edit.delete_connection(src, ip);
    }
}

/// Retags the edge feeding each surviving interposer node with the
/// increased-delay variant of its switch, modeling the signal
/// conditioning at the interposer boundary. Disconnected nodes have no
/// feed left, so the cut tracks are naturally out of scope here.
pub(crate) fn increase_interposer_delays(
    edit: &mut GraphEdit<'_>,
    imap: &InterposerMap,
    cfg: &InterposerConfig,
) {
    for ip in imap.nodes() {
        let drivers = edit.drivers(ip).to_vec();
        for src in drivers {
            let old = edit.nodes[src]
                .edges()
                .iter()
                .find(|e| e.to == ip)
                .unwrap_or_else(|| panic!("no edge {src} -> {ip}"))
                .switch;
            edit.set_edge_switch(src, ip, cfg.increased_delay_switch[old]);
        }
    }
}
