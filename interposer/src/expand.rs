//! The node-duplication transform: splits every vertical wire that
//! spans a cut into two half-wires, materializes interposer nodes at
//! the cut boundaries, and re-homes all affected connections so that
//! every surviving cross-cut signal passes through an interposer node.

use itertools::Itertools;
use prjinterposer_rrgraph::{GraphEdit, NodeId, RrGraph, RrKind, RrNode, SwitchId, WireDir};

use crate::{InterposerConfig, InterposerMap};

pub(crate) fn expand_graph(
    edit: &mut GraphEdit<'_>,
    cuts: &[u32],
    cfg: &InterposerConfig,
) -> InterposerMap {
    let base_nodes = edit.nodes.len();
    // upper bound on what this pass may add: one half-wire per
    // (wire, spanned cut) pair, plus at most one interposer node per
    // (vertical channel, cut, track)
    let crossing = find_crossing_wires(edit, cuts);
    let crossing_pairs: usize = crossing
        .iter()
        .map(|&id| {
            let node = &edit.nodes[id];
            cuts.iter()
                .filter(|&&cut| node.y_low <= cut && cut < node.y_high)
                .count()
        })
        .sum();
    let bound =
        crossing_pairs + cuts.len() * (edit.width as usize + 1) * edit.chan_width as usize;

    // a long wire can span more than one cut; its far half goes back on
    // the worklist until no piece spans anything
    let mut worklist = crossing;
    while let Some(id) = worklist.pop() {
        let Some(new_id) = split_wire(edit, id, cuts, cfg) else {
            continue;
        };
        for half in [id, new_id] {
            let node = &edit.nodes[half];
            if cuts.iter().any(|&cut| node.y_low <= cut && cut < node.y_high) {
                worklist.push(half);
            }
        }
    }
    check_no_spanning_wires(edit, cuts);

    let mut imap = InterposerMap::new(edit, cuts);
    materialize_interposer_nodes(edit, cuts, cfg, &mut imap);
    rewire_chanx_at_cuts(edit, cuts, cfg, &imap);

    assert!(edit.nodes.len() - base_nodes <= bound);
    imap
}

pub(crate) fn find_crossing_wires(graph: &RrGraph, cuts: &[u32]) -> Vec<NodeId> {
    graph
        .nodes
        .iter()
        .filter(|(_, node)| {
            node.kind == RrKind::Chany
                && cuts.iter().any(|&cut| node.y_low <= cut && cut < node.y_high)
        })
        .map(|(id, _)| id)
        .collect_vec()
}

/// Splits `orig_id` at the lowest cut its span contains, returning the
/// far half's id. The half nearer the signal's logical start keeps the
/// original id; resistance is copied and capacitance split
/// proportionally to the post-split lengths.
pub(crate) fn split_wire(
    edit: &mut GraphEdit<'_>,
    orig_id: NodeId,
    cuts: &[u32],
    cfg: &InterposerConfig,
) -> Option<NodeId> {
    let orig = &edit.nodes[orig_id];
    assert_eq!(orig.kind, RrKind::Chany);
    let cut = cuts
        .iter()
        .copied()
        .find(|&c| orig.y_low <= c && c < orig.y_high)?;

    let dir = orig.dir;
    let len_before = orig.wire_len();
    let c_before = orig.c;
    let fanout_before = orig.edges().len();
    let fanin_before = orig.fan_in() as usize;

    let mut new_node = RrNode::new(RrKind::Chany, dir);
    new_node.x_low = orig.x_low;
    new_node.x_high = orig.x_high;
    new_node.ptc = orig.ptc;
    new_node.cost_index = orig.cost_index;
    new_node.occ = orig.occ;
    new_node.capacity = orig.capacity;
    new_node.r = orig.r;
    match dir {
        WireDir::Inc => {
            new_node.y_low = cut + 1;
            new_node.y_high = orig.y_high;
        }
        WireDir::Dec => {
            new_node.y_low = orig.y_low;
            new_node.y_high = cut;
        }
        WireDir::None => {
            panic!("cannot split wire {orig_id}: only unidirectional wires are supported")
        }
    }
    let new_id = edit.add_node(new_node);
    {
        let orig = edit.node_mut(orig_id);
        match dir {
            WireDir::Inc => orig.y_high = cut,
            WireDir::Dec => orig.y_low = cut + 1,
            WireDir::None => unreachable!(),
        }
    }
    let len_orig = edit.nodes[orig_id].wire_len();
    let len_new = edit.nodes[new_id].wire_len();
    assert_eq!(len_orig + len_new, len_before);
    edit.node_mut(orig_id).c = c_before * len_orig as f64 / len_before as f64;
    edit.node_mut(new_id).c = c_before * len_new as f64 / len_before as f64;

    // re-home fanouts whose endpoint now lies on the far side; a CHANX
    // lying exactly on the cut row stays with the upper half so the
    // interposer rewiring stage can mediate it
    let fanouts = edit.nodes[orig_id].edges().iter().copied().collect_vec();
    for edge in fanouts {
        let dst = &edit.nodes[edge.to];
        let moves = match dir {
            WireDir::Inc => dst.y_low > cut,
            WireDir::Dec => dst.y_low <= cut && !(dst.y_low == cut && dst.kind == RrKind::Chanx),
            WireDir::None => unreachable!(),
        };
        if moves {
            edit.create_connection(new_id, edge.to, edge.switch);
            edit.delete_connection(orig_id, edge.to);
        }
    }

    edit.create_connection(orig_id, new_id, cfg.bridge_switch);

    let drivers = edit.drivers(orig_id).to_vec();
    for u in drivers {
        let un = &edit.nodes[u];
        let moves = match dir {
            WireDir::Inc => un.y_high > cut || (un.y_high == cut && un.kind == RrKind::Chanx),
            WireDir::Dec => un.y_low <= cut,
            WireDir::None => unreachable!(),
        };
        if moves {
            let switch = edge_switch(edit, u, orig_id);
            edit.create_connection(u, new_id, switch);
            edit.delete_connection(u, orig_id);
        }
    }

    // the +2 is the one new edge joining the halves, counted once as a
    // fanout and once as a fanin
    assert_eq!(
        fanout_before + fanin_before + 2,
        edit.nodes[orig_id].edges().len()
            + edit.nodes[orig_id].fan_in() as usize
            + edit.nodes[new_id].edges().len()
            + edit.nodes[new_id].fan_in() as usize,
        "edge bookkeeping mismatch after splitting {orig_id}",
    );

    Some(new_id)
}

#[track_caller]
fn edge_switch(graph: &RrGraph, src: NodeId, dst: NodeId) -> SwitchId {
    graph.nodes[src]
        .edges()
        .iter()
        .find(|e| e.to == dst)
        .unwrap_or_else(|| panic!("no edge {src} -> {dst}"))
        .switch
}

/// Mid-pass legality check: after splitting, no vertical wire may span
/// a cut, and no wire may connect to a pin kind on the far side of one.
pub(crate) fn check_no_spanning_wires(graph: &RrGraph, cuts: &[u32]) {
    for (id, node) in graph.nodes.iter() {
        if node.kind != RrKind::Chany {
            continue;
        }
        for &cut in cuts {
            assert!(
                !(node.y_low <= cut && cut < node.y_high),
                "wire {id} still spans the cut at y={cut} after splitting"
            );
            for edge in node.edges() {
                let dst = &graph.nodes[edge.to];
                if dst.kind.is_pin() {
                    let crossing = (node.y_high <= cut && dst.y_low > cut)
                        || (node.y_low > cut && dst.y_high <= cut);
                    assert!(
                        !crossing,
                        "wire {id} connects to pin {dst} on the other side of the cut at y={cut}",
                        dst = edge.to,
                    );
                }
            }
        }
    }
}

/// Creates one interposer node per (channel, cut, track) where a
/// vertical wire now ends exactly on the cut, and moves that wire's
/// cross-cut connections onto it.
pub(crate) fn materialize_interposer_nodes(
    edit: &mut GraphEdit<'_>,
    cuts: &[u32],
    cfg: &InterposerConfig,
    imap: &mut InterposerMap,
) {
    let existing = edit.nodes.ids().collect_vec();
    for id in existing {
        for (cut_idx, &cut) in cuts.iter().enumerate() {
            let node = &edit.nodes[id];
            if node.kind != RrKind::Chany || (node.y_low != cut && node.y_high != cut) {
                continue;
            }
            // wires were split above, so a boundary wire ends at the cut
            assert_eq!(node.y_high, cut);
            assert_eq!(node.x_low, node.x_high);
            let x = node.x_low;
            let ptc = node.ptc;
            let dir = node.dir;

            let mut ip = RrNode::new(RrKind::Chany, dir);
            ip.x_low = x;
            ip.x_high = x;
            ip.y_low = cut;
            ip.y_high = cut;
            ip.ptc = ptc;
            ip.cost_index = node.cost_index;
            let ip_id = edit.add_node(ip);
            imap.set(x, cut_idx, ptc, ip_id);

            match dir {
                WireDir::Inc => {
                    edit.create_connection(id, ip_id, cfg.bridge_switch);
                    // the wire's far-side fanouts now leave from the
                    // interposer node
                    let fanouts = edit.nodes[id].edges().iter().copied().collect_vec();
                    for edge in fanouts {
                        if edit.nodes[edge.to].y_low > cut {
                            edit.create_connection(ip_id, edge.to, cfg.hop_switch);
                            edit.delete_connection(id, edge.to);
                        }
                    }
                }
                WireDir::Dec => {
                    edit.create_connection(ip_id, id, cfg.hop_switch);
                    // the wire's far-side drivers now feed the
                    // interposer node, keeping their original switches
                    let drivers = edit.drivers(id).to_vec();
                    for u in drivers {
                        if edit.nodes[u].y_low > cut {
                            let switch = edge_switch(edit, u, id);
                            edit.create_connection(u, ip_id, switch);
                            edit.delete_connection(u, id);
                        }
                    }
                }
                WireDir::None => {
                    panic!("wire {id} has no direction: only unidirectional wires are supported")
                }
            }
        }
    }
}

/// Horizontal wires lying exactly on a cut row may connect to vertical
/// wires on the far side; those connections are re-routed through the
/// interposer node of the vertical wire's track. A pin or another
/// CHANX across the cut is an unsupported architecture shape.
pub(crate) fn rewire_chanx_at_cuts(
    edit: &mut GraphEdit<'_>,
    cuts: &[u32],
    cfg: &InterposerConfig,
    imap: &InterposerMap,
) {
    let ids = edit.nodes.ids().collect_vec();
    for id in ids {
        for (cut_idx, &cut) in cuts.iter().enumerate() {
            let node = &edit.nodes[id];
            if node.kind != RrKind::Chanx || node.y_low != cut {
                continue;
            }
            assert_eq!(node.y_low, node.y_high);

            let fanouts = edit.nodes[id].edges().iter().copied().collect_vec();
            for edge in fanouts {
                let dst = &edit.nodes[edge.to];
                if dst.y_low <= cut {
                    continue;
                }
                match dst.kind {
                    RrKind::Chany => {
                        let ip = interposer_at(imap, dst.x_low, cut_idx, dst.ptc, id, edge.to);
                        edit.create_connection(id, ip, edge.switch);
                        edit.create_connection(ip, edge.to, cfg.hop_switch);
                        edit.delete_connection(id, edge.to);
                    }
                    RrKind::Chanx => panic!(
                        "CHANX wire {id} below the cut at y={cut} connects to a CHANX wire {dst} above it",
                        dst = edge.to,
                    ),
                    _ => panic!(
                        "CHANX wire {id} below the cut at y={cut} connects to a pin {dst} above it",
                        dst = edge.to,
                    ),
                }
            }

            let drivers = edit.drivers(id).to_vec();
            for u in drivers {
                let un = &edit.nodes[u];
                if un.y_low <= cut {
                    continue;
                }
                match un.kind {
                    RrKind::Chany => {
                        let switch = edge_switch(edit, u, id);
                        let ip = interposer_at(imap, un.x_low, cut_idx, un.ptc, u, id);
                        edit.create_connection(u, ip, switch);
                        edit.create_connection(ip, id, cfg.hop_switch);
                        edit.delete_connection(u, id);
                    }
                    RrKind::Chanx => panic!(
                        "CHANX wire {id} below the cut at y={cut} is driven by a CHANX wire {u} above it"
                    ),
                    _ => panic!(
                        "CHANX wire {id} below the cut at y={cut} is driven by a pin {u} above it"
                    ),
                }
            }
        }
    }
}

#[track_caller]
fn interposer_at(
    imap: &InterposerMap,
    x: u32,
    cut_idx: usize,
    ptc: u32,
    src: NodeId,
    dst: NodeId,
) -> NodeId {
    imap.get(x, cut_idx, ptc).unwrap_or_else(|| {
        panic!(
            "no interposer node at x={x} cut {cut_idx} track {ptc} to mediate {src} -> {dst}"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{chanx, chany, config, pin};
    use assert_matches::assert_matches;
    use prjinterposer_rrgraph::{RrGraph, SwitchId};
    use unnamed_entity::EntityId;

    fn routing() -> SwitchId {
        SwitchId::from_idx(0)
    }

    #[test]
    fn wire_clear_of_all_cuts_is_not_split() {
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let a = graph.add_node(chany(1, 5, 7, WireDir::Inc, 0));
        let before = graph.nodes.len();
        let mut edit = GraphEdit::new(&mut graph);
        assert_matches!(split_wire(&mut edit, a, &[4], &cfg), None);
        assert_eq!(edit.nodes.len(), before);
    }

    #[test]
    fn split_inc_wire_at_single_cut() {
        // ny=8, one cut at y=4; an INC wire spanning rows 2-6 splits
        // into 2-4 and 5-6
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let a = graph.add_node(chany(1, 2, 6, WireDir::Inc, 0));
        let p = graph.add_node(pin(RrKind::Opin, 1, 2, 0));
        let x_below = graph.add_node(chanx(1, 2, 3, 0));
        let x_above = graph.add_node(chanx(1, 2, 6, 1));
        graph.add_edge(p, a, routing());
        graph.add_edge(a, x_below, routing());
        graph.add_edge(a, x_above, routing());
        let c_before = graph.nodes[a].c;
        let r_before = graph.nodes[a].r;

        let mut edit = GraphEdit::new(&mut graph);
        let new = split_wire(&mut edit, a, &[4], &cfg).unwrap();

        assert_eq!((edit.nodes[a].y_low, edit.nodes[a].y_high), (2, 4));
        assert_eq!((edit.nodes[new].y_low, edit.nodes[new].y_high), (5, 6));
        assert_eq!(edit.nodes[a].wire_len(), 3);
        assert_eq!(edit.nodes[new].wire_len(), 2);
        assert_eq!(edit.nodes[new].r, r_before);
        let c_sum = edit.nodes[a].c + edit.nodes[new].c;
        assert!((c_sum - c_before).abs() < 1e-18);
        assert!((edit.nodes[a].c - c_before * 3.0 / 5.0).abs() < 1e-18);
        assert!((edit.nodes[new].c - c_before * 2.0 / 5.0).abs() < 1e-18);

        // near-side connections stay, far-side ones move
        assert!(edit.nodes[a].edges().iter().any(|e| e.to == x_below));
        assert!(edit.nodes[new].edges().iter().any(|e| e.to == x_above));
        assert!(!edit.nodes[a].edges().iter().any(|e| e.to == x_above));
        assert_eq!(edit.drivers(a), &[p]);

        // the two halves are joined by one continuation edge
        let bridge = edit.nodes[a].edges().iter().find(|e| e.to == new).unwrap();
        assert_eq!(bridge.switch, cfg.bridge_switch);
        assert_eq!(edit.drivers(new), &[a]);
    }

    #[test]
    fn split_dec_wire_keeps_upper_half_on_original() {
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let a = graph.add_node(chany(1, 2, 6, WireDir::Dec, 1));
        let drv_above = graph.add_node(chanx(1, 2, 6, 0));
        let sink_below = graph.add_node(chanx(1, 2, 2, 1));
        graph.add_edge(drv_above, a, routing());
        graph.add_edge(a, sink_below, routing());

        let mut edit = GraphEdit::new(&mut graph);
        let new = split_wire(&mut edit, a, &[4], &cfg).unwrap();

        // a DEC signal starts at the top: the original keeps 5-6
        assert_eq!((edit.nodes[a].y_low, edit.nodes[a].y_high), (5, 6));
        assert_eq!((edit.nodes[new].y_low, edit.nodes[new].y_high), (2, 4));
        assert_eq!(edit.drivers(a), &[drv_above]);
        assert!(edit.nodes[new].edges().iter().any(|e| e.to == sink_below));
        assert!(edit.nodes[a].edges().iter().any(|e| e.to == new));
    }

    #[test]
    fn wire_spanning_two_cuts_is_split_twice() {
        let mut graph = RrGraph::new(4, 12, 2);
        let cfg = config(&mut graph, 2, 0);
        let a = graph.add_node(chany(1, 2, 10, WireDir::Inc, 0));
        let mut edit = GraphEdit::new(&mut graph);
        expand_graph(&mut edit, &[4, 8], &cfg);
        for id in edit.node_ids() {
            let node = &edit.nodes[id];
            if node.kind == RrKind::Chany {
                for cut in [4, 8] {
                    assert!(!(node.y_low <= cut && cut < node.y_high));
                }
            }
        }
        assert_eq!((edit.nodes[a].y_low, edit.nodes[a].y_high), (2, 4));
    }

    #[test]
    fn inc_boundary_wire_gets_interposer_node() {
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let a = graph.add_node(chany(1, 2, 6, WireDir::Inc, 0));
        let above = graph.add_node(chany(1, 5, 7, WireDir::Inc, 1));
        graph.add_edge(a, above, routing());

        let mut edit = GraphEdit::new(&mut graph);
        let imap = expand_graph(&mut edit, &[4], &cfg);

        // the lower half ends on the cut and owns the interposer node
        let ip = imap.get(1, 0, 0).unwrap();
        assert_eq!((edit.nodes[ip].y_low, edit.nodes[ip].y_high), (4, 4));
        assert_eq!(edit.nodes[ip].r, 0.0);
        assert_eq!(edit.nodes[ip].c, 0.0);
        assert_eq!(edit.nodes[ip].capacity, 1);

        // a -> ip uses the continuation switch, ip -> upper half the hop
        let to_ip = edit.nodes[a].edges().iter().find(|e| e.to == ip).unwrap();
        assert_eq!(to_ip.switch, cfg.bridge_switch);
        for edge in edit.nodes[ip].edges() {
            assert!(edit.nodes[edge.to].y_low > 4);
            assert_eq!(edge.switch, cfg.hop_switch);
        }
        // nothing except the interposer node crosses the cut
        for src in edit.node_ids() {
            for edge in edit.nodes[src].edges() {
                let (u, v) = (&edit.nodes[src], &edit.nodes[edge.to]);
                let crosses = (u.y_high <= 4 && v.y_low > 4) || (u.y_low > 4 && v.y_high <= 4);
                if crosses {
                    assert!(src == ip || edge.to == ip);
                }
            }
        }
    }

    #[test]
    fn chanx_at_cut_is_mediated_by_interposer_node() {
        // Scenario: a CHANX wire on the cut row drives a CHANY wire
        // above; the connection must run through the interposer node at
        // (dst.x, cut, dst.track), never directly
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let x = graph.add_node(chanx(1, 3, 4, 0));
        let b = graph.add_node(chany(2, 5, 7, WireDir::Inc, 1));
        let boundary = graph.add_node(chany(2, 3, 4, WireDir::Inc, 1));
        graph.add_edge(x, b, routing());
        let _ = boundary;

        let mut edit = GraphEdit::new(&mut graph);
        let imap = expand_graph(&mut edit, &[4], &cfg);

        let ip = imap.get(2, 0, 1).unwrap();
        assert!(!edit.nodes[x].edges().iter().any(|e| e.to == b));
        let via = edit.nodes[x].edges().iter().find(|e| e.to == ip).unwrap();
        assert_eq!(via.switch, routing());
        let hop = edit.nodes[ip].edges().iter().find(|e| e.to == b).unwrap();
        assert_eq!(hop.switch, cfg.hop_switch);
    }

    #[test]
    fn chany_above_driving_chanx_at_cut_is_mediated() {
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let x = graph.add_node(chanx(1, 3, 4, 0));
        let a = graph.add_node(chany(2, 2, 6, WireDir::Dec, 1));
        graph.add_edge(a, x, routing());

        let mut edit = GraphEdit::new(&mut graph);
        let imap = expand_graph(&mut edit, &[4], &cfg);

        // the DEC wire splits; its upper half reaches the CHANX only
        // through the interposer node of its own track
        let ip = imap.get(2, 0, 1).unwrap();
        assert!(!edit.nodes[a].edges().iter().any(|e| e.to == x));
        assert!(edit.nodes[a].edges().iter().any(|e| e.to == ip));
        assert!(edit.nodes[ip].edges().iter().any(|e| e.to == x));
    }

    #[test]
    #[should_panic(expected = "pin")]
    fn chanx_to_pin_across_cut_is_fatal() {
        let mut graph = RrGraph::new(4, 8, 2);
        let cfg = config(&mut graph, 1, 0);
        let x = graph.add_node(chanx(1, 3, 4, 0));
        let p = graph.add_node(pin(RrKind::Ipin, 1, 5, 0));
        graph.add_edge(x, p, routing());
        let mut edit = GraphEdit::new(&mut graph);
        expand_graph(&mut edit, &[4], &cfg);
    }

    #[test]
    #[should_panic(expected = "still spans")]
    fn residual_spanning_wire_is_fatal() {
        let mut graph = RrGraph::new(4, 8, 2);
        let a = graph.add_node(chany(1, 2, 6, WireDir::Inc, 0));
        let _ = a;
        check_no_spanning_wires(&graph, &[4]);
    }
}
