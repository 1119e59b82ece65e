//! Post-transform consistency checks for the node-duplication policy.
//! Every violation is a logic error in the transform (or an
//! architecture shape it cannot express), so each check is fatal and
//! prints the offending node before dying.

use prjinterposer_rrgraph::{GraphEdit, RrKind, WireDir};

use crate::InterposerMap;

pub(crate) fn verify_post_transform(edit: &GraphEdit<'_>, imap: &InterposerMap) {
    check_no_spanning_wires(edit, imap);
    check_crossings_are_mediated(edit, imap);
    check_interposer_node_sides(edit, imap);
}

/// After splitting, no vertical wire may span a cut line.
fn check_no_spanning_wires(edit: &GraphEdit<'_>, imap: &InterposerMap) {
    for id in edit.node_ids() {
        let node = &edit.nodes[id];
        if node.kind != RrKind::Chany {
            continue;
        }
        for &cut in imap.cuts() {
            if node.y_low <= cut && cut < node.y_high {
                edit.print_node(id);
                panic!("wire {id} spans the cut at y={cut} after the transform");
            }
        }
    }
}

/// Every edge crossing a cut plane must leave from or arrive at the
/// registered interposer node of its track; the below-side endpoint is
/// the one sitting on the cut.
fn check_crossings_are_mediated(edit: &GraphEdit<'_>, imap: &InterposerMap) {
    for src in edit.node_ids() {
        for edge in edit.nodes[src].edges() {
            for (cut_idx, &cut) in imap.cuts().iter().enumerate() {
                let u = &edit.nodes[src];
                let v = &edit.nodes[edge.to];
                let below = if u.y_high <= cut && v.y_low > cut {
                    src
                } else if v.y_high <= cut && u.y_low > cut {
                    edge.to
                } else {
                    continue;
                };
                let node = &edit.nodes[below];
                let registered = node.kind == RrKind::Chany
                    && imap.get(node.x_low, cut_idx, node.ptc) == Some(below);
                if !registered {
                    edit.print_node(src);
                    edit.print_node(edge.to);
                    panic!(
                        "edge {src} -> {dst} crosses the cut at y={cut} outside an \
                         interposer node",
                        dst = edge.to,
                    );
                }
            }
        }
    }
}

/// An interposer node straddles the boundary: for an INC node all
/// fanouts lie above the cut and all drivers at or below it, and the
/// reverse for a DEC node.
fn check_interposer_node_sides(edit: &GraphEdit<'_>, imap: &InterposerMap) {
    for ip in imap.nodes() {
        let node = &edit.nodes[ip];
        assert_eq!(node.kind, RrKind::Chany);
        assert_eq!(node.y_low, node.y_high);
        let cut = node.y_low;
        for edge in node.edges() {
            let dst = &edit.nodes[edge.to];
            let ok = match node.dir {
                WireDir::Inc => dst.y_low > cut,
                WireDir::Dec => dst.y_high <= cut,
                WireDir::None => false,
            };
            if !ok {
                edit.print_node(ip);
                panic!(
                    "interposer node {ip} ({dir}) drives {dst} on the wrong side of the \
                     cut at y={cut}",
                    dir = node.dir,
                    dst = edge.to,
                );
            }
        }
        for &src in edit.drivers(ip) {
            let un = &edit.nodes[src];
            let ok = match node.dir {
                WireDir::Inc => un.y_high <= cut,
                WireDir::Dec => un.y_low > cut,
                WireDir::None => false,
            };
            if !ok {
                edit.print_node(ip);
                panic!(
                    "interposer node {ip} ({dir}) is driven by {src} on the wrong side \
                     of the cut at y={cut}",
                    dir = node.dir,
                );
            }
        }
    }
}
