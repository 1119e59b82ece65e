use std::io::{self, Write};

use crate::RrGraph;

/// Dumps every connection in the graph, one line per edge, for
/// before/after comparison of transform passes.
pub fn dump_connections(graph: &RrGraph, mut w: impl Write) -> io::Result<()> {
    for (src, node) in graph.nodes.iter() {
        for edge in node.edges() {
            let dst = &graph.nodes[edge.to];
            writeln!(
                w,
                "({},{src},{},{},{},{},{}) \t ({},{},{},{},{},{},{}) \t switch_delay[{}]={}",
                node.kind,
                node.x_low,
                node.x_high,
                node.y_low,
                node.y_high,
                node.dir,
                dst.kind,
                edge.to,
                dst.x_low,
                dst.x_high,
                dst.y_low,
                dst.y_high,
                dst.dir,
                edge.switch,
                graph.switches[edge.switch].tdel,
            )?;
        }
    }
    Ok(())
}
