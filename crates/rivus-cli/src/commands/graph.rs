use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rivus_algo::{
    constants, load_result, minimal_graph_analysis, to_dot, to_graphs, to_node_link_json,
};
use rivus_cli::GraphFormat;
use tabwriter::TabWriter;

pub fn handle(archive: &Path, out: Option<&Path>, format: GraphFormat, spanning: bool) -> Result<()> {
    let archive = load_result(archive)?;
    let problem = archive.problem()?;
    let solution = archive
        .solution
        .as_ref()
        .with_context(|| format!("archive holds no solution (status {:?})", archive.status))?;
    let graphs = to_graphs(&problem, &constants(solution));

    if let Some(dir) = out {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating graph directory '{}'", dir.display()))?;
        for graph in &graphs {
            let (file, body) = match format {
                GraphFormat::Dot => (format!("{}.dot", graph.commodity), to_dot(graph)),
                GraphFormat::Json => (
                    format!("{}.json", graph.commodity),
                    serde_json::to_string_pretty(&to_node_link_json(graph))
                        .context("serializing node-link graph")?,
                ),
            };
            let path = dir.join(file);
            fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        }
    }

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "COMMODITY\tEDGES\tCONNECTED\tCOMPONENTS\tMINIMAL")?;
    for (graph, analysis) in graphs.iter().zip(minimal_graph_analysis(&graphs, spanning)) {
        let minimal = analysis
            .is_minimal
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".into());
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}",
            analysis.commodity,
            graph.graph.edge_count(),
            analysis.is_connected,
            analysis.connected_components,
            minimal
        )?;
    }
    writer.flush()?;
    Ok(())
}
