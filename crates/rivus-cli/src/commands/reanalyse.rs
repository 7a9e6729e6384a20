use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use rivus_algo::{reanalyse, write_reanalysis};
use tabwriter::TabWriter;

pub fn handle(dir: &Path, out: Option<&Path>) -> Result<()> {
    let reanalysis = reanalyse(dir)?;
    let written = write_reanalysis(&reanalysis, out.unwrap_or(dir))?;

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SCENARIO\tTOTAL COST\tEDGE CAPACITY")?;
    for (name, summary) in &reanalysis.scenarios {
        writeln!(
            writer,
            "{}\t{:.2}\t{:.2}",
            name,
            summary.costs.values().sum::<f64>(),
            summary.edge_capacity.values().sum::<f64>()
        )?;
    }
    writer.flush()?;
    println!(
        "Compared {} scenario(s); wrote {} tables",
        reanalysis.scenarios.len(),
        written.len()
    );
    Ok(())
}
