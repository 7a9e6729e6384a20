use std::path::Path;

use anyhow::{anyhow, Result};
use rivus_algo::{load_result, write_report};

pub fn handle(archive: &Path, out: &Path) -> Result<()> {
    let archive = load_result(archive)?;
    let problem = archive.problem()?;
    let solution = archive
        .solution
        .as_ref()
        .ok_or_else(|| anyhow!("archive holds no solution (status {:?})", archive.status))?;
    let written = write_report(&problem, solution, out)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
