//! CSV tables of a [`DataSet`].
//!
//! A dataset directory holds one file per table:
//!
//! ```text
//! commodity.csv          Commodity,cost-inv-fix,cost-inv-var,cost-var,loss-fix,loss-var,cap-max
//! process.csv            Process,cost-inv-fix,cost-inv-var,cost-var,cap-min,cap-max
//! process_commodity.csv  Process,Commodity,Direction,ratio
//! time.csv               Time,weight,scale
//! area_demand.csv        Area,Commodity,peak
//! ```

use anyhow::{Context, Result};
use rivus_core::DataSet;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const COMMODITY_FILE: &str = "commodity.csv";
pub const PROCESS_FILE: &str = "process.csv";
pub const PROCESS_COMMODITY_FILE: &str = "process_commodity.csv";
pub const TIME_FILE: &str = "time.csv";
pub const AREA_DEMAND_FILE: &str = "area_demand.csv";

/// Reads every row of a CSV table into `T`.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening table {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize().enumerate() {
        let row: T =
            record.with_context(|| format!("reading row {} of {}", line + 1, path.display()))?;
        rows.push(row);
    }
    Ok(rows)
}

pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating CSV writer for {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("writing row to {}", path.display()))?;
    }
    writer.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Reads and validates the five tables from `dir`.
pub fn read_dataset(dir: &Path) -> Result<DataSet> {
    let data = DataSet {
        commodities: read_table(&dir.join(COMMODITY_FILE))?,
        processes: read_table(&dir.join(PROCESS_FILE))?,
        process_commodities: read_table(&dir.join(PROCESS_COMMODITY_FILE))?,
        time: read_table(&dir.join(TIME_FILE))?,
        area_demands: read_table(&dir.join(AREA_DEMAND_FILE))?,
    };
    data.validate()
        .with_context(|| format!("validating dataset in {}", dir.display()))?;
    debug!(
        dir = %dir.display(),
        commodities = data.commodities.len(),
        processes = data.processes.len(),
        time_steps = data.time.len(),
        "read dataset"
    );
    Ok(data)
}

pub fn write_dataset(dir: &Path, data: &DataSet) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    write_table(&dir.join(COMMODITY_FILE), &data.commodities)?;
    write_table(&dir.join(PROCESS_FILE), &data.processes)?;
    write_table(&dir.join(PROCESS_COMMODITY_FILE), &data.process_commodities)?;
    write_table(&dir.join(TIME_FILE), &data.time)?;
    write_table(&dir.join(AREA_DEMAND_FILE), &data.area_demands)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rivus_core::Direction;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn minimal_dataset(dir: &Path) {
        write(
            dir,
            COMMODITY_FILE,
            "Commodity,cost-inv-fix,cost-inv-var,cost-var,loss-fix,loss-var,cap-max\n\
             Elec,10,1,0.1,0,0.0001,1000\n\
             Heat,,,,,,\n",
        );
        write(
            dir,
            PROCESS_FILE,
            "Process,cost-inv-fix,cost-inv-var,cost-var,cap-min,cap-max\n\
             Heat pump,0,5,0,0,500\n",
        );
        write(
            dir,
            PROCESS_COMMODITY_FILE,
            "Process,Commodity,Direction,ratio\n\
             Heat pump,Elec,In,1\n\
             Heat pump,Heat,Out,3\n",
        );
        write(dir, TIME_FILE, "Time,weight,scale\n1,8760,1\n");
        write(dir, AREA_DEMAND_FILE, "Area,Commodity,peak\nresidential,Heat,0.05\n");
    }

    #[test]
    fn reads_a_dataset_directory() {
        let dir = tempdir().unwrap();
        minimal_dataset(dir.path());
        let data = read_dataset(dir.path()).unwrap();
        assert_eq!(data.commodities.len(), 2);
        assert!(data.commodity("Elec").unwrap().is_transportable());
        assert!(!data.commodity("Heat").unwrap().is_transportable());
        assert_eq!(data.ratio("Heat pump", "Heat", Direction::Out), Some(3.0));
    }

    #[test]
    fn invalid_reference_is_reported_with_directory() {
        let dir = tempdir().unwrap();
        minimal_dataset(dir.path());
        write(dir.path(), AREA_DEMAND_FILE, "Area,Commodity,peak\nresidential,Cool,1\n");
        let err = read_dataset(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Cool"));
    }

    #[test]
    fn missing_table_names_the_file() {
        let dir = tempdir().unwrap();
        minimal_dataset(dir.path());
        fs::remove_file(dir.path().join(TIME_FILE)).unwrap();
        let err = read_dataset(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains(TIME_FILE));
    }

    #[test]
    fn written_dataset_reads_back() {
        let src = tempdir().unwrap();
        minimal_dataset(src.path());
        let data = read_dataset(src.path()).unwrap();
        let out = tempdir().unwrap();
        write_dataset(out.path(), &data).unwrap();
        assert_eq!(read_dataset(out.path()).unwrap(), data);
    }
}
