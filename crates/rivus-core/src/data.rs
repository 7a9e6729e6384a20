//! Non-spatial input tables: commodities, processes, their input/output
//! ratios, time steps and the peak demand per unit of building area.
//!
//! Field names serialize with the hyphenated column headers used by the
//! input CSV files (`cost-inv-fix`, `cap-max`, ...), so the same structs are
//! read from CSV and written into result archives.

use crate::error::{RivusError, RivusResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Reads a numeric cell where empty, `#NV` and `NaN` count as zero.
pub(crate) fn zero_if_empty<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Num(f64),
        Text(String),
    }

    match Option::<Cell>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Cell::Num(value)) if value.is_nan() => Ok(0.0),
        Some(Cell::Num(value)) => Ok(value),
        Some(Cell::Text(text)) => {
            let text = text.trim();
            if text.is_empty() || text.eq_ignore_ascii_case("nan") || text == "#NV" {
                Ok(0.0)
            } else {
                text.parse::<f64>().map_err(serde::de::Error::custom)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commodity {
    #[serde(rename = "Commodity")]
    pub name: String,
    #[serde(rename = "cost-inv-fix", default, deserialize_with = "zero_if_empty")]
    pub cost_inv_fix: f64,
    #[serde(rename = "cost-inv-var", default, deserialize_with = "zero_if_empty")]
    pub cost_inv_var: f64,
    #[serde(rename = "cost-var", default, deserialize_with = "zero_if_empty")]
    pub cost_var: f64,
    /// Fixed loss per metre of a used arc (kW/m)
    #[serde(rename = "loss-fix", default, deserialize_with = "zero_if_empty")]
    pub loss_fix: f64,
    /// Relative loss per metre of transported power (1/m)
    #[serde(rename = "loss-var", default, deserialize_with = "zero_if_empty")]
    pub loss_var: f64,
    /// Maximum transport capacity per edge (kW); zero means not transportable
    #[serde(rename = "cap-max", default, deserialize_with = "zero_if_empty")]
    pub cap_max: f64,
}

impl Commodity {
    pub fn is_transportable(&self) -> bool {
        self.cap_max > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    #[serde(rename = "Process")]
    pub name: String,
    #[serde(rename = "cost-inv-fix", default, deserialize_with = "zero_if_empty")]
    pub cost_inv_fix: f64,
    #[serde(rename = "cost-inv-var", default, deserialize_with = "zero_if_empty")]
    pub cost_inv_var: f64,
    #[serde(rename = "cost-var", default, deserialize_with = "zero_if_empty")]
    pub cost_var: f64,
    #[serde(rename = "cap-min", default, deserialize_with = "zero_if_empty")]
    pub cap_min: f64,
    #[serde(rename = "cap-max", default, deserialize_with = "zero_if_empty")]
    pub cap_max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => write!(f, "In"),
            Direction::Out => write!(f, "Out"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessCommodity {
    #[serde(rename = "Process")]
    pub process: String,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    #[serde(rename = "Direction")]
    pub direction: Direction,
    #[serde(default, deserialize_with = "zero_if_empty")]
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeStep {
    #[serde(rename = "Time")]
    pub name: String,
    /// Hours per year represented by this step
    #[serde(default, deserialize_with = "zero_if_empty")]
    pub weight: f64,
    /// Share of the peak demand active in this step
    #[serde(default, deserialize_with = "zero_if_empty")]
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDemand {
    #[serde(rename = "Area")]
    pub area: String,
    #[serde(rename = "Commodity")]
    pub commodity: String,
    /// Peak demand per square metre of building area (kW/m²)
    #[serde(default, deserialize_with = "zero_if_empty")]
    pub peak: f64,
}

/// Addresses a single numeric cell of a [`DataSet`] for parameter sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", rename_all = "snake_case")]
pub enum ParameterTarget {
    Commodity {
        name: String,
        column: String,
    },
    Process {
        name: String,
        column: String,
    },
    ProcessCommodity {
        process: String,
        commodity: String,
        direction: Direction,
    },
    Time {
        name: String,
        column: String,
    },
    AreaDemand {
        area: String,
        commodity: String,
    },
}

impl ParameterTarget {
    /// Short label used in job ids and log lines, e.g. `commodity/Heat/cost-inv-fix`.
    pub fn label(&self) -> String {
        match self {
            ParameterTarget::Commodity { name, column } => format!("commodity/{name}/{column}"),
            ParameterTarget::Process { name, column } => format!("process/{name}/{column}"),
            ParameterTarget::ProcessCommodity {
                process,
                commodity,
                direction,
            } => format!("process_commodity/{process}/{commodity}/{direction}/ratio"),
            ParameterTarget::Time { name, column } => format!("time/{name}/{column}"),
            ParameterTarget::AreaDemand { area, commodity } => {
                format!("area_demand/{area}/{commodity}/peak")
            }
        }
    }
}

/// The five input tables of a model run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub commodities: Vec<Commodity>,
    pub processes: Vec<Process>,
    pub process_commodities: Vec<ProcessCommodity>,
    pub time: Vec<TimeStep>,
    pub area_demands: Vec<AreaDemand>,
}

impl DataSet {
    pub fn commodity(&self, name: &str) -> Option<&Commodity> {
        self.commodities.iter().find(|c| c.name == name)
    }

    pub fn process(&self, name: &str) -> Option<&Process> {
        self.processes.iter().find(|p| p.name == name)
    }

    pub fn commodity_names(&self) -> Vec<String> {
        self.commodities.iter().map(|c| c.name.clone()).collect()
    }

    /// Area types in order of first appearance in the area demand table.
    pub fn area_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.area_demands
            .iter()
            .filter(|d| seen.insert(d.area.clone()))
            .map(|d| d.area.clone())
            .collect()
    }

    /// Ratio of `commodity` for `process` in the given direction, if the tuple exists.
    pub fn ratio(&self, process: &str, commodity: &str, direction: Direction) -> Option<f64> {
        self.process_commodities
            .iter()
            .find(|pc| pc.process == process && pc.commodity == commodity && pc.direction == direction)
            .map(|pc| pc.ratio)
    }

    /// Checks references between tables, duplicate keys and value ranges.
    pub fn validate(&self) -> RivusResult<()> {
        if self.commodities.is_empty() {
            return Err(RivusError::Validation("commodity table is empty".into()));
        }
        if self.time.is_empty() {
            return Err(RivusError::Validation("time table is empty".into()));
        }

        let mut commodities = BTreeSet::new();
        for commodity in &self.commodities {
            if commodity.name.trim().is_empty() {
                return Err(RivusError::Validation("commodity name cannot be empty".into()));
            }
            if !commodities.insert(commodity.name.as_str()) {
                return Err(RivusError::Validation(format!(
                    "duplicate commodity '{}'",
                    commodity.name
                )));
            }
            if commodity.cap_max < 0.0 {
                return Err(RivusError::Validation(format!(
                    "commodity '{}' has negative cap-max",
                    commodity.name
                )));
            }
        }

        let mut processes = BTreeSet::new();
        for process in &self.processes {
            if !processes.insert(process.name.as_str()) {
                return Err(RivusError::Validation(format!(
                    "duplicate process '{}'",
                    process.name
                )));
            }
            if process.cap_min < 0.0 || process.cap_max < 0.0 {
                return Err(RivusError::Validation(format!(
                    "process '{}' has negative capacity bounds",
                    process.name
                )));
            }
            if process.cap_min > process.cap_max {
                return Err(RivusError::Validation(format!(
                    "process '{}' has cap-min {} above cap-max {}",
                    process.name, process.cap_min, process.cap_max
                )));
            }
        }

        let mut tuples = BTreeSet::new();
        for pc in &self.process_commodities {
            if !processes.contains(pc.process.as_str()) {
                return Err(RivusError::Validation(format!(
                    "process-commodity references unknown process '{}'",
                    pc.process
                )));
            }
            if !commodities.contains(pc.commodity.as_str()) {
                return Err(RivusError::Validation(format!(
                    "process-commodity references unknown commodity '{}'",
                    pc.commodity
                )));
            }
            if !tuples.insert((pc.process.as_str(), pc.commodity.as_str(), pc.direction)) {
                return Err(RivusError::Validation(format!(
                    "duplicate process-commodity entry ({}, {}, {})",
                    pc.process, pc.commodity, pc.direction
                )));
            }
            if pc.ratio < 0.0 {
                return Err(RivusError::Validation(format!(
                    "negative ratio for ({}, {}, {})",
                    pc.process, pc.commodity, pc.direction
                )));
            }
        }

        let mut steps = BTreeSet::new();
        for step in &self.time {
            if !steps.insert(step.name.as_str()) {
                return Err(RivusError::Validation(format!(
                    "duplicate time step '{}'",
                    step.name
                )));
            }
            if step.weight < 0.0 || step.scale < 0.0 {
                return Err(RivusError::Validation(format!(
                    "time step '{}' has negative weight or scale",
                    step.name
                )));
            }
        }

        let mut demands = BTreeSet::new();
        for demand in &self.area_demands {
            if !commodities.contains(demand.commodity.as_str()) {
                return Err(RivusError::Validation(format!(
                    "area demand references unknown commodity '{}'",
                    demand.commodity
                )));
            }
            if !demands.insert((demand.area.as_str(), demand.commodity.as_str())) {
                return Err(RivusError::Validation(format!(
                    "duplicate area demand ({}, {})",
                    demand.area, demand.commodity
                )));
            }
        }
        Ok(())
    }

    /// Current value of a parameter cell.
    pub fn parameter(&self, target: &ParameterTarget) -> RivusResult<f64> {
        match target {
            ParameterTarget::Commodity { name, column } => {
                let commodity = self
                    .commodity(name)
                    .ok_or_else(|| unknown("commodity", name))?;
                commodity_column(commodity, column)
            }
            ParameterTarget::Process { name, column } => {
                let process = self.process(name).ok_or_else(|| unknown("process", name))?;
                process_column(process, column)
            }
            ParameterTarget::ProcessCommodity {
                process,
                commodity,
                direction,
            } => self
                .ratio(process, commodity, *direction)
                .ok_or_else(|| unknown("process-commodity", &format!("{process}/{commodity}"))),
            ParameterTarget::Time { name, column } => {
                let step = self
                    .time
                    .iter()
                    .find(|t| &t.name == name)
                    .ok_or_else(|| unknown("time step", name))?;
                match column.as_str() {
                    "weight" => Ok(step.weight),
                    "scale" => Ok(step.scale),
                    other => Err(unknown("time column", other)),
                }
            }
            ParameterTarget::AreaDemand { area, commodity } => self
                .area_demands
                .iter()
                .find(|d| &d.area == area && &d.commodity == commodity)
                .map(|d| d.peak)
                .ok_or_else(|| unknown("area demand", &format!("{area}/{commodity}"))),
        }
    }

    /// Overwrites a parameter cell.
    pub fn set_parameter(&mut self, target: &ParameterTarget, value: f64) -> RivusResult<()> {
        match target {
            ParameterTarget::Commodity { name, column } => {
                let commodity = self
                    .commodities
                    .iter_mut()
                    .find(|c| &c.name == name)
                    .ok_or_else(|| unknown("commodity", name))?;
                *commodity_column_mut(commodity, column)? = value;
            }
            ParameterTarget::Process { name, column } => {
                let process = self
                    .processes
                    .iter_mut()
                    .find(|p| &p.name == name)
                    .ok_or_else(|| unknown("process", name))?;
                *process_column_mut(process, column)? = value;
            }
            ParameterTarget::ProcessCommodity {
                process,
                commodity,
                direction,
            } => {
                let pc = self
                    .process_commodities
                    .iter_mut()
                    .find(|pc| {
                        &pc.process == process
                            && &pc.commodity == commodity
                            && pc.direction == *direction
                    })
                    .ok_or_else(|| {
                        unknown("process-commodity", &format!("{process}/{commodity}"))
                    })?;
                pc.ratio = value;
            }
            ParameterTarget::Time { name, column } => {
                let step = self
                    .time
                    .iter_mut()
                    .find(|t| &t.name == name)
                    .ok_or_else(|| unknown("time step", name))?;
                match column.as_str() {
                    "weight" => step.weight = value,
                    "scale" => step.scale = value,
                    other => return Err(unknown("time column", other)),
                }
            }
            ParameterTarget::AreaDemand { area, commodity } => {
                let demand = self
                    .area_demands
                    .iter_mut()
                    .find(|d| &d.area == area && &d.commodity == commodity)
                    .ok_or_else(|| unknown("area demand", &format!("{area}/{commodity}")))?;
                demand.peak = value;
            }
        }
        Ok(())
    }

    /// Peak demand per area type and commodity.
    pub fn peak_table(&self) -> BTreeMap<(String, String), f64> {
        self.area_demands
            .iter()
            .map(|d| ((d.area.clone(), d.commodity.clone()), d.peak))
            .collect()
    }
}

fn unknown(kind: &str, name: &str) -> RivusError {
    RivusError::Validation(format!("unknown {kind} '{name}'"))
}

fn commodity_column(commodity: &Commodity, column: &str) -> RivusResult<f64> {
    let mut copy = commodity.clone();
    commodity_column_mut(&mut copy, column).map(|v| *v)
}

fn commodity_column_mut<'a>(commodity: &'a mut Commodity, column: &str) -> RivusResult<&'a mut f64> {
    match column {
        "cost-inv-fix" => Ok(&mut commodity.cost_inv_fix),
        "cost-inv-var" => Ok(&mut commodity.cost_inv_var),
        "cost-var" => Ok(&mut commodity.cost_var),
        "loss-fix" => Ok(&mut commodity.loss_fix),
        "loss-var" => Ok(&mut commodity.loss_var),
        "cap-max" => Ok(&mut commodity.cap_max),
        other => Err(unknown("commodity column", other)),
    }
}

fn process_column(process: &Process, column: &str) -> RivusResult<f64> {
    let mut copy = process.clone();
    process_column_mut(&mut copy, column).map(|v| *v)
}

fn process_column_mut<'a>(process: &'a mut Process, column: &str) -> RivusResult<&'a mut f64> {
    match column {
        "cost-inv-fix" => Ok(&mut process.cost_inv_fix),
        "cost-inv-var" => Ok(&mut process.cost_inv_var),
        "cost-var" => Ok(&mut process.cost_var),
        "cap-min" => Ok(&mut process.cap_min),
        "cap-max" => Ok(&mut process.cap_max),
        other => Err(unknown("process column", other)),
    }
}
