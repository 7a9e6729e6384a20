use crate::spec::{BatchSpec, SourceSpec};
use anyhow::{bail, Result};
use rivus_algo::parameter_range;
use rivus_core::DataSet;
use rivus_db::{RunOutcome, RunStatus};
use rivus_geo::{get_source_candidates, opposite_pairs, GridSpec, SourceLogic, SourceSetting};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One model run: a grid, its sources and a dataset variant.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub job_id: String,
    /// e.g. `dx=150 dy=75 edges=5 sources=Elec@0,Gas@24 commodity/Heat/cost-inv-fix=100`
    pub description: String,
    pub grid: GridSpec,
    pub sources: Vec<SourceSetting>,
    /// Label of the swept parameter and its value, `None` for the base dataset
    pub parameter: Option<String>,
    pub data: DataSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchJobRecord {
    pub job_id: String,
    pub description: String,
    pub parameter: Option<String>,
    pub status: RunStatus,
    pub outcome: RunOutcome,
    pub objective: Option<f64>,
    pub run_id: Option<i64>,
    pub archive: Option<String>,
    /// Failures of single phases; the run itself may still have succeeded
    pub errors: Vec<String>,
    /// Seconds per phase
    pub profiler: BTreeMap<String, f64>,
}

/// Source layouts for a `dim_x` x `dim_y` vertex grid, without duplicates.
pub fn source_setups(dim_x: usize, dim_y: usize, spec: &SourceSpec) -> Result<Vec<Vec<SourceSetting>>> {
    let capacities: Vec<(&String, f64)> = spec.capacities.iter().map(|(c, v)| (c, *v)).collect();
    let symmetric = get_source_candidates(dim_x, dim_y, SourceLogic::Symmetric);
    let mut setups: Vec<Vec<SourceSetting>> = Vec::new();
    let mut push = |setup: Vec<SourceSetting>| {
        if !setups.contains(&setup) {
            setups.push(setup);
        }
    };

    if spec.single {
        for vertex in &symmetric {
            push(
                capacities
                    .iter()
                    .map(|(c, cap)| SourceSetting::new(c.as_str(), *vertex, *cap))
                    .collect(),
            );
        }
    }
    if spec.symmetric_pairs || spec.corner_pairs {
        let [(first, first_cap), (second, second_cap)] = capacities.as_slice() else {
            bail!(
                "pair source layouts need exactly two source capacities, got {}",
                capacities.len()
            );
        };
        let mut pairs = Vec::new();
        if spec.symmetric_pairs {
            pairs.extend(opposite_pairs(&symmetric));
        }
        if spec.corner_pairs {
            let corners = get_source_candidates(dim_x, dim_y, SourceLogic::Extrema);
            pairs.extend(opposite_pairs(&corners));
        }
        for (a, b) in pairs {
            push(vec![
                SourceSetting::new(first.as_str(), a, *first_cap),
                SourceSetting::new(second.as_str(), b, *second_cap),
            ]);
        }
    }
    Ok(setups)
}

fn sources_label(sources: &[SourceSetting]) -> String {
    sources
        .iter()
        .map(|s| format!("{}@{}", s.commodity, s.vertex))
        .collect::<Vec<_>>()
        .join(",")
}

/// Every grid size x source layout x parameter variant of `spec`.
///
/// Without sweep parameters each grid and layout runs once on `data`.
pub fn expand_jobs(spec: &BatchSpec, data: &DataSet) -> Result<Vec<BatchJob>> {
    let mut variants: Vec<(Option<String>, DataSet)> = Vec::new();
    for sweep in &spec.parameters {
        for variant in parameter_range(data, &sweep.target, &sweep.range)? {
            variants.push((Some(variant.label()), variant.data));
        }
    }
    if variants.is_empty() {
        variants.push((None, data.clone()));
    }

    let mut jobs = Vec::new();
    for &dx in &spec.street_lengths {
        for &ratio in &spec.dy_ratios {
            let dy = dx * ratio;
            for &num_edge in &spec.num_edges {
                let mut grid = GridSpec {
                    num_edge_x: num_edge,
                    dx,
                    dy: Some(dy),
                    ..GridSpec::default()
                };
                if let Some(origin) = spec.origin_latlon {
                    grid.origin_latlon = origin;
                }
                let dim = num_edge + 1;
                for sources in source_setups(dim, dim, &spec.sources)? {
                    for (parameter, variant) in &variants {
                        let mut description = format!(
                            "dx={dx} dy={dy} edges={num_edge} sources={}",
                            sources_label(&sources)
                        );
                        if let Some(label) = parameter {
                            description.push(' ');
                            description.push_str(label);
                        }
                        jobs.push(BatchJob {
                            job_id: format!("{:04}", jobs.len()),
                            description,
                            grid: grid.clone(),
                            sources: sources.clone(),
                            parameter: parameter.clone(),
                            data: variant.clone(),
                        });
                    }
                }
            }
        }
    }
    info!(batch = %spec.name, jobs = jobs.len(), "expanded batch");
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SweepSpec;
    use rivus_algo::test_utils::heat_dataset;
    use rivus_algo::SweepRange;
    use rivus_core::ParameterTarget;

    #[test]
    fn symmetric_pairs_on_a_3x3_grid() {
        // candidates 0, 1, 3, 4 pair up as (0,4), (1,3), (3,1), (4,0)
        let setups = source_setups(3, 3, &SourceSpec::default()).unwrap();
        assert_eq!(setups.len(), 4);
        assert_eq!(setups[0][0], SourceSetting::new("Elec", 0, 160_000.0));
        assert_eq!(setups[0][1], SourceSetting::new("Gas", 4, 500_000.0));
    }

    #[test]
    fn pair_layouts_need_two_commodities() {
        let spec = SourceSpec {
            capacities: BTreeMap::from([("Gas".to_string(), 1.0)]),
            ..SourceSpec::default()
        };
        assert!(source_setups(3, 3, &spec).is_err());
        let single = SourceSpec {
            single: true,
            symmetric_pairs: false,
            ..spec
        };
        assert_eq!(source_setups(3, 3, &single).unwrap().len(), 4);
    }

    #[test]
    fn jobs_cover_the_full_product() {
        let spec = BatchSpec {
            street_lengths: vec![100.0, 200.0],
            dy_ratios: vec![1.0, 0.5],
            num_edges: vec![2],
            parameters: vec![SweepSpec {
                target: ParameterTarget::Commodity {
                    name: "Heat".into(),
                    column: "cost-inv-fix".into(),
                },
                range: SweepRange {
                    lim_lo: 0.5,
                    lim_up: 1.6,
                    step: 0.5,
                    zero_root: None,
                },
            }],
            ..BatchSpec::default()
        };
        let jobs = expand_jobs(&spec, &heat_dataset()).unwrap();
        // 2 lengths x 2 ratios x 4 layouts x 3 variants
        assert_eq!(jobs.len(), 48);
        assert_eq!(jobs[0].job_id, "0000");
        assert_eq!(jobs[1].grid.dy, Some(100.0));
        assert_eq!(jobs[3].grid.dy, Some(100.0));
        assert_eq!(
            jobs[0].description,
            "dx=100 dy=100 edges=2 sources=Elec@0,Gas@4 commodity/Heat/cost-inv-fix=100"
        );
        assert_eq!(jobs[2].data.commodity("Heat").unwrap().cost_inv_fix, 300.0);
    }

    #[test]
    fn base_dataset_without_parameters() {
        let spec = BatchSpec {
            street_lengths: vec![100.0],
            dy_ratios: vec![1.0],
            num_edges: vec![1],
            ..BatchSpec::default()
        };
        let jobs = expand_jobs(&spec, &heat_dataset()).unwrap();
        // a single square has one symmetric candidate, paired with itself
        assert_eq!(jobs.len(), 1);
        assert!(jobs.iter().all(|j| j.parameter.is_none()));
    }
}
