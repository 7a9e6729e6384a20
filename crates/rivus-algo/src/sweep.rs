//! Parameter sweeps: copies of a dataset with one cell varied around its
//! original value.

use rivus_core::{DataSet, ParameterTarget, RivusError, RivusResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_LIM_LO: f64 = 0.9;
pub const DEFAULT_LIM_UP: f64 = 1.1;
pub const DEFAULT_STEP: f64 = 0.05;

/// Range relative to the original value: `[lim_lo·x, lim_up·x)` by `step·x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepRange {
    pub lim_lo: f64,
    pub lim_up: f64,
    pub step: f64,
    /// Stand-in for `x` when the original value is zero
    pub zero_root: Option<f64>,
}

impl Default for SweepRange {
    fn default() -> Self {
        Self {
            lim_lo: DEFAULT_LIM_LO,
            lim_up: DEFAULT_LIM_UP,
            step: DEFAULT_STEP,
            zero_root: None,
        }
    }
}

/// One sweep step.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterVariant {
    pub target: ParameterTarget,
    pub value: f64,
    pub data: DataSet,
}

impl ParameterVariant {
    /// Label such as `commodity/Heat/cost-inv-fix=150`.
    pub fn label(&self) -> String {
        format!("{}={}", self.target.label(), self.value)
    }
}

/// Values of the sweep for an original value `original`.
///
/// Half-open like `numpy.arange`; a zero original yields `[0]` unless
/// `zero_root` is set.
pub fn sweep_values(original: f64, range: &SweepRange) -> Vec<f64> {
    let root = if original == 0.0 {
        match range.zero_root {
            Some(root) => root,
            None => return vec![original],
        }
    } else {
        original
    };
    let lo = range.lim_lo * root;
    let up = range.lim_up * root;
    let step = range.step * root;
    if step == 0.0 || !step.is_finite() {
        return vec![lo];
    }
    // tolerance keeps 1.1 * 100 from producing a value at the open end
    let count = ((up - lo) / step - 1e-9).ceil();
    if !(count > 0.0) {
        return Vec::new();
    }
    (0..count as usize).map(|i| lo + i as f64 * step).collect()
}

/// Copies of `data` with `target` set to each value of the sweep.
pub fn parameter_range(
    data: &DataSet,
    target: &ParameterTarget,
    range: &SweepRange,
) -> RivusResult<Vec<ParameterVariant>> {
    if range.lim_lo > range.lim_up {
        return Err(RivusError::Config(format!(
            "sweep of {} has lim_lo {} above lim_up {}",
            target.label(),
            range.lim_lo,
            range.lim_up
        )));
    }
    let original = data.parameter(target)?;
    let label = target.label();
    if original == 0.0 {
        match range.zero_root {
            Some(root) => info!(parameter = %label, root, "sweep derived from zero_root"),
            None => warn!(parameter = %label, "parameter is 0; sweep is the original only"),
        }
    }
    let values = sweep_values(original, range);
    info!(
        parameter = %label,
        original,
        variants = values.len(),
        "parameter sweep"
    );
    values
        .into_iter()
        .map(|value| {
            let mut variant = data.clone();
            variant.set_parameter(target, value)?;
            Ok(ParameterVariant {
                target: target.clone(),
                value,
                data: variant,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::heat_dataset;

    fn heat_inv_fix() -> ParameterTarget {
        ParameterTarget::Commodity {
            name: "Heat".into(),
            column: "cost-inv-fix".into(),
        }
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn default_range_is_ninety_to_hundred_ten_percent() {
        let values = sweep_values(100.0, &SweepRange::default());
        assert!(close(&values, &[90.0, 95.0, 100.0, 105.0]), "{values:?}");
    }

    #[test]
    fn zero_original_uses_zero_root() {
        assert_eq!(sweep_values(0.0, &SweepRange::default()), vec![0.0]);
        let range = SweepRange {
            zero_root: Some(10.0),
            ..SweepRange::default()
        };
        assert!(close(&sweep_values(0.0, &range), &[9.0, 9.5, 10.0, 10.5]));
    }

    #[test]
    fn variants_modify_only_the_target() {
        let data = heat_dataset();
        let range = SweepRange {
            lim_lo: 0.5,
            lim_up: 1.6,
            step: 0.5,
            zero_root: None,
        };
        let variants = parameter_range(&data, &heat_inv_fix(), &range).unwrap();
        let values: Vec<f64> = variants.iter().map(|v| v.value).collect();
        assert!(close(&values, &[100.0, 200.0, 300.0]));
        assert_eq!(variants[2].data.commodity("Heat").unwrap().cost_inv_fix, 300.0);
        assert_eq!(variants[2].data.commodity("Gas"), data.commodity("Gas"));
        assert_eq!(variants[0].label(), "commodity/Heat/cost-inv-fix=100");
    }

    #[test]
    fn unknown_target_is_an_error() {
        let target = ParameterTarget::Commodity {
            name: "Coal".into(),
            column: "cap-max".into(),
        };
        assert!(parameter_range(&heat_dataset(), &target, &SweepRange::default()).is_err());
    }
}
