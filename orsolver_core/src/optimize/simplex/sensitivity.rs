//! Post-optimal sensitivity analysis of a linear program
//!
//! Everything here is read off the final tableau. The final column of each row's
//! identity variable (slack for `<=` rows, artificial otherwise) is the matching
//! column of the basis inverse, up to the sign applied when the row was normalized.
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::optimize::clean;
use crate::optimize::constraint::ConstraintKind;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::simplex::standard_form::StandardForm;
use crate::optimize::simplex::tableau::Tableau;
use crate::optimize::simplex::LpProblem;

/// Sensitivity information of an optimal solution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Change of the optimal objective per unit increase of each constraint's rhs
    pub shadow_prices: Vec<f64>,
    /// Slack (for `<=`) or surplus (for `>=`) of each constraint, zero if binding
    pub slack_values: Vec<f64>,
    /// Final objective row entry of each variable, zero for basic variables
    pub reduced_costs: Vec<f64>,
    /// How far each rhs can move before the optimal basis changes
    pub rhs_ranges: Vec<RhsRange>,
    /// How far each objective coefficient can move before the optimal basis changes
    pub objective_ranges: Vec<ObjectiveRange>,
}

/// Range over which a constraint's right hand side keeps the basis optimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhsRange {
    pub name: String,
    pub current_rhs: f64,
    pub shadow_price: f64,
    /// `f64::INFINITY` if the rhs can grow without bound
    #[serde(with = "unbounded")]
    pub allowable_increase: f64,
    /// `f64::INFINITY` if the rhs can shrink without bound
    #[serde(with = "unbounded")]
    pub allowable_decrease: f64,
}

/// Range over which a variable's objective coefficient keeps the basis optimal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveRange {
    pub name: String,
    pub current_coefficient: f64,
    /// Value of the variable in the optimal solution
    pub current_value: f64,
    #[serde(with = "unbounded")]
    pub allowable_increase: f64,
    #[serde(with = "unbounded")]
    pub allowable_decrease: f64,
}

/// Serde format for range limits that may be infinite
///
/// JSON has no infinity, so infinite limits are written as the strings `"inf"`
/// and `"-inf"`.
mod unbounded {
    use serde::de::{Error, Unexpected};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if *value == f64::INFINITY {
            serializer.serialize_str("inf")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Limit {
        Finite(f64),
        Text(String),
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Limit::deserialize(deserializer)? {
            Limit::Finite(value) => Ok(value),
            Limit::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(D::Error::invalid_value(
                    Unexpected::Str(other),
                    &"a number, \"inf\" or \"-inf\"",
                )),
            },
        }
    }
}

/// A named value, one row of a sensitivity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: f64,
}

/// Sensitivity analysis laid out as ordered tables for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    /// One entry per constraint
    pub shadow_prices: Vec<NamedValue>,
    /// One entry per constraint
    pub slack_values: Vec<NamedValue>,
    /// One entry per variable
    pub reduced_costs: Vec<NamedValue>,
    /// One entry per constraint
    pub rhs_ranges: Vec<RhsRange>,
    /// One entry per variable
    pub objective_ranges: Vec<ObjectiveRange>,
}

impl SensitivityReport {
    pub(crate) fn new(
        sensitivity: &Sensitivity,
        variable_names: &[String],
        constraint_names: &[String],
    ) -> Self {
        SensitivityReport {
            shadow_prices: zip_named(constraint_names, &sensitivity.shadow_prices),
            slack_values: zip_named(constraint_names, &sensitivity.slack_values),
            reduced_costs: zip_named(variable_names, &sensitivity.reduced_costs),
            rhs_ranges: sensitivity.rhs_ranges.clone(),
            objective_ranges: sensitivity.objective_ranges.clone(),
        }
    }
}

fn zip_named(names: &[String], values: &[f64]) -> Vec<NamedValue> {
    names
        .iter()
        .zip(values)
        .map(|(name, &value)| NamedValue {
            name: name.clone(),
            value,
        })
        .collect()
}

impl Display for SensitivityReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "SENSITIVITY ANALYSIS REPORT")?;
        writeln!(f, "{}", "=".repeat(60))?;
        let sections = [
            ("SHADOW PRICES (Dual Values)", &self.shadow_prices),
            ("REDUCED COSTS", &self.reduced_costs),
            ("SLACK/SURPLUS VALUES", &self.slack_values),
        ];
        for (title, rows) in sections {
            writeln!(f)?;
            writeln!(f, "{title}")?;
            writeln!(f, "{}", "-".repeat(40))?;
            for row in rows {
                writeln!(f, "  {:.<30} {:>10.4}", row.name, row.value)?;
            }
        }
        Ok(())
    }
}

/// Compute the sensitivity analysis of an optimal tableau
pub(crate) fn analyze(
    problem: &LpProblem,
    form: &StandardForm,
    tableau: &Tableau,
    solution: &[f64],
    tolerance: f64,
) -> Sensitivity {
    let sense = problem.sense();
    let num_rows = form.num_rows();
    let num_structural = form.num_structural;

    let shadow_prices: Vec<f64> = (0..num_rows)
        .map(|i| {
            let identity = form.identity_columns[i];
            let minimization_dual = -form.row_signs[i] * tableau.reduced_cost(identity);
            clean(sense.canonical_sign() * minimization_dual, tolerance)
        })
        .collect();

    // Normalized rows give the same slack as the rows they came from
    let slack_values: Vec<f64> = (0..num_rows)
        .map(|i| {
            let lhs: f64 = (0..num_structural)
                .map(|j| form.columns[(i, j)] * solution[j])
                .sum();
            let b = form.rhs[i];
            let slack = match form.kinds[i] {
                ConstraintKind::LessEqual => b - lhs,
                ConstraintKind::GreaterEqual => lhs - b,
                ConstraintKind::Equal => 0.,
            };
            clean(slack, tolerance)
        })
        .collect();

    let reduced_costs: Vec<f64> = (0..num_structural)
        .map(|j| match tableau.basic_row(j) {
            Some(_) => 0.,
            None => clean(tableau.reduced_cost(j), tolerance),
        })
        .collect();

    let rhs_ranges = (0..num_rows)
        .map(|i| {
            let (allowable_increase, allowable_decrease) =
                rhs_range(form, tableau, i, tolerance);
            RhsRange {
                name: problem.constraint_names()[i].clone(),
                current_rhs: problem.rhs()[i],
                shadow_price: shadow_prices[i],
                allowable_increase,
                allowable_decrease,
            }
        })
        .collect();

    let objective_ranges = (0..num_structural)
        .map(|j| {
            let (allowable_increase, allowable_decrease) =
                objective_range(form, tableau, sense, j, tolerance);
            ObjectiveRange {
                name: problem.variable_names()[j].clone(),
                current_coefficient: problem.objective()[j],
                current_value: solution[j],
                allowable_increase,
                allowable_decrease,
            }
        })
        .collect();

    Sensitivity {
        shadow_prices,
        slack_values,
        reduced_costs,
        rhs_ranges,
        objective_ranges,
    }
}

/// Allowable (increase, decrease) of the rhs of row `i`, keeping every basic
/// variable non-negative
fn rhs_range(form: &StandardForm, tableau: &Tableau, i: usize, tolerance: f64) -> (f64, f64) {
    let column = form.identity_columns[i];
    let sign = form.row_signs[i];
    let mut increase = f64::INFINITY;
    let mut decrease = f64::INFINITY;
    for r in 0..form.num_rows() {
        let beta = sign * tableau.entry(r, column);
        let value = tableau.rhs(r).max(0.);
        if beta > tolerance {
            decrease = decrease.min(value / beta);
        } else if beta < -tolerance {
            increase = increase.min(value / -beta);
        }
    }
    (clean(increase, tolerance), clean(decrease, tolerance))
}

/// Allowable (increase, decrease) of the objective coefficient of variable `j`
fn objective_range(
    form: &StandardForm,
    tableau: &Tableau,
    sense: ObjectiveSense,
    j: usize,
    tolerance: f64,
) -> (f64, f64) {
    let Some(row) = tableau.basic_row(j) else {
        // A non-basic variable enters once its coefficient improves by its reduced cost
        let reduced = clean(tableau.reduced_cost(j).abs(), tolerance);
        return match sense {
            ObjectiveSense::Maximize => (reduced, f64::INFINITY),
            ObjectiveSense::Minimize => (f64::INFINITY, reduced),
        };
    };

    // Moving the minimization cost of a basic variable by delta shifts the reduced
    // cost of every non-basic column k by -delta * T[row, k]
    let mut up = f64::INFINITY;
    let mut down = f64::INFINITY;
    for k in 0..form.num_columns() {
        if form.is_artificial(k) || tableau.basic_row(k).is_some() {
            continue;
        }
        let alpha = tableau.entry(row, k);
        let reduced = tableau.reduced_cost(k).max(0.);
        if alpha > tolerance {
            up = up.min(reduced / alpha);
        } else if alpha < -tolerance {
            down = down.min(reduced / -alpha);
        }
    }
    let (up, down) = (clean(up, tolerance), clean(down, tolerance));
    match sense {
        ObjectiveSense::Minimize => (up, down),
        ObjectiveSense::Maximize => (down, up),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::SolverConfiguration;
    use crate::optimize::simplex::LpResult;
    use approx::assert_abs_diff_eq;

    fn dantzig() -> LpProblem {
        LpProblem::new(
            &[3., 5.],
            &[vec![1., 0.], vec![0., 2.], vec![3., 2.]],
            &[4., 12., 18.],
            true,
        )
        .unwrap()
        .with_variable_names(vec!["doors".to_string(), "windows".to_string()])
        .unwrap()
        .with_constraint_names(vec![
            "Plant 1".to_string(),
            "Plant 2".to_string(),
            "Plant 3".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn dantzig_rhs_ranges() {
        let result = dantzig().solve(&SolverConfiguration::default());
        let sensitivity = result.sensitivity.unwrap();
        let ranges = &sensitivity.rhs_ranges;
        assert_eq!(ranges[0].name, "Plant 1");
        assert!(ranges[0].allowable_increase.is_infinite());
        assert_abs_diff_eq!(ranges[0].allowable_decrease, 2., epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[1].shadow_price, 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[1].allowable_increase, 6., epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[1].allowable_decrease, 6., epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[2].allowable_increase, 6., epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[2].allowable_decrease, 6., epsilon = 1e-9);
    }

    #[test]
    fn dantzig_objective_ranges() {
        let result = dantzig().solve(&SolverConfiguration::default());
        let ranges = result.sensitivity.unwrap().objective_ranges;
        // c1 may range over [0, 7.5], c2 over [2, inf)
        assert_abs_diff_eq!(ranges[0].allowable_increase, 4.5, epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[0].allowable_decrease, 3., epsilon = 1e-9);
        assert!(ranges[1].allowable_increase.is_infinite());
        assert_abs_diff_eq!(ranges[1].allowable_decrease, 3., epsilon = 1e-9);
        assert_abs_diff_eq!(ranges[1].current_value, 6., epsilon = 1e-9);
    }

    #[test]
    fn non_basic_variable_ranges() {
        // minimize 2x + 3y subject to x + y >= 4, x <= 6; y stays at zero
        let problem =
            LpProblem::new(&[2., 3.], &[vec![-1., -1.], vec![1., 0.]], &[-4., 6.], false).unwrap();
        let result = problem.solve(&SolverConfiguration::default());
        let sensitivity = result.sensitivity.unwrap();
        assert_abs_diff_eq!(sensitivity.reduced_costs[1], 1., epsilon = 1e-9);
        let y = &sensitivity.objective_ranges[1];
        assert!(y.allowable_increase.is_infinite());
        assert_abs_diff_eq!(y.allowable_decrease, 1., epsilon = 1e-9);
        let x = &sensitivity.objective_ranges[0];
        assert_abs_diff_eq!(x.allowable_increase, 1., epsilon = 1e-9);
        assert_abs_diff_eq!(x.allowable_decrease, 2., epsilon = 1e-9);
    }

    #[test]
    fn negated_row_shadow_price() {
        let problem =
            LpProblem::new(&[2., 3.], &[vec![-1., -1.], vec![1., 0.]], &[-4., 6.], false).unwrap();
        let sensitivity = problem
            .solve(&SolverConfiguration::default())
            .sensitivity
            .unwrap();
        // Loosening -x - y <= -4 to -x - y <= -3 saves 2 per unit
        assert_abs_diff_eq!(sensitivity.shadow_prices[0], -2., epsilon = 1e-9);
        assert_abs_diff_eq!(sensitivity.shadow_prices[1], 0., epsilon = 1e-9);
        let range = &sensitivity.rhs_ranges[0];
        assert_abs_diff_eq!(range.allowable_increase, 4., epsilon = 1e-9);
        assert_abs_diff_eq!(range.allowable_decrease, 2., epsilon = 1e-9);
        // x = 4 leaves 2 spare on x <= 6, and the negated row is binding
        assert_abs_diff_eq!(sensitivity.slack_values[0], 0., epsilon = 1e-9);
        assert_abs_diff_eq!(sensitivity.slack_values[1], 2., epsilon = 1e-9);
    }

    #[test]
    fn report_tables() {
        let result = dantzig().solve(&SolverConfiguration::default());
        let report = result.sensitivity_report().unwrap();
        assert_eq!(report.shadow_prices.len(), 3);
        assert_eq!(report.reduced_costs.len(), 2);
        assert_eq!(report.shadow_prices[2].name, "Plant 3");
        assert_abs_diff_eq!(report.shadow_prices[2].value, 1., epsilon = 1e-9);
        assert_eq!(report.slack_values[0].name, "Plant 1");
        assert_abs_diff_eq!(report.slack_values[0].value, 2., epsilon = 1e-9);

        let text = report.to_string();
        assert!(text.contains("SENSITIVITY ANALYSIS REPORT"));
        assert!(text.contains("Plant 2"));
        assert!(text.contains("1.5000"));
    }

    #[test]
    fn report_serializes() {
        let result = dantzig().solve(&SolverConfiguration::default());
        let report = result.sensitivity_report().unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["objective_ranges"][0]["name"], "doors");
        assert_eq!(json["shadow_prices"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn infinite_ranges_survive_json() {
        let result = dantzig().solve(&SolverConfiguration::default());
        let text = serde_json::to_string(&result).unwrap();
        assert!(text.contains(r#""allowable_increase":"inf""#));
        assert!(!text.contains("null"));
        let read: LpResult = serde_json::from_str(&text).unwrap();
        assert_eq!(read.status, result.status);
        assert_eq!(read.variable_names, result.variable_names);
        assert_abs_diff_eq!(read.optimal_value, 36., epsilon = 1e-9);
        let ranges = &read.sensitivity.unwrap().rhs_ranges;
        assert!(ranges[0].allowable_increase.is_infinite());
        assert_abs_diff_eq!(ranges[0].allowable_decrease, 2., epsilon = 1e-9);

        let bad = r#"{"name": "c", "current_rhs": 1.0, "shadow_price": 0.0,
            "allowable_increase": "lots", "allowable_decrease": 0.5}"#;
        assert!(serde_json::from_str::<RhsRange>(bad).is_err());
        let negative = r#"{"name": "c", "current_rhs": 1.0, "shadow_price": 0.0,
            "allowable_increase": "-inf", "allowable_decrease": 3}"#;
        let range: RhsRange = serde_json::from_str(negative).unwrap();
        assert_eq!(range.allowable_increase, f64::NEG_INFINITY);
        assert_eq!(range.allowable_decrease, 3.);
    }
}
