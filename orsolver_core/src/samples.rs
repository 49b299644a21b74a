//! Sample problems from a chemicals plant
//!
//! Each sample is a ready to solve problem with named rows and columns:
//! - [`production_planning`]: maximize profit over 10 products and 10 resources
//! - [`worker_assignment`]: assign 10 workers to 10 tasks maximizing efficiency
//! - [`plant_distribution`]: ship from 10 plants to 10 sites, supply exceeds demand

use crate::optimize::assignment::{AssignmentError, AssignmentProblem};
use crate::optimize::simplex::{LpError, LpProblem};
use crate::optimize::transportation::{TransportationError, TransportationProblem};
use crate::utils::names::default_names;

const RESOURCES: [&str; 10] = [
    "Raw Material A",
    "Raw Material B",
    "Production Line 1",
    "Production Line 2",
    "Storage",
    "Labor",
    "Quality Control",
    "Environmental",
    "Energy",
    "Packaging",
];

const WORKERS: [&str; 10] = [
    "Ali Khan",
    "Bilal Ahmed",
    "Chaudhry Imran",
    "Danish Malik",
    "Ejaz Shah",
    "Farhan Raza",
    "Ghulam Abbas",
    "Hassan Javed",
    "Irfan Siddiqui",
    "Junaid Tariq",
];

const TASKS: [&str; 10] = [
    "Mixing",
    "Heating",
    "Testing",
    "Packing",
    "Loading",
    "QC",
    "Maintenance",
    "Docs",
    "Safety",
    "Dispatch",
];

fn to_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Profit per ton of each product against the resources each ton consumes
pub fn production_planning() -> Result<LpProblem, LpError> {
    let profit = [
        5000., 7500., 4000., 3500., 6000., 4500., 8000., 3000., 9000., 8500.,
    ];
    let usage = [
        vec![2., 3., 1., 2., 1., 2., 3., 1., 2., 3.],
        vec![1., 2., 3., 1., 2., 1., 2., 3., 1., 2.],
        vec![3., 2., 4., 1., 2., 3., 1., 2., 4., 2.],
        vec![1., 2., 1., 3., 4., 2., 1., 2., 1., 3.],
        vec![1.; 10],
        vec![4., 5., 3., 4., 5., 3., 4., 5., 3., 4.],
        vec![0.5; 10],
        vec![0.1, 0.2, 0.15, 0.1, 0.2, 0.15, 0.1, 0.2, 0.15, 0.1],
        vec![10., 15., 8., 12., 10., 8., 15., 10., 12., 14.],
        vec![1., 2., 1., 1., 2., 1., 2., 1., 1., 2.],
    ];
    let capacity = [
        5000., 4000., 480., 400., 1000., 2000., 300., 100., 10000., 2500.,
    ];
    LpProblem::new(&profit, &usage, &capacity, true)?
        .with_variable_names(default_names("Product ", 10))?
        .with_constraint_names(to_names(&RESOURCES))
}

/// Efficiency of each worker at each task
pub fn worker_assignment() -> Result<AssignmentProblem, AssignmentError> {
    let efficiency = [
        vec![85., 70., 65., 80., 75., 90., 60., 50., 70., 65.],
        vec![75., 85., 70., 65., 80., 75., 70., 60., 65., 70.],
        vec![80., 75., 90., 70., 65., 80., 75., 55., 80., 60.],
        vec![65., 80., 75., 90., 70., 65., 80., 70., 75., 80.],
        vec![70., 65., 80., 75., 90., 70., 65., 75., 60., 85.],
        vec![90., 75., 70., 65., 80., 85., 70., 80., 65., 70.],
        vec![60., 90., 65., 80., 75., 70., 95., 65., 80., 75.],
        vec![55., 65., 80., 70., 85., 75., 70., 90., 70., 80.],
        vec![75., 70., 85., 75., 70., 80., 75., 70., 95., 65.],
        vec![70., 75., 60., 85., 80., 70., 80., 75., 70., 90.],
    ];
    AssignmentProblem::new(&efficiency, true)?
        .with_row_names(to_names(&WORKERS))?
        .with_col_names(to_names(&TASKS))
}

/// Shipping costs from plants to construction sites
///
/// Plants can supply 3900 tons but sites only need 2900, so solving adds a
/// dummy destination.
pub fn plant_distribution() -> Result<TransportationProblem, TransportationError> {
    let supply = [500., 400., 350., 450., 380., 420., 300., 360., 410., 330.];
    let demand = [200., 180., 300., 250., 350., 280., 320., 400., 290., 330.];
    let costs = [
        vec![45., 72., 35., 58., 62., 48., 55., 80., 42., 65.],
        vec![38., 65., 42., 52., 58., 45., 50., 75., 38., 60.],
        vec![55., 48., 58., 42., 45., 52., 48., 62., 55., 45.],
        vec![62., 55., 48., 38., 42., 55., 52., 58., 48., 42.],
        vec![70., 58., 52., 45., 38., 48., 45., 52., 55., 48.],
        vec![58., 52., 55., 48., 45., 35., 42., 48., 52., 55.],
        vec![85., 78., 72., 65., 58., 52., 45., 38., 65., 58.],
        vec![78., 72., 65., 58., 52., 48., 42., 45., 58., 55.],
        vec![72., 68., 62., 55., 48., 52., 48., 42., 52., 48.],
        vec![95., 88., 82., 75., 68., 62., 55., 48., 72., 65.],
    ];
    TransportationProblem::new(&supply, &demand, &costs)?
        .with_source_names(default_names("Plant ", 10))?
        .with_destination_names(default_names("Site ", 10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::SolverConfiguration;
    use approx::assert_relative_eq;

    #[test]
    fn production_planning_optimum() {
        let result = production_planning()
            .unwrap()
            .solve(&SolverConfiguration::default());
        assert!(result.success);
        assert_relative_eq!(
            result.optimal_value,
            3_226_666.666_666_667,
            max_relative = 1e-9
        );
        let named = result.named_solution();
        assert_relative_eq!(named["Product 7"], 373.333_333_333_333_3, max_relative = 1e-9);
        assert_relative_eq!(named["Product 9"], 26.666_666_666_666_67, max_relative = 1e-9);

        // Only the two production lines are binding
        let shadow = result.named_shadow_prices().unwrap();
        assert_relative_eq!(
            shadow["Production Line 1"],
            333.333_333_333_333_3,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            shadow["Production Line 2"],
            7_666.666_666_666_667,
            max_relative = 1e-9
        );
        assert_eq!(shadow["Storage"], 0.);
    }

    #[test]
    fn sample_names() {
        assert_eq!(production_planning().unwrap().constraint_names()[9], "Packaging");
        assert_eq!(worker_assignment().unwrap().col_names()[5], "QC");
        let distribution = plant_distribution().unwrap();
        assert_eq!(distribution.source_names()[0], "Plant 1");
        assert_eq!(distribution.destination_names()[9], "Site 10");
        let supply: f64 = distribution.supply().iter().sum();
        let demand: f64 = distribution.demand().iter().sum();
        assert_eq!((supply, demand), (3900., 2900.));
    }
}
