//! Information display module for datasets and fit reports
//!
//! This module implements the `Display` trait for [`Dataset`] and [`FitReport`]
//! and provides helper functions to format their components as tables.

use std::fmt::{self, Display};

use tabled::{builder::Builder, settings::Style};

use crate::data::{Dataset, Experiment};
use crate::optim::report::{FitReport, TemperatureSummary};
use crate::parameters::{PARAM_NAMES, PARAM_UNITS};

/// Trait for converting report components to table records
trait TableRecord {
    /// Get the column headers for the table
    fn columns() -> Vec<String>;

    /// Convert the instance to a record for display in a table
    fn to_record(&self) -> Vec<String>;
}

impl TableRecord for Experiment {
    fn columns() -> Vec<String> {
        ["T [K]", "C0", "points", "t range [s]", "first C", "last C"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn to_record(&self) -> Vec<String> {
        let range = match (self.time().first(), self.time().last()) {
            (Some(first), Some(last)) => format!("{} - {}", first, last),
            _ => "-".to_string(),
        };
        let fmt_opt = |c: Option<&f64>| c.map_or("-".to_string(), |c| format!("{:.3}", c));

        vec![
            format!("{:.2}", self.temperature()),
            format!("{:.3}", self.initial_concentration()),
            self.len().to_string(),
            range,
            fmt_opt(self.concentration().first()),
            fmt_opt(self.concentration().last()),
        ]
    }
}

impl TableRecord for TemperatureSummary {
    fn columns() -> Vec<String> {
        ["T [K]", "kf [1/s]", "kr [1/s]", "Kc", "dG [kJ/mol]", "Ca,eq"]
            .iter()
            .map(|c| c.to_string())
            .collect()
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            format!("{:.2}", self.temperature),
            format!("{:.6e}", self.kf),
            format!("{:.6e}", self.kr),
            format!("{:.5}", self.kc),
            format!("{:.4}", self.dg / 1000.0),
            format!("{:.4}", self.equilibrium_concentration),
        ]
    }
}

/// Formats a slice of records as a rounded table
fn to_table<T: TableRecord>(records: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::columns());

    for record in records {
        builder.push_record(record.to_record());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

impl Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_table(&self.experiments))
    }
}

impl Display for FitReport {
    /// Formats the parameter estimates, fit metrics and per-temperature rates
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(vec![format!(
            "{} ({} iterations, {})",
            self.solver, self.iterations, self.termination
        )]);
        builder.push_record(vec!["Parameters".to_string()]);
        builder.push_record(vec![parameter_table(self)]);
        builder.push_record(vec!["Fit metrics".to_string()]);
        builder.push_record(vec![metrics_table(self)]);
        builder.push_record(vec!["Rate constants".to_string()]);
        builder.push_record(vec![to_table(&self.temperatures)]);

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{}", table)
    }
}

/// Starting guess, estimate, one-sigma error and 95 % interval per parameter
fn parameter_table(report: &FitReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec![
        "parameter",
        "unit",
        "initial",
        "estimate",
        "std. error",
        "95% CI",
    ]);

    let initial = report.initial_guess.to_array();
    let estimate = report.parameters.to_array();
    let errors = report.standard_errors.to_array();

    for i in 0..PARAM_NAMES.len() {
        let interval = report
            .confidence_intervals
            .get(i)
            .map_or("-".to_string(), |ci| format!("[{:.4}, {:.4}]", ci.lower, ci.upper));

        builder.push_record(vec![
            PARAM_NAMES[i].to_string(),
            PARAM_UNITS[i].to_string(),
            format!("{}", initial[i]),
            format!("{:.4}", estimate[i]),
            format!("{:.4}", errors[i]),
            interval,
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn metrics_table(report: &FitReport) -> String {
    let metrics = &report.metrics;
    let mut builder = Builder::default();
    builder.push_record(vec!["n", "dof", "SSE", "MSE", "RMSE", "AIC", "BIC"]);
    builder.push_record(vec![
        report.n_points.to_string(),
        report.dof.to_string(),
        format!("{:.6}", metrics.sse),
        format!("{:.6}", metrics.mse),
        format!("{:.6}", metrics.rmse),
        format!("{:.3}", metrics.aic),
        format!("{:.3}", metrics.bic),
    ]);

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}
