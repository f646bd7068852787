use super::contribution::{RatioTable, TermSet};
use super::decomposer::{TermDecomposition, extract_terms};
use super::dispatcher::{DispatchMode, dispatch_2d, dispatch_3d};
use crate::symbolic::parse_expr::ParseError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::BindingError;
use crate::symbolic::symbolic_terms::sum_terms;
use log::{error, info, warn};
use nalgebra::{DMatrix, DVector};
use simplelog::LevelFilter;
use simplelog::*;
use std::fmt;
use std::time::{Duration, Instant};
use tabled::{builder::Builder, settings::Style};

/// Terms whose average contribution ratio is below this are removed.
pub const DEFAULT_RATIO_THRESHOLD: f64 = 0.05;

#[derive(Debug, Clone)]
pub enum PurificationError {
    Parse(ParseError),
    Binding(BindingError),
    Evaluation {
        term: String,
        row: usize,
        value: f64,
    },
    DegenerateData {
        total_rows: usize,
    },
    ShapeMismatch {
        trajectory: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
    WorkerPool {
        message: String,
    },
}

impl fmt::Display for PurificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurificationError::Parse(err) => write!(f, "failed to parse equation: {}", err),
            PurificationError::Binding(err) => write!(f, "variable binding failed: {}", err),
            PurificationError::Evaluation { term, row, value } => write!(
                f,
                "term '{}' evaluated to non-finite value {} at sample row {}",
                term, value, row
            ),
            PurificationError::DegenerateData { total_rows } => write!(
                f,
                "all {} sample rows have zero total magnitude, the average ratio is undefined",
                total_rows
            ),
            PurificationError::ShapeMismatch {
                trajectory,
                expected,
                found,
            } => write!(
                f,
                "trajectory {} has shape {:?}, expected {:?}",
                trajectory, found, expected
            ),
            PurificationError::WorkerPool { message } => {
                write!(f, "failed to build worker pool: {}", message)
            }
        }
    }
}

impl std::error::Error for PurificationError {}

impl From<ParseError> for PurificationError {
    fn from(error: ParseError) -> Self {
        PurificationError::Parse(error)
    }
}

impl From<BindingError> for PurificationError {
    fn from(error: BindingError) -> Self {
        PurificationError::Binding(error)
    }
}

/// Everything one purification call produces: the rebuilt equation plus the
/// diagnostic vectors behind the keep/drop decision.
#[derive(Debug, Clone)]
pub struct PurificationResult {
    pub purified: Expr,
    pub avg_ratio: DVector<f64>,
    pub full_terms: Vec<Expr>,
    pub pure_terms: Vec<Expr>,
    pub coefficients: Vec<f64>,
    pub kept_indices: Vec<usize>,
    pub degenerate_rows: Vec<usize>,
}

/// Decomposes an equation string into sorted terms, pure terms and
/// coefficients without touching any data.
pub fn extract(equation_text: &str) -> Result<TermDecomposition, ParseError> {
    extract_terms(equation_text)
}

fn purify_with<F>(
    equation_text: &str,
    variable_names: &[String],
    threshold: f64,
    dispatch: F,
) -> Result<PurificationResult, PurificationError>
where
    F: FnOnce(&TermSet) -> Result<RatioTable, PurificationError>,
{
    let decomposition = extract_terms(equation_text)?;
    let terms = TermSet::compile(&decomposition.full_terms, variable_names)?;
    let table = dispatch(&terms)?;
    if !table.degenerate_rows.is_empty() {
        warn!(
            "{} of {} sample rows have zero total magnitude and are excluded from the average",
            table.degenerate_rows.len(),
            table.ratios.nrows()
        );
    }
    let avg_ratio = table.average()?;
    let kept_indices: Vec<usize> = avg_ratio
        .iter()
        .enumerate()
        .filter(|(_, ratio)| **ratio >= threshold)
        .map(|(j, _)| j)
        .collect();
    let survivors: Vec<Expr> = kept_indices
        .iter()
        .map(|&j| decomposition.full_terms[j].clone())
        .collect();
    let purified = sum_terms(&survivors);
    Ok(PurificationResult {
        purified,
        avg_ratio,
        full_terms: decomposition.full_terms,
        pure_terms: decomposition.pure_terms,
        coefficients: decomposition.coefficients,
        kept_indices,
        degenerate_rows: table.degenerate_rows,
    })
}

/// One-shot purification over a 2D sample matrix (rows are samples, columns
/// follow `variable_names`). Terms with average ratio >= threshold survive.
pub fn purify_2d(
    equation_text: &str,
    data: &DMatrix<f64>,
    variable_names: &[String],
    threshold: f64,
) -> Result<PurificationResult, PurificationError> {
    purify_with(equation_text, variable_names, threshold, |terms| {
        dispatch_2d(terms, data)
    })
}

/// One-shot purification over a trajectory tensor; trajectories are
/// processed in the selected mode and contribute rows in trajectory order.
pub fn purify_3d(
    equation_text: &str,
    trajectories: &[DMatrix<f64>],
    variable_names: &[String],
    threshold: f64,
    mode: DispatchMode,
    max_workers: Option<usize>,
) -> Result<PurificationResult, PurificationError> {
    purify_with(equation_text, variable_names, threshold, |terms| {
        dispatch_3d(terms, trajectories, mode, max_workers)
    })
}

///  Example#1
/// ```
///  use RustedPurifier::purification::purifier::EquationPurifier;
/// use nalgebra::DMatrix;
/// //the shortest way to purify an equation
///    // first define the equation and the data sample
///    let mut purifier_instanse = EquationPurifier::new();
///    purifier_instanse.set_equation("0.5*x + 100*y", vec!["x".to_string(), "y".to_string()]);
///    purifier_instanse.loglevel = Some("off".to_string());
///    let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 1.5]);
///    // purify
///    let purified = purifier_instanse.purify_2d(&data).unwrap();
///    assert_eq!(purified.to_string(), "100*y");
///    println!("purified equation: {} \n", purified);
/// ```
/// Example#2
/// ```
///    // or through the free-function API...
///    use RustedPurifier::purification::purifier::purify_2d;
///    use nalgebra::DMatrix;
///    let names = vec!["x".to_string(), "y".to_string()];
///    let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 1.5]);
///    let result = purify_2d("0.5*x + 100*y", &data, &names, 0.05).unwrap();
///    assert_eq!(result.purified.to_string(), "100*y");
///    assert_eq!(result.kept_indices, vec![1]);
/// ```
pub struct EquationPurifier {
    pub eq_string: String,               // equation to purify
    pub variable_names: Vec<String>,     // vector of variables
    pub threshold: f64,                  // minimal average contribution ratio
    pub mode: DispatchMode,              // sequential or parallel trajectory dispatch
    pub max_workers: Option<usize>,      // worker bound for the parallel mode
    pub loglevel: Option<String>,

    pub full_terms: Vec<Expr>,           // sorted additive terms of the equation
    pub pure_terms: Vec<Expr>,           // terms with coefficients factored out
    pub coefficients: Vec<f64>,
    pub avg_ratio: DVector<f64>,         // average contribution ratio per term
    pub kept_indices: Vec<usize>,
    pub degenerate_rows: Vec<usize>,
    pub purified: Option<Expr>,          // result of the purification
    pub purify_time: Option<Duration>,
}

impl EquationPurifier {
    pub fn new() -> EquationPurifier {
        EquationPurifier {
            eq_string: String::new(),
            variable_names: Vec::new(),
            threshold: DEFAULT_RATIO_THRESHOLD,
            mode: DispatchMode::Sequential,
            max_workers: None,
            loglevel: Some("info".to_string()),
            full_terms: Vec::new(),
            pure_terms: Vec::new(),
            coefficients: Vec::new(),
            avg_ratio: DVector::zeros(0),
            kept_indices: Vec::new(),
            degenerate_rows: Vec::new(),
            purified: None,
            purify_time: None,
        }
    }
    ////////////////////////////SETTERS///////////////////////////////////////////////////////////////////
    /// Basic methods to set the equation and the purification parameters
    pub fn set_equation(&mut self, eq_string: &str, variable_names: Vec<String>) {
        assert!(
            !eq_string.trim().is_empty(),
            "Equation should not be empty."
        );
        assert!(
            !variable_names.is_empty(),
            "Vector of variables should not be empty."
        );
        self.eq_string = eq_string.to_string();
        self.variable_names = variable_names;
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        assert!(
            threshold.is_finite(),
            "Threshold should be a finite number."
        );
        self.threshold = threshold;
    }

    pub fn set_mode(&mut self, mode: DispatchMode, max_workers: Option<usize>) {
        self.mode = mode;
        self.max_workers = max_workers;
    }
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
    //                         main functions to start the purification and calculate statistics
    ////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

    pub fn purifier_2d(&mut self, data: &DMatrix<f64>) -> Result<Expr, PurificationError> {
        info!("purifying equation: {}", self.eq_string);
        let begin = Instant::now();
        let res = purify_2d(&self.eq_string, data, &self.variable_names, self.threshold);
        match res {
            Ok(result) => {
                let elapsed = begin.elapsed();
                info!("time elapsed: {:?}", elapsed);
                let purified = self.store_result(result, elapsed);
                self.calc_statistics();
                info!("purified equation: {}", purified);
                Ok(purified)
            }
            Err(err) => {
                error!("purification failed: {}", err);
                Err(err)
            }
        }
    }

    pub fn purifier_3d(&mut self, trajectories: &[DMatrix<f64>]) -> Result<Expr, PurificationError> {
        info!(
            "purifying equation: {} over {} trajectories, {} mode",
            self.eq_string,
            trajectories.len(),
            self.mode
        );
        let begin = Instant::now();
        let res = purify_3d(
            &self.eq_string,
            trajectories,
            &self.variable_names,
            self.threshold,
            self.mode,
            self.max_workers,
        );
        match res {
            Ok(result) => {
                let elapsed = begin.elapsed();
                info!("time elapsed: {:?}", elapsed);
                let purified = self.store_result(result, elapsed);
                self.calc_statistics();
                info!("purified equation: {}", purified);
                Ok(purified)
            }
            Err(err) => {
                error!("purification failed: {}", err);
                Err(err)
            }
        }
    }

    // wrapper around purifier_2d function to implement logging
    pub fn purify_2d(&mut self, data: &DMatrix<f64>) -> Result<Expr, PurificationError> {
        let is_logging_disabled = self
            .loglevel
            .as_ref()
            .map(|level| level == "off" || level == "none")
            .unwrap_or(false);

        if is_logging_disabled {
            self.purifier_2d(data)
        } else {
            let log_option = self.log_option();
            println!(" \n \n Purification started with loglevel: {}", log_option);
            let logger_instance = CombinedLogger::init(vec![TermLogger::new(
                log_option,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]);

            match logger_instance {
                Ok(()) => {
                    let res = self.purifier_2d(data);
                    info!(" \n \n Purification ended");
                    res
                }
                Err(_) => self.purifier_2d(data),
            }
        }
    }

    // wrapper around purifier_3d function to implement logging
    pub fn purify_3d(&mut self, trajectories: &[DMatrix<f64>]) -> Result<Expr, PurificationError> {
        let is_logging_disabled = self
            .loglevel
            .as_ref()
            .map(|level| level == "off" || level == "none")
            .unwrap_or(false);

        if is_logging_disabled {
            self.purifier_3d(trajectories)
        } else {
            let log_option = self.log_option();
            println!(" \n \n Purification started with loglevel: {}", log_option);
            let logger_instance = CombinedLogger::init(vec![TermLogger::new(
                log_option,
                Config::default(),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            )]);

            match logger_instance {
                Ok(()) => {
                    let res = self.purifier_3d(trajectories);
                    info!(" \n \n Purification ended");
                    res
                }
                Err(_) => self.purifier_3d(trajectories),
            }
        }
    }

    fn log_option(&self) -> LevelFilter {
        if let Some(level) = self.loglevel.clone() {
            match level.as_str() {
                "debug" => LevelFilter::Debug,
                "info" => LevelFilter::Info,
                "warn" => LevelFilter::Warn,
                "error" => LevelFilter::Error,
                _ => panic!("loglevel must be debug, info, warn or error"),
            }
        } else {
            LevelFilter::Info
        }
    }

    fn store_result(&mut self, result: PurificationResult, elapsed: Duration) -> Expr {
        self.full_terms = result.full_terms;
        self.pure_terms = result.pure_terms;
        self.coefficients = result.coefficients;
        self.avg_ratio = result.avg_ratio;
        self.kept_indices = result.kept_indices;
        self.degenerate_rows = result.degenerate_rows;
        self.purified = Some(result.purified.clone());
        self.purify_time = Some(elapsed);
        result.purified
    }

    pub fn get_result(&self) -> Option<(Expr, DVector<f64>)> {
        self.purified
            .clone()
            .map(|purified| (purified, self.avg_ratio.clone()))
    }

    fn calc_statistics(&self) {
        let mut builder = Builder::default();
        builder.push_record(["term", "coefficient", "avg ratio", "status"]);
        for i in 0..self.full_terms.len() {
            let status = if self.kept_indices.contains(&i) {
                "kept"
            } else {
                "dropped"
            };
            builder.push_record([
                self.pure_terms[i].to_string(),
                format!("{}", self.coefficients[i]),
                format!("{:.6}", self.avg_ratio[i]),
                status.to_string(),
            ]);
        }
        let mut table = builder.build();
        table.with(Style::modern_rounded());
        info!(
            "\n \n PURIFICATION STATISTICS (threshold {}) \n \n {}",
            self.threshold,
            table.to_string()
        );
    }
}

/////////////////////////////TESTS///////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_threshold() {
        assert_eq!(DEFAULT_RATIO_THRESHOLD, 0.05);
        let purifier = EquationPurifier::new();
        assert_eq!(purifier.threshold, DEFAULT_RATIO_THRESHOLD);
        assert_eq!(purifier.mode, DispatchMode::Sequential);
        assert!(purifier.get_result().is_none());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 2.0]);
        // both terms contribute exactly 0.5 at every row
        let kept = purify_2d("x + y", &data, &names(&["x", "y"]), 0.5).unwrap();
        assert_eq!(kept.purified.to_string(), "x + y");
        assert_eq!(kept.kept_indices, vec![0, 1]);
        let dropped = purify_2d("x + y", &data, &names(&["x", "y"]), 0.500001).unwrap();
        assert_eq!(dropped.purified.to_string(), "0");
        assert!(dropped.kept_indices.is_empty());
    }

    #[test]
    fn test_purified_sum_is_in_canonical_order() {
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.5, 2.0]);
        let result = purify_2d("y + 2*x", &data, &names(&["x", "y"]), 0.0).unwrap();
        assert_eq!(result.purified.to_string(), "2*x + y");
    }

    #[test]
    fn test_struct_api_stores_artifacts() {
        let mut purifier = EquationPurifier::new();
        purifier.set_equation("0.5*x + 100*y", names(&["x", "y"]));
        purifier.loglevel = Some("off".to_string());
        let data = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 1.5]);
        let purified = purifier.purify_2d(&data).unwrap();
        assert_eq!(purified.to_string(), "100*y");
        assert_eq!(purifier.full_terms.len(), 2);
        assert_eq!(purifier.kept_indices, vec![1]);
        assert!(purifier.degenerate_rows.is_empty());
        assert!(purifier.purify_time.is_some());
        let (stored, avg_ratio) = purifier.get_result().unwrap();
        assert_eq!(stored.to_string(), "100*y");
        assert_eq!(avg_ratio.len(), 2);
    }

    #[test]
    fn test_struct_api_3d_matches_free_function() {
        let trajectories = vec![
            DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 2.0, 1.5]),
            DMatrix::from_row_slice(2, 2, &[0.5, 0.9, 1.1, 1.2]),
        ];
        let mut purifier = EquationPurifier::new();
        purifier.set_equation("0.5*x + 100*y", names(&["x", "y"]));
        purifier.set_mode(DispatchMode::Parallel, Some(2));
        purifier.loglevel = Some("off".to_string());
        let purified = purifier.purify_3d(&trajectories).unwrap();
        let free = purify_3d(
            "0.5*x + 100*y",
            &trajectories,
            &names(&["x", "y"]),
            DEFAULT_RATIO_THRESHOLD,
            DispatchMode::Sequential,
            None,
        )
        .unwrap();
        assert_eq!(purified.to_string(), free.purified.to_string());
        assert_eq!(purifier.avg_ratio, free.avg_ratio);
    }

    #[test]
    fn test_unbound_variable_is_reported() {
        let mut purifier = EquationPurifier::new();
        purifier.set_equation("x + q", names(&["x"]));
        purifier.loglevel = Some("off".to_string());
        let data = DMatrix::from_row_slice(1, 1, &[1.0]);
        let result = purifier.purify_2d(&data);
        assert!(matches!(
            result,
            Err(PurificationError::Binding(BindingError::UnboundVariable { .. }))
        ));
        assert!(purifier.get_result().is_none());
    }

    #[test]
    fn test_extract_delegates_to_decomposer() {
        let decomposition = extract("3*y+2*sin(x)-3*x**2+2*x*y").unwrap();
        let rendered: Vec<String> = decomposition
            .full_terms
            .iter()
            .map(|t| t.to_string())
            .collect();
        assert_eq!(rendered, vec!["2*sin(x)", "-3*x**2", "2*x*y", "3*y"]);
    }
}
