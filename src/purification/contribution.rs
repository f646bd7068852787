//! Per-sample contribution ratios. For every sample row the absolute value
//! of each term is computed, and each term's share of the row total is its
//! contribution ratio; a row where every term vanishes is degenerate and is
//! excluded from the averaged statistic.
use super::purifier::PurificationError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::{BindingError, Lambda, validate_variable_names};
use nalgebra::{DMatrix, DVector};

/// A set of terms compiled once against a variable-name list and reused for
/// every sample row. `rendered` keeps the canonical text of each term for
/// error reporting and statistics.
pub struct TermSet {
    pub lambdas: Vec<Lambda>,
    pub rendered: Vec<String>,
    pub variable_count: usize,
}

impl TermSet {
    /// Compiles every term against `variable_names`. Duplicate names and
    /// symbols absent from the list are binding errors.
    pub fn compile(terms: &[Expr], variable_names: &[String]) -> Result<TermSet, BindingError> {
        validate_variable_names(variable_names)?;
        let mut lambdas = Vec::with_capacity(terms.len());
        let mut rendered = Vec::with_capacity(terms.len());
        for term in terms {
            lambdas.push(term.compile(variable_names)?);
            rendered.push(term.to_string());
        }
        Ok(TermSet {
            lambdas,
            rendered,
            variable_count: variable_names.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.lambdas.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lambdas.is_empty()
    }
}

/// Contribution ratios of every term at every sample row. Row indices in
/// `degenerate_rows` are global (offset by the trajectory position when the
/// table is a block of a larger one); degenerate rows are zero-filled.
#[derive(Debug, Clone)]
pub struct RatioTable {
    pub ratios: DMatrix<f64>,
    pub degenerate_rows: Vec<usize>,
}

impl RatioTable {
    /// Column-wise mean of the ratio rows, degenerate rows excluded.
    /// Fails when every row is degenerate: the statistic is undefined.
    pub fn average(&self) -> Result<DVector<f64>, PurificationError> {
        let total_rows = self.ratios.nrows();
        let effective_rows = total_rows - self.degenerate_rows.len();
        if effective_rows == 0 {
            return Err(PurificationError::DegenerateData { total_rows });
        }
        // degenerate rows are zero-filled, so summing all rows is summing
        // the non-degenerate ones
        let mut averages = DVector::zeros(self.ratios.ncols());
        for i in 0..total_rows {
            for j in 0..self.ratios.ncols() {
                averages[j] += self.ratios[(i, j)];
            }
        }
        Ok(averages / effective_rows as f64)
    }
}

/// Computes the ratio block for one sample matrix. Row `i` of the block is
/// reported with global index `row_offset + i`. A term that evaluates to a
/// non-finite value fails the whole call.
pub fn aggregate_matrix(
    terms: &TermSet,
    data: &DMatrix<f64>,
    row_offset: usize,
) -> Result<RatioTable, PurificationError> {
    let rows = data.nrows();
    let columns = data.ncols();
    let term_count = terms.len();
    let mut ratios = DMatrix::zeros(rows, term_count);
    let mut degenerate_rows = Vec::new();
    // matrix rows are strided views, so each row is copied into a dense
    // buffer before evaluation
    let mut row_values = vec![0.0; columns];
    let mut magnitudes = vec![0.0; term_count];
    for i in 0..rows {
        for j in 0..columns {
            row_values[j] = data[(i, j)];
        }
        for j in 0..term_count {
            let value = terms.lambdas[j].eval(&row_values);
            if !value.is_finite() {
                return Err(PurificationError::Evaluation {
                    term: terms.rendered[j].clone(),
                    row: row_offset + i,
                    value,
                });
            }
            magnitudes[j] = value.abs();
        }
        let total: f64 = magnitudes.iter().sum();
        if total == 0.0 {
            degenerate_rows.push(row_offset + i);
        } else {
            for j in 0..term_count {
                ratios[(i, j)] = magnitudes[j] / total;
            }
        }
    }
    Ok(RatioTable {
        ratios,
        degenerate_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn term_set(equation_parts: &[&str], names: &[&str]) -> TermSet {
        let terms: Vec<Expr> = equation_parts
            .iter()
            .map(|text| Expr::parse_expression(text).unwrap())
            .collect();
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        TermSet::compile(&terms, &names).unwrap()
    }

    #[test]
    fn test_compile_keeps_rendered_terms() {
        let terms = term_set(&["2*sin(x)", "-3*x**2"], &["x"]);
        assert_eq!(terms.rendered, vec!["2*sin(x)", "-3*x**2"]);
        assert_eq!(terms.len(), 2);
        assert_eq!(terms.variable_count, 1);
    }

    #[test]
    fn test_compile_rejects_unknown_symbol() {
        let terms = vec![Expr::parse_expression("x + q").unwrap()];
        let names = vec!["x".to_string()];
        let result = TermSet::compile(&terms, &names);
        assert!(matches!(
            result,
            Err(BindingError::UnboundVariable { .. })
        ));
    }

    #[test]
    fn test_rows_sum_to_one() {
        let terms = term_set(&["x", "y", "x*y"], &["x", "y"]);
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, -0.5, 4.0, 3.0, 0.25]);
        let table = aggregate_matrix(&terms, &data, 0).unwrap();
        assert!(table.degenerate_rows.is_empty());
        for i in 0..3 {
            let row_sum: f64 = (0..3).map(|j| table.ratios[(i, j)]).sum();
            assert_relative_eq!(row_sum, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_ratios_are_magnitude_shares() {
        let terms = term_set(&["3*x", "y"], &["x", "y"]);
        let data = DMatrix::from_row_slice(1, 2, &[-1.0, 1.0]);
        let table = aggregate_matrix(&terms, &data, 0).unwrap();
        assert_relative_eq!(table.ratios[(0, 0)], 0.75);
        assert_relative_eq!(table.ratios[(0, 1)], 0.25);
    }

    #[test]
    fn test_degenerate_row_is_recorded_and_zero_filled() {
        let terms = term_set(&["x", "y"], &["x", "y"]);
        let data = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 0.0, 0.0, 3.0, 1.0]);
        let table = aggregate_matrix(&terms, &data, 0).unwrap();
        assert_eq!(table.degenerate_rows, vec![1]);
        assert_eq!(table.ratios[(1, 0)], 0.0);
        assert_eq!(table.ratios[(1, 1)], 0.0);
        let averages = table.average().unwrap();
        assert_relative_eq!(averages[0], 0.625);
        assert_relative_eq!(averages[1], 0.375);
    }

    #[test]
    fn test_row_offset_shifts_reported_indices() {
        let terms = term_set(&["x"], &["x"]);
        let data = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        let table = aggregate_matrix(&terms, &data, 10).unwrap();
        assert_eq!(table.degenerate_rows, vec![11]);
    }

    #[test]
    fn test_all_degenerate_average_fails() {
        let terms = term_set(&["x", "y"], &["x", "y"]);
        let data = DMatrix::zeros(2, 2);
        let table = aggregate_matrix(&terms, &data, 0).unwrap();
        assert_eq!(table.degenerate_rows, vec![0, 1]);
        assert!(matches!(
            table.average(),
            Err(PurificationError::DegenerateData { total_rows: 2 })
        ));
    }

    #[test]
    fn test_non_finite_term_fails_with_row_index() {
        let terms = term_set(&["1/x", "x"], &["x"]);
        let data = DMatrix::from_row_slice(2, 1, &[1.0, 0.0]);
        let result = aggregate_matrix(&terms, &data, 5);
        match result {
            Err(PurificationError::Evaluation { term, row, value }) => {
                assert_eq!(term, "1/x");
                assert_eq!(row, 6);
                assert!(value.is_infinite());
            }
            other => panic!("expected evaluation error, got {:?}", other),
        }
    }
}
