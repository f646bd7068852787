#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
/// decomposition of an equation string into canonically ordered additive terms
///
///# Example
/// ```
/// use RustedPurifier::purification::decomposer::extract_terms;
/// let decomposition = extract_terms("3*y+2*sin(x)-3*x**2+2*x*y").unwrap();
/// for i in 0..decomposition.len() {
///     println!(
///         "{} = {} * {}",
///         decomposition.full_terms[i], decomposition.coefficients[i], decomposition.pure_terms[i]
///     );
/// }
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod decomposer;
///____________________________________________________________________________________________________________________________
/// per-sample contribution ratios of every term: compile the term set once,
/// then each sample row yields the share of the row's total magnitude owned
/// by each term
///# Example#
/// ```
/// use RustedPurifier::purification::contribution::{TermSet, aggregate_matrix};
/// use RustedPurifier::symbolic::symbolic_engine::Expr;
/// use nalgebra::DMatrix;
/// let terms = vec![
///     Expr::parse_expression("x").unwrap(),
///     Expr::parse_expression("y").unwrap(),
/// ];
/// let names = vec!["x".to_string(), "y".to_string()];
/// let compiled = TermSet::compile(&terms, &names).unwrap();
/// let data = DMatrix::from_row_slice(1, 2, &[1.0, 3.0]);
/// let table = aggregate_matrix(&compiled, &data, 0).unwrap();
/// // the row splits 25% / 75% between x and y
/// println!("ratios {}", table.ratios);
/// ```
/// ________________________________________________________________________________________________________________________________________________
pub mod contribution;
///________________________________________________________________________________________________________________________________________________
///
/// sequential and parallel dispatch of the aggregation over trajectory tensors
/// Example#
/// ```
/// use RustedPurifier::purification::dispatcher::DispatchMode;
/// let mode: DispatchMode = "parallel".parse().unwrap();
/// assert_eq!(mode, DispatchMode::Parallel);
/// ```
pub mod dispatcher;
///______________________________________________________________________________________________________________________________________________
/// the purifier itself: decompose, evaluate, average, filter by threshold and
/// rebuild the equation from the surviving terms
///# Example#
/// ```
/// use RustedPurifier::purification::purifier::purify_3d;
/// use RustedPurifier::purification::dispatcher::DispatchMode;
/// use nalgebra::DMatrix;
/// let names = vec!["x".to_string(), "z".to_string()];
/// let trajectories = vec![
///     DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.9, 0.45]),
///     DMatrix::from_row_slice(2, 2, &[1.1, 0.55, 1.0, 0.5]),
/// ];
/// let result = purify_3d(
///     "1.00926*x/z - 0.00638*x",
///     &trajectories,
///     &names,
///     0.05,
///     DispatchMode::Parallel,
///     Some(2),
/// )
/// .unwrap();
/// // the x term contributes well under 5% at every sample
/// assert_eq!(result.purified.to_string(), "1.00926*x/z");
/// ```
/// _____________________________________________________________________________________________________________________________________________
pub mod purifier;
