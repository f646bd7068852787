//! Dispatch of contribution aggregation over 2D sample matrices and 3D
//! trajectory tensors. A 3D tensor is a slice of per-trajectory matrices;
//! every trajectory is an independent task, executed sequentially or on a
//! bounded rayon pool, and the global table is assembled in trajectory
//! order so both modes produce bit-identical results.
use super::contribution::{RatioTable, TermSet, aggregate_matrix};
use super::purifier::PurificationError;
use crate::symbolic::symbolic_lambdify::BindingError;
use nalgebra::DMatrix;
use rayon::prelude::*;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DispatchMode {
    Sequential,
    Parallel,
}

/// Ratio table for a single sample matrix: one trajectory, rows in index
/// order.
pub fn dispatch_2d(terms: &TermSet, data: &DMatrix<f64>) -> Result<RatioTable, PurificationError> {
    if data.ncols() != terms.variable_count {
        return Err(PurificationError::Binding(BindingError::DimensionMismatch {
            expected: terms.variable_count,
            found: data.ncols(),
        }));
    }
    aggregate_matrix(terms, data, 0)
}

/// Ratio table for a trajectory tensor. Trajectory `t` occupies rows
/// `t * N .. (t + 1) * N` of the result regardless of execution mode or
/// completion order; a failed trajectory task fails the whole dispatch.
pub fn dispatch_3d(
    terms: &TermSet,
    trajectories: &[DMatrix<f64>],
    mode: DispatchMode,
    max_workers: Option<usize>,
) -> Result<RatioTable, PurificationError> {
    let samples = trajectories.first().map_or(0, |m| m.nrows());
    for (t, trajectory) in trajectories.iter().enumerate() {
        if trajectory.nrows() != samples || trajectory.ncols() != terms.variable_count {
            return Err(PurificationError::ShapeMismatch {
                trajectory: t,
                expected: (samples, terms.variable_count),
                found: trajectory.shape(),
            });
        }
    }
    let blocks = match mode {
        DispatchMode::Sequential => {
            let mut blocks = Vec::with_capacity(trajectories.len());
            for (t, trajectory) in trajectories.iter().enumerate() {
                blocks.push(aggregate_matrix(terms, trajectory, t * samples)?);
            }
            blocks
        }
        DispatchMode::Parallel => {
            let run = || {
                trajectories
                    .par_iter()
                    .enumerate()
                    .map(|(t, trajectory)| aggregate_matrix(terms, trajectory, t * samples))
                    .collect::<Result<Vec<RatioTable>, PurificationError>>()
            };
            match max_workers {
                Some(workers) => {
                    let pool = rayon::ThreadPoolBuilder::new()
                        .num_threads(workers)
                        .build()
                        .map_err(|e| PurificationError::WorkerPool {
                            message: e.to_string(),
                        })?;
                    pool.install(run)?
                }
                None => run()?,
            }
        }
    };
    Ok(assemble_blocks(blocks, samples, terms.len()))
}

// blocks arrive in trajectory order because the parallel collect is indexed
fn assemble_blocks(
    blocks: Vec<RatioTable>,
    samples_per_trajectory: usize,
    term_count: usize,
) -> RatioTable {
    let total_rows = blocks.len() * samples_per_trajectory;
    let mut ratios = DMatrix::zeros(total_rows, term_count);
    let mut degenerate_rows = Vec::new();
    for (t, block) in blocks.into_iter().enumerate() {
        let offset = t * samples_per_trajectory;
        for i in 0..samples_per_trajectory {
            for j in 0..term_count {
                ratios[(offset + i, j)] = block.ratios[(i, j)];
            }
        }
        degenerate_rows.extend(block.degenerate_rows);
    }
    RatioTable {
        ratios,
        degenerate_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::symbolic_engine::Expr;

    fn term_set(equation_parts: &[&str], names: &[&str]) -> TermSet {
        let terms: Vec<Expr> = equation_parts
            .iter()
            .map(|text| Expr::parse_expression(text).unwrap())
            .collect();
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        TermSet::compile(&terms, &names).unwrap()
    }

    fn sample_trajectories() -> Vec<DMatrix<f64>> {
        vec![
            DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 0.5, -1.0, 2.0, 0.25]),
            DMatrix::from_row_slice(3, 2, &[-3.0, 1.0, 0.1, 0.7, 1.5, 1.5]),
        ]
    }

    #[test]
    fn test_mode_parses_from_string() {
        assert_eq!("sequential".parse::<DispatchMode>().unwrap(), DispatchMode::Sequential);
        assert_eq!("Parallel".parse::<DispatchMode>().unwrap(), DispatchMode::Parallel);
        assert!("threads".parse::<DispatchMode>().is_err());
        assert_eq!(DispatchMode::Parallel.to_string(), "parallel");
    }

    #[test]
    fn test_2d_rejects_wrong_width() {
        let terms = term_set(&["x", "y"], &["x", "y"]);
        let data = DMatrix::from_row_slice(2, 3, &[1.0; 6]);
        let result = dispatch_2d(&terms, &data);
        assert!(matches!(
            result,
            Err(PurificationError::Binding(BindingError::DimensionMismatch {
                expected: 2,
                found: 3,
            }))
        ));
    }

    #[test]
    fn test_3d_rows_are_laid_out_by_trajectory() {
        let terms = term_set(&["x", "y"], &["x", "y"]);
        let trajectories = sample_trajectories();
        let table = dispatch_3d(&terms, &trajectories, DispatchMode::Sequential, None).unwrap();
        assert_eq!(table.ratios.nrows(), 6);
        // row 3 is the first row of the second trajectory
        let expected = aggregate_matrix(&terms, &trajectories[1], 0).unwrap();
        for j in 0..2 {
            assert_eq!(table.ratios[(3, j)], expected.ratios[(0, j)]);
        }
    }

    #[test]
    fn test_sequential_and_parallel_match_exactly() {
        let terms = term_set(&["2*x", "y", "x*y"], &["x", "y"]);
        let trajectories = sample_trajectories();
        let sequential =
            dispatch_3d(&terms, &trajectories, DispatchMode::Sequential, None).unwrap();
        let parallel = dispatch_3d(&terms, &trajectories, DispatchMode::Parallel, None).unwrap();
        assert_eq!(sequential.ratios, parallel.ratios);
        assert_eq!(sequential.degenerate_rows, parallel.degenerate_rows);
        let bounded = dispatch_3d(&terms, &trajectories, DispatchMode::Parallel, Some(2)).unwrap();
        assert_eq!(sequential.ratios, bounded.ratios);
    }

    #[test]
    fn test_3d_rejects_ragged_trajectories() {
        let terms = term_set(&["x", "y"], &["x", "y"]);
        let trajectories = vec![DMatrix::zeros(3, 2), DMatrix::zeros(2, 2)];
        let result = dispatch_3d(&terms, &trajectories, DispatchMode::Sequential, None);
        assert!(matches!(
            result,
            Err(PurificationError::ShapeMismatch { trajectory: 1, .. })
        ));
    }

    #[test]
    fn test_parallel_failure_propagates() {
        let terms = term_set(&["1/x"], &["x"]);
        let trajectories = vec![
            DMatrix::from_row_slice(2, 1, &[1.0, 2.0]),
            DMatrix::from_row_slice(2, 1, &[1.0, 0.0]),
        ];
        let result = dispatch_3d(&terms, &trajectories, DispatchMode::Parallel, Some(2));
        match result {
            Err(PurificationError::Evaluation { row, .. }) => assert_eq!(row, 3),
            other => panic!("expected evaluation error, got {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_indices_are_global() {
        let terms = term_set(&["x"], &["x"]);
        let trajectories = vec![
            DMatrix::from_row_slice(2, 1, &[1.0, 2.0]),
            DMatrix::from_row_slice(2, 1, &[0.0, 2.0]),
        ];
        let table = dispatch_3d(&terms, &trajectories, DispatchMode::Sequential, None).unwrap();
        assert_eq!(table.degenerate_rows, vec![2]);
    }
}
