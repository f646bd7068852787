// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_snake_case)]

use crate::Utils::data_io::{
    default_report_name, read_matrix_from_csv, save_matrix_to_csv, save_purification_report,
};
use crate::Utils::task_parser::parse_task_file;
use crate::purification::decomposer::extract_terms;
use crate::purification::dispatcher::DispatchMode;
use crate::purification::purifier::{EquationPurifier, purify_2d};
use nalgebra::DMatrix;
use rand::Rng;
use std::fs::File;
use std::io::Write;

// samples around the operating point of a discovered pendulum-length equation:
// x near 1, y near 100, z near 0.5
fn noisy_samples(samples: usize) -> DMatrix<f64> {
    let mut rng = rand::rng();
    let mut values = Vec::with_capacity(samples * 3);
    for _ in 0..samples {
        values.push(rng.random_range(0.9..1.1));
        values.push(rng.random_range(80.0..120.0));
        values.push(rng.random_range(0.4..0.6));
    }
    DMatrix::from_row_slice(samples, 3, &values)
}

#[allow(dead_code)]
pub fn purification_examples(example: usize) {
    match example {
        0 => {
            // TERM DECOMPOSITION
            // parse an equation produced by a regression run and split it into terms
            let input = "3*y+2*sin(x)-3*x**2+2*x*y";
            let decomposition = extract_terms(input).unwrap();
            println!("equation: {}", input);
            for i in 0..decomposition.len() {
                println!(
                    "term {}: full = {}, pure = {}, coefficient = {}",
                    i,
                    decomposition.full_terms[i],
                    decomposition.pure_terms[i],
                    decomposition.coefficients[i]
                );
            }
            // the term order is canonical, so a reshuffled equation decomposes identically
            let reshuffled = extract_terms("2*x*y - 3*x**2 + 2*sin(x) + 3*y").unwrap();
            assert_eq!(decomposition, reshuffled);
            println!("reshuffled equation gives the same decomposition \n");
        }
        1 => {
            // 2D PURIFICATION WITH THE FREE FUNCTION API
            let input = "-0.00638*x + 1.00926*x/z - 0.099*y/z + 0.33546*z - 10.33025";
            let names = vec!["x".to_string(), "y".to_string(), "z".to_string()];
            let data = noisy_samples(500);
            let result = purify_2d(input, &data, &names, 0.01).unwrap();
            println!("original equation: {}", input);
            for i in 0..result.full_terms.len() {
                let status = if result.kept_indices.contains(&i) {
                    "kept"
                } else {
                    "dropped"
                };
                println!(
                    "term {} with average contribution ratio {:.6} is {}",
                    result.full_terms[i], result.avg_ratio[i], status
                );
            }
            println!("purified equation: {} \n", result.purified);
        }
        2 => {
            // 3D PURIFICATION WITH THE STRUCT API, PARALLEL DISPATCH
            // eight trajectories of the same system, processed on four workers
            let input = "-0.00638*x + 1.00926*x/z - 0.099*y/z + 0.33546*z - 10.33025";
            let names = vec!["x".to_string(), "y".to_string(), "z".to_string()];
            let trajectories: Vec<DMatrix<f64>> = (0..8).map(|_| noisy_samples(250)).collect();
            let mut purifier_instanse = EquationPurifier::new();
            purifier_instanse.set_equation(input, names);
            purifier_instanse.set_threshold(0.01);
            purifier_instanse.set_mode(DispatchMode::Parallel, Some(4));
            let purified = purifier_instanse.purify_3d(&trajectories).unwrap();
            println!("purified equation: {}", purified);
            // the result and the per-term diagnostics stay on the struct
            let (stored, avg_ratio) = purifier_instanse.get_result().unwrap();
            println!(
                "stored result: {} with average ratios {:?}",
                stored,
                avg_ratio.as_slice()
            );
            println!("purification took {:?} \n", purifier_instanse.purify_time);
        }
        3 => {
            // TASK FILE AND CSV DRIVEN RUN
            // write a task file the way an external pipeline would hand it over
            let mut file = File::create("purification_task.txt").unwrap();
            writeln!(file, "purification").unwrap();
            writeln!(
                file,
                "  equation: -0.00638*x + 1.00926*x/z - 0.099*y/z + 0.33546*z - 10.33025"
            )
            .unwrap();
            writeln!(file, "  variables: x, y, z").unwrap();
            writeln!(file, "  threshold: 0.01").unwrap();
            writeln!(file, "  data: purification_samples.csv").unwrap();
            // and the sample matrix next to it
            let headers = vec!["x".to_string(), "y".to_string(), "z".to_string()];
            save_matrix_to_csv(&noisy_samples(400), &headers, "purification_samples.csv").unwrap();

            let task = parse_task_file("purification_task.txt").unwrap();
            let data_path = task.data_path.clone().unwrap();
            let (data, headers_read) = read_matrix_from_csv(&data_path).unwrap();
            println!("read {} samples of {:?}", data.nrows(), headers_read);
            let mut purifier_instanse = task.into_purifier();
            purifier_instanse.purify_2d(&data).unwrap();
            // persist the keep/drop verdicts with a timestamped name
            let terms: Vec<String> = purifier_instanse
                .pure_terms
                .iter()
                .map(|t| t.to_string())
                .collect();
            let report_name = default_report_name("purification_report");
            save_purification_report(
                &terms,
                &purifier_instanse.coefficients,
                &purifier_instanse.avg_ratio,
                &purifier_instanse.kept_indices,
                &report_name,
            )
            .unwrap();
            println!("report saved to {} \n", report_name);
        }
        _ => {
            println!("example not found");
        }
    }
    //_________________________________________________
}
