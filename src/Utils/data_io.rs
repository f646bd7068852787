//! CSV interchange: sample matrices go in and out as CSV with a header row
//! naming the variables, and a finished purification can be saved as a small
//! per-term report.
use chrono::Local;
use csv::{Reader, Writer};
use nalgebra::{DMatrix, DVector};
use std::error::Error;
use std::fs::File;
use std::io;

/// Saves a sample matrix as CSV, one sample per line, with a header row of
/// variable names.
pub fn save_matrix_to_csv(
    matrix: &DMatrix<f64>,
    headers: &Vec<String>,
    filename: &str,
) -> io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(headers)?;
    for row in matrix.row_iter() {
        let row_data: Vec<String> = row.iter().map(|&val| val.to_string()).collect();
        writer.write_record(&row_data)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a sample matrix back: the header row becomes the variable names,
/// every following line one sample. Ragged lines and non-numeric cells are
/// errors.
pub fn read_matrix_from_csv(filename: &str) -> Result<(DMatrix<f64>, Vec<String>), Box<dyn Error>> {
    let mut reader = Reader::from_path(filename)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut values: Vec<f64> = Vec::new();
    let mut rows = 0;
    for record in reader.records() {
        let record = record?;
        for field in record.iter() {
            values.push(field.trim().parse::<f64>()?);
        }
        rows += 1;
    }
    let matrix = DMatrix::from_row_slice(rows, headers.len(), &values);
    Ok((matrix, headers))
}

/// Saves the per-term outcome of a purification: term, coefficient, average
/// contribution ratio and kept/dropped status.
pub fn save_purification_report(
    terms: &Vec<String>,
    coefficients: &Vec<f64>,
    avg_ratio: &DVector<f64>,
    kept_indices: &Vec<usize>,
    filename: &str,
) -> io::Result<()> {
    let file = File::create(filename)?;
    let mut writer = Writer::from_writer(file);
    writer.write_record(&["term", "coefficient", "avg_ratio", "status"])?;
    for i in 0..terms.len() {
        let status = if kept_indices.contains(&i) {
            "kept"
        } else {
            "dropped"
        };
        writer.write_record(&[
            terms[i].clone(),
            coefficients[i].to_string(),
            avg_ratio[i].to_string(),
            status.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn default_report_name(prefix: &str) -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("{}_{}.csv", prefix, date_and_time)
}

/////////////////////////////TESTS////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_matrix_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let path = path.to_str().unwrap();
        let matrix = DMatrix::from_row_slice(3, 2, &[1.0, 80.5, 0.95, 100.0, 1.1, 119.25]);
        let headers = vec!["x".to_string(), "y".to_string()];
        save_matrix_to_csv(&matrix, &headers, path).unwrap();
        let (read_back, read_headers) = read_matrix_from_csv(path).unwrap();
        // f64 Display round-trips exactly
        assert_eq!(read_back, matrix);
        assert_eq!(read_headers, headers);
    }

    #[test]
    fn test_read_empty_data_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let path = path.to_str().unwrap();
        let matrix = DMatrix::zeros(0, 3);
        let headers = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        save_matrix_to_csv(&matrix, &headers, path).unwrap();
        let (read_back, read_headers) = read_matrix_from_csv(path).unwrap();
        assert_eq!(read_back.nrows(), 0);
        assert_eq!(read_headers.len(), 3);
    }

    #[test]
    fn test_read_rejects_non_numeric_cell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "x,y\n1.0,oops\n").unwrap();
        let result = read_matrix_from_csv(path.to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_read_missing_file_fails() {
        assert!(read_matrix_from_csv("no_such_file.csv").is_err());
    }

    #[test]
    fn test_report_contains_statuses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let path = path.to_str().unwrap();
        let terms = vec!["x/z".to_string(), "x".to_string()];
        let coefficients = vec![1.00926, -0.00638];
        let avg_ratio = DVector::from_vec(vec![0.2, 0.001]);
        let kept_indices = vec![0];
        save_purification_report(&terms, &coefficients, &avg_ratio, &kept_indices, path).unwrap();
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("x/z,1.00926,0.2,kept"));
        assert!(contents.contains("x,-0.00638,0.001,dropped"));
    }

    #[test]
    fn test_default_report_name_is_stamped() {
        let name = default_report_name("purification");
        assert!(name.starts_with("purification_"));
        assert!(name.ends_with(".csv"));
    }
}
