//! CSV ingestion for the CLI: trial datasets and posterior draw tables.
//!
//! A draws table has one column per parameter and one row per retained
//! draw. A data table has a `wid` column plus covariates; columns where
//! every non-empty cell parses as a number load as numeric (empty cells
//! become `NaN`), all others load as categorical (empty cells become
//! `None`).

use std::path::Path;

use bf_core::{Column, Dataset, Error, PosteriorDrawSet, Result, SUBJECT_COLUMN};

/// Load a posterior draws table: header row of parameter names, one row
/// per draw, every cell numeric.
pub fn read_draws(path: &Path) -> Result<PosteriorDrawSet> {
    let mut reader = csv::Reader::from_path(path)?;
    let names: Vec<String> =
        reader.headers()?.iter().map(str::to_string).collect();
    if names.is_empty() {
        return Err(Error::Validation(format!("draws table '{}' has no columns", path.display())));
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != names.len() {
            return Err(Error::Validation(format!(
                "draws table '{}' row {} has {} fields, expected {}",
                path.display(),
                row_idx + 1,
                record.len(),
                names.len()
            )));
        }
        for (col, cell) in columns.iter_mut().zip(record.iter()) {
            let v = cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                Error::Validation(format!(
                    "draws table '{}' row {} has non-finite cell '{}'",
                    path.display(),
                    row_idx + 1,
                    cell
                ))
            })?;
            col.push(v);
        }
    }

    PosteriorDrawSet::new(names.into_iter().zip(columns).collect())
}

/// Load a trial dataset. The `wid` column is required; remaining columns
/// are typed by inspection.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> =
        reader.headers()?.iter().map(str::to_string).collect();
    let wid_idx = headers
        .iter()
        .position(|h| h == SUBJECT_COLUMN)
        .ok_or_else(|| {
            Error::Validation(format!(
                "dataset '{}' has no '{}' column",
                path.display(),
                SUBJECT_COLUMN
            ))
        })?;

    let mut wid: Vec<String> = Vec::new();
    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != headers.len() {
            return Err(Error::Validation(format!(
                "dataset '{}' row {} has {} fields, expected {}",
                path.display(),
                row_idx + 1,
                record.len(),
                headers.len()
            )));
        }
        wid.push(record[wid_idx].trim().to_string());
        for (col, cell) in cells.iter_mut().zip(record.iter()) {
            col.push(cell.trim().to_string());
        }
    }

    let mut data = Dataset::new(wid)?;
    for (i, name) in headers.iter().enumerate() {
        if i == wid_idx {
            continue;
        }
        data.add_column(name.clone(), infer_column(&cells[i]))?;
    }
    log::debug!("loaded {} rows from {}", data.n_rows(), path.display());
    Ok(data)
}

/// Numeric if every non-empty cell parses as f64, otherwise categorical.
fn infer_column(cells: &[String]) -> Column {
    let numeric: Option<Vec<f64>> = cells
        .iter()
        .map(|c| {
            if c.is_empty() {
                Some(f64::NAN)
            } else {
                c.parse::<f64>().ok()
            }
        })
        .collect();
    match numeric {
        Some(v) => Column::Numeric(v),
        None => Column::Categorical(
            cells
                .iter()
                .map(|c| if c.is_empty() { None } else { Some(c.clone()) })
                .collect(),
        ),
    }
}

/// Write a dataset back to CSV (missing entries as empty cells).
///
/// Written to a sibling temp file and renamed into place, so a mid-write
/// failure never leaves a truncated table at `path`.
pub fn write_dataset(path: &Path, data: &Dataset) -> Result<()> {
    let tmp = path.with_file_name(format!(
        "{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("data.csv")
    ));
    let result = write_dataset_to(&tmp, data);
    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        Error::Io(e)
    })
}

fn write_dataset_to(path: &Path, data: &Dataset) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let names = data.column_names();
    let mut header = vec![SUBJECT_COLUMN];
    header.extend(&names);
    writer.write_record(&header)?;

    for i in 0..data.n_rows() {
        let mut row = vec![data.subjects()[i].clone()];
        for name in &names {
            let cell = match data.column(name) {
                Some(Column::Numeric(v)) => {
                    if v[i].is_nan() {
                        String::new()
                    } else {
                        v[i].to_string()
                    }
                }
                Some(Column::Categorical(v)) => v[i].clone().unwrap_or_default(),
                None => String::new(),
            };
            row.push(cell);
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_draws() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "draws.csv",
            "b_Intercept,b_value,sigma\n0.1,1.0,0.9\n0.2,1.1,1.0\n",
        );
        let draws = read_draws(&path).unwrap();
        assert_eq!(draws.n_draws(), 2);
        assert_eq!(draws.draws_for("b_value").unwrap(), &[1.0, 1.1]);
    }

    #[test]
    fn test_read_draws_rejects_non_numeric() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "draws.csv", "a,b\n1.0,oops\n");
        assert!(read_draws(&path).is_err());
    }

    #[test]
    fn test_read_draws_rejects_non_finite() {
        // "NaN" and "inf" parse as f64 but are not valid draws.
        let dir = tempfile::tempdir().unwrap();
        for cell in ["NaN", "inf", "-inf"] {
            let path =
                write_file(dir.path(), "draws.csv", &format!("a,b\n1.0,{}\n", cell));
            let err = read_draws(&path);
            assert!(
                matches!(err, Err(bf_core::Error::Validation(_))),
                "cell '{}' must be rejected at ingestion",
                cell
            );
        }
    }

    #[test]
    fn test_read_dataset_type_inference() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "data.csv",
            "wid,value,multi_time\nw1,1.5,Before\nw2,,After\nw3,2.5,\n",
        );
        let data = read_dataset(&path).unwrap();
        assert_eq!(data.n_rows(), 3);
        let v = data.numeric("value").unwrap();
        assert_eq!(v[0], 1.5);
        assert!(v[1].is_nan());
        let t = data.categorical("multi_time").unwrap();
        assert_eq!(t[0].as_deref(), Some("Before"));
        assert!(t[2].is_none());
    }

    #[test]
    fn test_read_dataset_requires_wid() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.csv", "subject,value\nw1,1.0\n");
        assert!(read_dataset(&path).is_err());
    }

    #[test]
    fn test_dataset_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "data.csv",
            "wid,value,multi_time\nw1,1.5,Before\nw2,,After\n",
        );
        let data = read_dataset(&path).unwrap();
        let out = dir.path().join("out.csv");
        write_dataset(&out, &data).unwrap();
        let back = read_dataset(&out).unwrap();
        assert_eq!(back.n_rows(), 2);
        assert!(back.numeric("value").unwrap()[1].is_nan());
        assert_eq!(back.categorical("multi_time").unwrap()[1].as_deref(), Some("After"));
    }

    #[test]
    fn test_write_dataset_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.csv", "wid,value\nw1,1.0\n");
        let data = read_dataset(&path).unwrap();
        let out = dir.path().join("out.csv");
        write_dataset(&out, &data).unwrap();
        assert!(out.exists());
        // Only the input and the renamed output remain.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_write_dataset_replaces_existing_file_whole() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "data.csv", "wid,value\nw1,1.0\nw2,2.0\n");
        let data = read_dataset(&path).unwrap();
        let out = write_file(dir.path(), "out.csv", "stale contents");
        write_dataset(&out, &data).unwrap();
        let back = read_dataset(&out).unwrap();
        assert_eq!(back.n_rows(), 2);
    }
}
