use std::collections::HashMap;
use std::io::Cursor;
use std::time::Instant;

use calamine::{Reader, Xlsx};
use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::domain::{ProfilerError, MAX_FILESIZE_MB};

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

/// Raw upload as it arrives from the browser. Lives for one request.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        UploadedFile {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / (1024.0 * 1024.0)
    }

    fn kind(&self) -> Option<FileKind> {
        let ext = self.filename.rsplit_once('.').map(|(_, e)| e.to_uppercase());
        match ext.as_deref() {
            Some("CSV") => Some(FileKind::Csv),
            Some("XLSX") => Some(FileKind::Xlsx),
            _ => None,
        }
    }

    /// Extension and size gate. Anything else about the file is left to the
    /// parsers.
    pub fn validate(&self) -> Result<FileKind, ProfilerError> {
        let kind = self.kind().ok_or(ProfilerError::UnsupportedFileType)?;
        let size = self.size_mb();
        if size > MAX_FILESIZE_MB {
            return Err(ProfilerError::FileTooLarge(size));
        }
        Ok(kind)
    }
}

/// A parsed table plus the workbook context it came from. `sheets` is empty
/// for CSV uploads.
pub struct LoadedTable {
    pub frame: DataFrame,
    pub sheets: Vec<String>,
    pub sheet: Option<String>,
}

/// Validate and parse an upload. For workbooks the requested sheet is used,
/// falling back to the first one.
pub fn load_table(file: &UploadedFile, sheet: Option<&str>) -> Result<LoadedTable, ProfilerError> {
    let kind = file.validate()?;
    let start_time = Instant::now();
    let loaded = match kind {
        FileKind::Csv => LoadedTable {
            frame: read_csv_bytes(&file.bytes)?,
            sheets: Vec::new(),
            sheet: None,
        },
        FileKind::Xlsx => read_xlsx_bytes(&file.bytes, sheet)?,
    };
    if loaded.frame.width() == 0 {
        return Err(ProfilerError::EmptyTable);
    }
    info!(
        "Loaded \"{}\" ({} rows x {} columns) in {}ms",
        file.filename,
        loaded.frame.height(),
        loaded.frame.width(),
        start_time.elapsed().as_millis()
    );
    Ok(loaded)
}

fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame, ProfilerError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;
    Ok(df)
}

fn read_xlsx_bytes(bytes: &[u8], sheet: Option<&str>) -> Result<LoadedTable, ProfilerError> {
    use calamine::DataType;

    let mut workbook: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ProfilerError::ExcelParse(e.to_string()))?;
    let sheets = workbook.sheet_names().to_owned();
    if sheets.is_empty() {
        return Err(ProfilerError::ExcelParse(
            "workbook contains no sheets".to_string(),
        ));
    }
    let chosen = match sheet {
        Some(name) => {
            if !sheets.iter().any(|s| s == name) {
                return Err(ProfilerError::UnknownSheet(name.to_string()));
            }
            name.to_string()
        }
        None => sheets[0].clone(),
    };
    let range = workbook
        .worksheet_range(&chosen)
        .map_err(|e| ProfilerError::ExcelParse(e.to_string()))?;

    // Feed the sheet through the CSV reader so both formats share one
    // inference path.
    let mut csv_lines = Vec::new();
    for row in range.rows() {
        let line = row
            .iter()
            .map(|cell| {
                let value = cell
                    .as_string()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("{}", cell));
                wrap_cell_content(&value)
            })
            .collect::<Vec<_>>()
            .join(",");
        csv_lines.push(line);
    }
    if csv_lines.is_empty() {
        return Err(ProfilerError::EmptyTable);
    }
    let frame = read_csv_bytes(csv_lines.join("\n").as_bytes())?;
    Ok(LoadedTable {
        frame,
        sheets,
        sheet: Some(chosen),
    })
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = needs_escaping || c.contains(',') || c.contains('\n');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// One fully materialized column. Cells are held twice: stringified for
/// previews and counting, and as floats when the source dtype is numeric.
pub struct ColumnProfile {
    pub name: String,
    pub dtype: String,
    pub numeric: bool,
    pub non_null: usize,
    pub null_count: usize,
    pub null_pct: f64,
    pub unique: usize,
    pub values: Vec<Option<String>>,
    pub numbers: Vec<Option<f64>>,
}

/// Descriptive statistics of one numeric column, pandas `describe()` layout.
pub struct NumericSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub struct Histogram {
    pub name: String,
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Five number summary plus IQR whiskers.
pub struct BoxStats {
    pub name: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: usize,
}

pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub group: Option<String>,
}

/// Everything the report renderer needs, computed once per request.
pub struct Profile {
    pub filename: String,
    pub sheet: Option<String>,
    pub sheets: Vec<String>,
    pub n_rows: usize,
    pub n_cols: usize,
    pub columns: Vec<ColumnProfile>,
}

impl Profile {
    pub fn from_table(filename: &str, table: &LoadedTable) -> Result<Self, ProfilerError> {
        let start_time = Instant::now();
        let df = &table.frame;

        let c_: Result<Vec<ColumnProfile>, PolarsError> = df
            .get_column_names()
            .par_iter()
            .map(|name| Self::profile_column(df, name.as_str()))
            .collect();
        let columns = c_?;

        let profiling_duration = start_time.elapsed().as_millis();
        info!("Profiling took {profiling_duration}ms ...");
        for c in columns.iter() {
            debug!(
                "Column \"{}\": {}, {} nulls, {} unique",
                c.name, c.dtype, c.null_count, c.unique
            );
        }

        Ok(Profile {
            filename: filename.to_string(),
            sheet: table.sheet.clone(),
            sheets: table.sheets.clone(),
            n_rows: df.height(),
            n_cols: df.width(),
            columns,
        })
    }

    fn profile_column(df: &DataFrame, col_name: &str) -> Result<ColumnProfile, PolarsError> {
        let original_dtype = df.column(col_name)?.dtype().clone();
        let numeric = is_numeric_type(&original_dtype);

        let col = df.column(col_name)?.cast(&DataType::String)?;
        let series = col.str()?;
        let mut values = Vec::with_capacity(series.len());
        for value in series.into_iter() {
            values.push(value.map(|s| s.to_string()));
        }

        let numbers = if numeric {
            let col = df.column(col_name)?.cast(&DataType::Float64)?;
            col.f64()?.into_iter().collect()
        } else {
            Vec::new()
        };

        let null_count = values.iter().filter(|v| v.is_none()).count();
        let non_null = values.len() - null_count;
        let null_pct = if values.is_empty() {
            0.0
        } else {
            round2(null_count as f64 * 100.0 / values.len() as f64)
        };
        let unique = values
            .iter()
            .flatten()
            .collect::<std::collections::HashSet<_>>()
            .len();

        Ok(ColumnProfile {
            name: col_name.to_string(),
            dtype: format!("{:?}", original_dtype),
            numeric,
            non_null,
            null_count,
            null_pct,
            unique,
            values,
            numbers,
        })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.iter().filter(|c| c.numeric).collect()
    }

    pub fn categorical_columns(&self) -> Vec<&ColumnProfile> {
        self.columns.iter().filter(|c| !c.numeric).collect()
    }

    /// Head rows for the preview table. Nulls render as `∅`.
    pub fn preview(&self, n: usize) -> (Vec<String>, Vec<Vec<String>>) {
        let header = self.columns.iter().map(|c| c.name.clone()).collect();
        let nrows = std::cmp::min(n, self.n_rows);
        let rows = (0..nrows)
            .map(|r| {
                self.columns
                    .iter()
                    .map(|c| c.values[r].clone().unwrap_or_else(|| "∅".to_string()))
                    .collect()
            })
            .collect();
        (header, rows)
    }

    pub fn describe(&self) -> Vec<NumericSummary> {
        self.numeric_columns()
            .into_iter()
            .map(|c| {
                let data = sorted_values(&c.numbers);
                NumericSummary {
                    name: c.name.clone(),
                    count: data.len(),
                    mean: mean(&data),
                    std: std_dev(&data),
                    min: data.first().copied(),
                    q25: quantile(&data, 0.25),
                    median: quantile(&data, 0.5),
                    q75: quantile(&data, 0.75),
                    max: data.last().copied(),
                }
            })
            .collect()
    }

    /// Missing value share per column, only for columns that have any.
    pub fn missing(&self) -> Vec<(String, f64)> {
        self.columns
            .iter()
            .filter(|c| c.null_count > 0)
            .map(|c| (c.name.clone(), c.null_pct))
            .collect()
    }

    pub fn histogram(&self, name: &str, bins: usize) -> Option<Histogram> {
        let column = self.column(name).filter(|c| c.numeric)?;
        let data = sorted_values(&column.numbers);
        if data.is_empty() || bins == 0 {
            return None;
        }
        let lo = data[0];
        let hi = data[data.len() - 1];
        let width = if hi > lo { (hi - lo) / bins as f64 } else { 1.0 };

        let mut counts = vec![0usize; bins];
        for &v in data.iter() {
            let mut idx = ((v - lo) / width) as usize;
            if idx >= bins {
                idx = bins - 1; // upper edge belongs to the last bin
            }
            counts[idx] += 1;
        }
        let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
        Some(Histogram {
            name: name.to_string(),
            edges,
            counts,
        })
    }

    pub fn box_stats(&self, name: &str) -> Option<BoxStats> {
        let column = self.column(name).filter(|c| c.numeric)?;
        let data = sorted_values(&column.numbers);
        if data.is_empty() {
            return None;
        }
        let q1 = quantile(&data, 0.25)?;
        let median = quantile(&data, 0.5)?;
        let q3 = quantile(&data, 0.75)?;
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;
        let whisker_low = data.iter().copied().find(|&v| v >= lo_fence).unwrap_or(q1);
        let whisker_high = data
            .iter()
            .rev()
            .copied()
            .find(|&v| v <= hi_fence)
            .unwrap_or(q3);
        let outliers = data
            .iter()
            .filter(|&&v| v < lo_fence || v > hi_fence)
            .count();
        Some(BoxStats {
            name: name.to_string(),
            min: data[0],
            q1,
            median,
            q3,
            max: data[data.len() - 1],
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// Pearson correlation over all numeric columns, pairwise null dropping.
    /// `None` cells mark pairs with fewer than two complete rows or zero
    /// variance.
    pub fn correlation(&self) -> (Vec<String>, Vec<Vec<Option<f64>>>) {
        let numeric = self.numeric_columns();
        let names = numeric.iter().map(|c| c.name.clone()).collect();
        let matrix = numeric
            .iter()
            .map(|a| {
                numeric
                    .iter()
                    .map(|b| pearson(&a.numbers, &b.numbers))
                    .collect()
            })
            .collect();
        (names, matrix)
    }

    /// Value counts of one column, descending, nulls excluded. Returns
    /// (value, count, share in percent).
    pub fn value_counts(&self, name: &str, limit: usize) -> Option<Vec<(String, usize, f64)>> {
        let column = self.column(name)?;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for value in column.values.iter().flatten() {
            *counts.entry(value.as_str()).or_insert(0) += 1;
        }
        let total: usize = counts.values().sum();
        if total == 0 {
            return Some(Vec::new());
        }
        let mut sorted: Vec<(usize, &str)> = counts.into_iter().map(|(k, v)| (v, k)).collect();
        // Sort by count descending, value ascending for stable output.
        sorted.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(b.1)));
        Some(
            sorted
                .into_iter()
                .take(limit)
                .map(|(count, value)| {
                    (
                        value.to_string(),
                        count,
                        round2(count as f64 * 100.0 / total as f64),
                    )
                })
                .collect(),
        )
    }

    /// Complete (x, y) pairs for a scatter plot, optionally tagged with the
    /// value of a categorical color column.
    pub fn scatter(
        &self,
        x: &str,
        y: &str,
        color: Option<&str>,
        limit: usize,
    ) -> Option<Vec<ScatterPoint>> {
        let cx = self.column(x).filter(|c| c.numeric)?;
        let cy = self.column(y).filter(|c| c.numeric)?;
        let groups = color.and_then(|name| self.column(name)).map(|c| &c.values);

        let mut points = Vec::new();
        for r in 0..self.n_rows {
            if points.len() >= limit {
                break;
            }
            if let (Some(xv), Some(yv)) = (cx.numbers[r], cy.numbers[r]) {
                // Infinities would blow up the axis span, drop them like the
                // other statistics do.
                if !xv.is_finite() || !yv.is_finite() {
                    continue;
                }
                let group = groups
                    .map(|values| values[r].clone().unwrap_or_else(|| "∅".to_string()));
                points.push(ScatterPoint {
                    x: xv,
                    y: yv,
                    group,
                });
            }
        }
        Some(points)
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn sorted_values(numbers: &[Option<f64>]) -> Vec<f64> {
    let mut data: Vec<f64> = numbers
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    data.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    data
}

fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

// Sample standard deviation (ddof = 1), undefined below two values.
fn std_dev(data: &[f64]) -> Option<f64> {
    if data.len() < 2 {
        return None;
    }
    let m = mean(data)?;
    let var = data.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (data.len() - 1) as f64;
    Some(var.sqrt())
}

// Linear interpolation between closest ranks, matching pandas describe().
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in pairs {
        cov += (x - mx) * (y - my);
        vx += (x - mx) * (x - mx);
        vy += (y - my) * (y - my);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_file(content: &str) -> UploadedFile {
        UploadedFile::new("data.csv", content.as_bytes().to_vec())
    }

    fn profile(content: &str) -> Profile {
        let file = csv_file(content);
        let table = load_table(&file, None).unwrap();
        Profile::from_table(&file.filename, &table).unwrap()
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = UploadedFile::new("data.txt", b"a,b\n1,2\n".to_vec());
        assert!(matches!(
            file.validate(),
            Err(ProfilerError::UnsupportedFileType)
        ));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let file = UploadedFile::new("DATA.CSV", b"a\n1\n".to_vec());
        assert_eq!(file.validate().unwrap(), FileKind::Csv);
        let file = UploadedFile::new("book.XlSx", vec![0; 16]);
        assert_eq!(file.validate().unwrap(), FileKind::Xlsx);
    }

    #[test]
    fn rejects_oversized_file() {
        let file = UploadedFile::new("big.csv", vec![b'x'; 11 * 1024 * 1024]);
        match file.validate() {
            Err(ProfilerError::FileTooLarge(size)) => assert!(size > 10.0 && size < 12.0),
            other => panic!("expected FileTooLarge, got {:?}", other.err()),
        }
    }

    #[test]
    fn malformed_xlsx_reports_parse_error() {
        let file = UploadedFile::new("book.xlsx", b"this is not a zip archive".to_vec());
        assert!(matches!(
            load_table(&file, None),
            Err(ProfilerError::ExcelParse(_))
        ));
    }

    #[test]
    fn csv_shape_and_column_info() {
        let p = profile("age,city\n30,Rome\n,Paris\n25,Rome\n");
        assert_eq!(p.n_rows, 3);
        assert_eq!(p.n_cols, 2);
        assert_eq!(p.columns.len(), 2);

        let age = p.column("age").unwrap();
        assert!(age.numeric);
        assert_eq!(age.null_count, 1);
        assert_eq!(age.non_null, 2);
        assert_eq!(age.null_pct, 33.33);
        assert_eq!(age.unique, 2);

        let city = p.column("city").unwrap();
        assert!(!city.numeric);
        assert_eq!(city.null_count, 0);
        assert_eq!(city.unique, 2);
    }

    #[test]
    fn describe_matches_pandas_layout() {
        let p = profile("v\n1\n2\n3\n4\n");
        let stats = p.describe();
        assert_eq!(stats.len(), 1);
        let s = &stats[0];
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(4.0));
        assert_eq!(s.q25, Some(1.75));
        assert_eq!(s.median, Some(2.5));
        assert_eq!(s.q75, Some(3.25));
        let std = s.std.unwrap();
        assert!((std - 1.2909944487358056).abs() < 1e-9);
    }

    #[test]
    fn missing_is_empty_for_complete_data() {
        let p = profile("a,b\n1,x\n2,y\n");
        assert!(p.missing().is_empty());

        let p = profile("a,b\n1,x\n,y\n");
        let missing = p.missing();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].0, "a");
        assert_eq!(missing[0].1, 50.0);
    }

    #[test]
    fn histogram_covers_all_values() {
        let p = profile("v\n1\n2\n3\n4\n5\n6\n7\n8\n9\n10\n");
        let hist = p.histogram("v", 5).unwrap();
        assert_eq!(hist.counts.len(), 5);
        assert_eq!(hist.edges.len(), 6);
        assert_eq!(hist.counts.iter().sum::<usize>(), 10);
        assert_eq!(hist.counts, vec![2, 2, 2, 2, 2]);
    }

    #[test]
    fn histogram_of_constant_column() {
        let p = profile("v\n3\n3\n3\n");
        let hist = p.histogram("v", 4).unwrap();
        assert_eq!(hist.counts.iter().sum::<usize>(), 3);
    }

    #[test]
    fn box_stats_five_numbers() {
        let p = profile("v\n1\n2\n3\n4\n100\n");
        let b = p.box_stats("v").unwrap();
        assert_eq!(b.min, 1.0);
        assert_eq!(b.max, 100.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.outliers, 1);
        assert!(b.whisker_high < 100.0);
    }

    #[test]
    fn correlation_of_linear_columns() {
        let p = profile("a,b,c\n1,2,5\n2,4,1\n3,6,9\n4,8,2\n");
        let (names, matrix) = p.correlation();
        assert_eq!(names, vec!["a", "b", "c"]);
        let ab = matrix[0][1].unwrap();
        assert!((ab - 1.0).abs() < 1e-9);
        let aa = matrix[0][0].unwrap();
        assert!((aa - 1.0).abs() < 1e-9);
    }

    #[test]
    fn value_counts_sorted_and_limited() {
        let p = profile("city\nRome\nParis\nRome\nOslo\nRome\nParis\n");
        let counts = p.value_counts("city", 2).unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].0, "Rome");
        assert_eq!(counts[0].1, 3);
        assert_eq!(counts[0].2, 50.0);
        assert_eq!(counts[1].0, "Paris");
    }

    #[test]
    fn scatter_drops_incomplete_rows() {
        let p = profile("x,y,g\n1,2,a\n2,,b\n3,6,a\n");
        let points = p.scatter("x", "y", Some("g"), 100).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].group.as_deref(), Some("a"));
    }

    #[test]
    fn scatter_skips_non_finite_values() {
        let p = profile("x,y\n1,2\ninf,4\n3,6\n-inf,8\n");
        let points = p.scatter("x", "y", None, 100).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn preview_stringifies_nulls() {
        let p = profile("age,city\n30,Rome\n,Paris\n");
        let (header, rows) = p.preview(10);
        assert_eq!(header, vec!["age", "city"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "∅");
    }

    #[test]
    fn wrap_cell_content_quotes_when_needed() {
        assert_eq!(wrap_cell_content("plain"), "plain");
        assert_eq!(wrap_cell_content("a,b"), "\"a,b\"");
        assert_eq!(wrap_cell_content("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
