//! Minimal in-memory table shared by all pipeline stages
//!
//! Every transformation in the pipeline is a sequence of column-wise
//! operations over (county_fips, year)-keyed tables, so the stages work on
//! a small shared `Frame` type rather than per-dataset structs. Cells are
//! null, text, or numeric; CSV round trips are deterministic (stable column
//! order, stable row order after `sort_by`, fixed numeric rendering).

use migra_common::{Error, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Text(String),
    Num(f64),
}

impl Cell {
    /// Cell from a raw CSV field: empty string means missing
    pub fn from_raw(field: &str) -> Cell {
        if field.is_empty() {
            Cell::Null
        } else {
            Cell::Text(field.to_string())
        }
    }

    pub fn num(v: f64) -> Cell {
        if v.is_nan() {
            Cell::Null
        } else {
            Cell::Num(v)
        }
    }

    pub fn text(s: impl Into<String>) -> Cell {
        Cell::Text(s.into())
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Cell::Num(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Null => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// CSV rendering. Whole numbers print without a fraction so that
    /// counts stay integers across round trips.
    pub fn render(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Num(v) => render_num(*v),
        }
    }
}

fn render_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        // shortest round-trip representation; deterministic for equal inputs
        format!("{}", v)
    }
}

/// Total order over cells for deterministic sorting:
/// null < number < text.
pub fn cmp_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Null, Cell::Null) => Ordering::Equal,
        (Cell::Null, _) => Ordering::Less,
        (_, Cell::Null) => Ordering::Greater,
        (Cell::Num(x), Cell::Num(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Cell::Num(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Num(_)) => Ordering::Greater,
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
    }
}

/// Column-ordered table of cells
#[derive(Debug, Clone)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Frame {
        Frame {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Internal(format!(
                "row arity {} does not match {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn col(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_col(&self, name: &str) -> Result<usize> {
        self.col(name)
            .ok_or_else(|| Error::InvalidInput(format!("missing column '{}'", name)))
    }

    pub fn has_col(&self, name: &str) -> bool {
        self.col(name).is_some()
    }

    pub fn get(&self, row: usize, col: usize) -> &Cell {
        &self.rows[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.rows[row][col] = cell;
    }

    /// Numeric view of a cell by column name
    pub fn num(&self, row: usize, name: &str) -> Option<f64> {
        self.col(name).and_then(|c| self.rows[row][c].as_num())
    }

    /// Text view of a cell by column name
    pub fn text(&self, row: usize, name: &str) -> Option<&str> {
        self.col(name).and_then(|c| self.rows[row][c].as_str())
    }

    /// Append a column filled with `default`; returns its index
    pub fn add_column(&mut self, name: impl Into<String>, default: Cell) -> usize {
        self.columns.push(name.into());
        for row in &mut self.rows {
            row.push(default.clone());
        }
        self.columns.len() - 1
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        let idx = self.require_col(from)?;
        self.columns[idx] = to.to_string();
        Ok(())
    }

    /// New frame with only the named columns, in the given order
    pub fn select(&self, names: &[&str]) -> Result<Frame> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| self.require_col(n))
            .collect::<Result<_>>()?;
        let mut out = Frame::new(names.to_vec());
        for row in &self.rows {
            out.rows
                .push(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(out)
    }

    /// Drop columns whose name matches the predicate
    pub fn drop_columns_where(&mut self, predicate: impl Fn(&str) -> bool) {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !predicate(&self.columns[i]))
            .collect();
        self.columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        for row in &mut self.rows {
            *row = keep.iter().map(|&i| row[i].clone()).collect();
        }
    }

    pub fn retain_rows(&mut self, predicate: impl Fn(&Frame, usize) -> bool) {
        let keep: Vec<usize> = (0..self.rows.len())
            .filter(|&i| predicate(self, i))
            .collect();
        self.rows = keep.into_iter().map(|i| self.rows[i].clone()).collect();
    }

    /// Stable sort by the named key columns
    pub fn sort_by(&mut self, keys: &[&str]) -> Result<()> {
        let indices: Vec<usize> = keys
            .iter()
            .map(|k| self.require_col(k))
            .collect::<Result<_>>()?;
        self.rows.sort_by(|a, b| {
            for &i in &indices {
                match cmp_cells(&a[i], &b[i]) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            Ordering::Equal
        });
        Ok(())
    }

    /// Append another frame's rows; column sets must match exactly
    pub fn append(&mut self, other: Frame) -> Result<()> {
        if self.columns != other.columns {
            return Err(Error::Internal(format!(
                "cannot append frame with columns {:?} to {:?}",
                other.columns, self.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Coerce the named columns to numeric, surfacing the file and row of
    /// the first malformed value.
    pub fn coerce_numeric(&mut self, names: &[&str], source: &str) -> Result<()> {
        for name in names {
            let idx = self.require_col(name)?;
            for (row_no, row) in self.rows.iter_mut().enumerate() {
                let coerced = match &row[idx] {
                    Cell::Null => Cell::Null,
                    Cell::Num(v) => Cell::Num(*v),
                    Cell::Text(s) => {
                        let trimmed = s.trim();
                        if trimmed.is_empty() || trimmed == "." {
                            Cell::Null
                        } else {
                            match trimmed.parse::<f64>() {
                                Ok(v) => Cell::num(v),
                                Err(_) => {
                                    return Err(Error::parse(
                                        source,
                                        row_no + 1,
                                        format!("column '{}' has non-numeric value '{}'", name, s),
                                    ))
                                }
                            }
                        }
                    }
                };
                row[idx] = coerced;
            }
        }
        Ok(())
    }

    /// True when the column holds at least one number and no text
    pub fn is_numeric(&self, name: &str) -> bool {
        let Some(idx) = self.col(name) else {
            return false;
        };
        let mut saw_num = false;
        for row in &self.rows {
            match &row[idx] {
                Cell::Text(_) => return false,
                Cell::Num(_) => saw_num = true,
                Cell::Null => {}
            }
        }
        saw_num
    }

    /// Mean of non-null values, None when the column is all null
    pub fn mean(&self, name: &str) -> Option<f64> {
        let idx = self.col(name)?;
        let values: Vec<f64> = self.rows.iter().filter_map(|r| r[idx].as_num()).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    /// Sample standard deviation of non-null values
    pub fn std(&self, name: &str) -> Option<f64> {
        let idx = self.col(name)?;
        let values: Vec<f64> = self.rows.iter().filter_map(|r| r[idx].as_num()).collect();
        if values.len() < 2 {
            return None;
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
        Some(var.sqrt())
    }

    /// Min and max of non-null values
    pub fn min_max(&self, name: &str) -> Option<(f64, f64)> {
        let idx = self.col(name)?;
        let mut iter = self.rows.iter().filter_map(|r| r[idx].as_num());
        let first = iter.next()?;
        let (mut min, mut max) = (first, first);
        for v in iter {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    /// Distinct rendered values of a column, in first-seen order
    pub fn unique(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.require_col(name)?;
        let mut seen = Vec::new();
        for row in &self.rows {
            let v = row[idx].render();
            if !seen.contains(&v) {
                seen.push(v);
            }
        }
        Ok(seen)
    }

    /// Sum of a numeric column grouped by a key column
    pub fn group_sum(&self, key: &str, value: &str) -> Result<HashMap<String, f64>> {
        let key_idx = self.require_col(key)?;
        let value_idx = self.require_col(value)?;
        let mut sums = HashMap::new();
        for row in &self.rows {
            if let Some(v) = row[value_idx].as_num() {
                *sums.entry(row[key_idx].render()).or_insert(0.0) += v;
            }
        }
        Ok(sums)
    }

    fn join_key(row: &[Cell], indices: &[usize]) -> String {
        let mut key = String::new();
        for &i in indices {
            key.push_str(&row[i].render());
            key.push('\x1f');
        }
        key
    }

    /// Join on the named key columns. `keep_unmatched_left` gives a left
    /// join (right columns null); otherwise an inner join. Right-side rows
    /// may match multiple left rows; duplicate right keys take the first
    /// occurrence so joins stay deterministic.
    pub fn join(&self, other: &Frame, on: &[&str], keep_unmatched_left: bool) -> Result<Frame> {
        let left_keys: Vec<usize> = on.iter().map(|k| self.require_col(k)).collect::<Result<_>>()?;
        let right_keys: Vec<usize> = on
            .iter()
            .map(|k| other.require_col(k))
            .collect::<Result<_>>()?;

        let right_extra: Vec<usize> = (0..other.columns.len())
            .filter(|i| !right_keys.contains(i))
            .collect();

        let mut right_index: HashMap<String, usize> = HashMap::new();
        for (i, row) in other.rows.iter().enumerate() {
            right_index
                .entry(Frame::join_key(row, &right_keys))
                .or_insert(i);
        }

        let mut columns: Vec<String> = self.columns.clone();
        for &i in &right_extra {
            columns.push(other.columns[i].clone());
        }

        let mut out = Frame::new(columns);
        for row in &self.rows {
            let key = Frame::join_key(row, &left_keys);
            match right_index.get(&key) {
                Some(&ri) => {
                    let mut joined = row.clone();
                    for &i in &right_extra {
                        joined.push(other.rows[ri][i].clone());
                    }
                    out.rows.push(joined);
                }
                None if keep_unmatched_left => {
                    let mut joined = row.clone();
                    joined.extend(std::iter::repeat(Cell::Null).take(right_extra.len()));
                    out.rows.push(joined);
                }
                None => {}
            }
        }
        Ok(out)
    }

    pub fn inner_join(&self, other: &Frame, on: &[&str]) -> Result<Frame> {
        self.join(other, on, false)
    }

    pub fn left_join(&self, other: &Frame, on: &[&str]) -> Result<Frame> {
        self.join(other, on, true)
    }

    /// Read a CSV file; all cells start as text (or null for empty fields)
    pub fn from_csv(path: &Path) -> Result<Frame> {
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_path(path)?;
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut frame = Frame::new(columns);
        for record in reader.records() {
            let record = record?;
            let row: Vec<Cell> = record.iter().map(Cell::from_raw).collect();
            frame.push_row(row)?;
        }
        Ok(frame)
    }

    /// Write the frame as CSV. Output is byte-deterministic for identical
    /// frames: column order is the frame's, row order is the frame's, and
    /// numeric rendering is fixed.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::render))?;
        }
        writer.flush()?;
        Ok(())
    }
}
