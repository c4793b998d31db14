use std::{collections::BTreeMap, fs::File, io, path::Path};

use log::{trace, warn};

use super::Param;
use crate::error::Error;
use crate::problem::Key;

/// The value side of a multi-key lookup: one scalar when a single value column is
/// requested, otherwise a record of named scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Scalar(f64),
    Record(BTreeMap<String, f64>),
}

impl Entry {
    pub fn scalar(&self) -> Option<f64> {
        match self {
            Entry::Scalar(value) => Some(*value),
            Entry::Record(_) => None,
        }
    }

    pub fn field(&self, column: &str) -> Option<f64> {
        match self {
            Entry::Scalar(_) => None,
            Entry::Record(record) => record.get(column).copied(),
        }
    }
}

/// Mapping from the tuple of key column values of a row to its value(s)
pub type MultiKey = BTreeMap<Vec<u32>, Entry>;

/// A parameter table as read from a csv file with a header row.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_reader<R: io::Read>(name: &str, reader: R) -> Result<Table, Error> {
        let csv_error = |source| Error::Csv {
            table: name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()
            .map_err(csv_error)?;

        let table = Table {
            name: name.to_string(),
            headers,
            rows,
        };
        trace!("read table {} with {} rows", table.name, table.rows.len());
        Ok(table)
    }

    /// Reads `path`, naming the table after the file stem.
    pub fn from_path(path: &Path) -> Result<Table, Error> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::MissingTable(name.clone()),
            _ => Error::Io {
                path: path.display().to_string(),
                source,
            },
        })?;

        Table::from_reader(&name, file)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, column: &str) -> Result<usize, Error> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| Error::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    fn malformed(&self, row: usize, col: usize) -> Error {
        Error::MalformedValue {
            table: self.name.clone(),
            column: self.headers[col].clone(),
            row: row + 1,
            value: self.cell(row, col).to_string(),
        }
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    fn number(&self, row: usize, col: usize) -> Result<f64, Error> {
        self.cell(row, col)
            .parse::<f64>()
            .map_err(|_| self.malformed(row, col))
    }

    /// Key cells are small non-negative integers, possibly written as `3.0`.
    fn id(&self, row: usize, col: usize) -> Result<u32, Error> {
        let cell = self.cell(row, col);
        if let Ok(id) = cell.parse::<u32>() {
            return Ok(id);
        }

        match cell.parse::<f64>() {
            Ok(x) if x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as f64 => Ok(x as u32),
            _ => Err(self.malformed(row, col)),
        }
    }

    /// The distinct values of a key column in ascending order.
    pub fn distinct<I: Key>(&self, column: &str) -> Result<Vec<I>, Error> {
        let col = self.column(column)?;
        let mut ids = (0..self.rows.len())
            .map(|row| self.id(row, col).map(|id| I::from_parts(&[id])))
            .collect::<Result<Vec<I>, Error>>()?;
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    /// Maps the tuple of `keys` column values of every row to the `values` column(s).
    /// With a single value column the entries are scalars, otherwise records.
    /// A repeated key keeps the last row.
    pub fn multikey(&self, keys: &[&str], values: &[&str]) -> Result<MultiKey, Error> {
        let key_cols = keys
            .iter()
            .map(|k| self.column(k))
            .collect::<Result<Vec<_>, _>>()?;
        let value_cols = values
            .iter()
            .map(|v| self.column(v))
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = MultiKey::new();
        for row in 0..self.rows.len() {
            let key = key_cols
                .iter()
                .map(|&col| self.id(row, col))
                .collect::<Result<Vec<_>, _>>()?;

            let entry = match value_cols.as_slice() {
                [col] => Entry::Scalar(self.number(row, *col)?),
                cols => Entry::Record(
                    cols.iter()
                        .map(|&col| Ok((self.headers[col].clone(), self.number(row, col)?)))
                        .collect::<Result<_, Error>>()?,
                ),
            };

            if out.insert(key.clone(), entry).is_some() {
                warn!("table {} repeats key {:?}, keeping the last row", self.name, key);
            }
        }

        Ok(out)
    }

    /// A typed single-valued parameter keyed by the `keys` columns.
    pub fn param<K: Key>(&self, keys: &[&str], value: &str) -> Result<Param<K>, Error> {
        if keys.len() != K::ARITY {
            return Err(Error::InvalidConfig(format!(
                "table {} read with {} key columns for a {}-ary key",
                self.name,
                keys.len(),
                K::ARITY
            )));
        }

        let entries = self.multikey(keys, &[value])?;
        let values = entries.into_iter().filter_map(|(key, entry)| {
            entry
                .scalar()
                .map(|value| (K::from_parts(&key), value))
        });

        Ok(Param::new(self.name.clone(), values))
    }
}
