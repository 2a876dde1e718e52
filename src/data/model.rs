use std::collections::BTreeMap;
use std::fmt;

use crate::error::DataError;

/// Column holding the serialized pixel matrix.
pub const PIXELS: &str = "pixels";
/// Column holding the record identifier (file stem for image rows).
pub const NAME: &str = "name";
/// Column holding the original file extension.
pub const TYPE: &str = "type";
/// Column holding the `WxH` size string.
pub const SIZE: &str = "size";

// ---------------------------------------------------------------------------
// Row – one record of the dataset
// ---------------------------------------------------------------------------

/// A single dataset record.
///
/// `id` is the row's position in the collection it was first loaded into.
/// It is not written to disk; partitions and derived views carry it along so
/// row identity survives splitting and noising even when names repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub id: usize,
    /// column_name → cell text.
    pub cells: BTreeMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn pixels(&self) -> Option<&str> {
        self.get(PIXELS)
    }

    /// Copy of this row with the pixel cell replaced.
    pub fn with_pixels(&self, pixels: String) -> Row {
        let mut cells = self.cells.clone();
        cells.insert(PIXELS.to_string(), pixels);
        Row { id: self.id, cells }
    }

    /// Human-readable identity used in log lines.
    pub fn identity(&self) -> RowIdentity<'_> {
        RowIdentity(self)
    }
}

pub struct RowIdentity<'a>(&'a Row);

impl fmt::Display for RowIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(NAME) {
            Some(name) if !name.is_empty() => write!(f, "'{name}' (#{})", self.0.id),
            _ => write!(f, "#{}", self.0.id),
        }
    }
}

// ---------------------------------------------------------------------------
// RowCollection – column-homogeneous table of rows
// ---------------------------------------------------------------------------

/// An ordered, column-homogeneous set of rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowCollection {
    /// Column order used when writing files.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl RowCollection {
    pub fn new(columns: Vec<String>) -> Self {
        RowCollection {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a record, assigning it the next row id.
    ///
    /// Missing columns are filled with empty text and unknown keys are
    /// dropped so every row exposes exactly `columns`.
    pub fn push(&mut self, mut cells: BTreeMap<String, String>) {
        let id = self.rows.len();
        let cells = self
            .columns
            .iter()
            .map(|col| (col.clone(), cells.remove(col).unwrap_or_default()))
            .collect();
        self.rows.push(Row { id, cells });
    }

    /// Build a collection sharing this one's columns from already-identified rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> RowCollection {
        RowCollection {
            columns: self.columns.clone(),
            rows,
        }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn require_column(&self, column: &str) -> Result<(), DataError> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(DataError::MissingColumn(column.to_string()))
        }
    }

    pub fn ids(&self) -> Vec<usize> {
        self.rows.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
pub(crate) fn image_rows(n: usize) -> RowCollection {
    let mut collection = RowCollection::new(
        [NAME, TYPE, SIZE, PIXELS]
            .iter()
            .map(|c| c.to_string())
            .collect(),
    );
    for i in 0..n {
        let v = (i * 7 % 256) as u8;
        collection.push(BTreeMap::from([
            (NAME.to_string(), format!("img_{i}")),
            (TYPE.to_string(), "png".to_string()),
            (SIZE.to_string(), "2x2".to_string()),
            (PIXELS.to_string(), format!("[{v}, {v}, {v}, {v}]")),
        ]));
    }
    collection
}
