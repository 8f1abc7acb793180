//! Column drivers: how source rows reach a build.
//!
//! The index never talks to storage directly; a [`Driver`] yields one
//! optional byte-string per row, in a stable order that defines the dense
//! record ids. `None` rows (SQL NULL) become empty values.
//! [`MemoryDriver`] is the bundled in-memory implementation used by hosts
//! without a storage layer and by the test suite.

use rustc_hash::FxHashMap;

use crate::error::DriverError;

/// Row stream produced by a driver scan.
pub type RowIter<'a> = Box<dyn Iterator<Item = Result<Option<Vec<u8>>, DriverError>> + 'a>;

/// A source of column values for index builds.
pub trait Driver {
    /// Scans one column of one table, yielding rows in a stable order.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::ColumnNotFound`] when the column does not
    /// exist; individual rows may fail with [`DriverError::Scan`].
    fn scan(&mut self, table: &str, column: &str) -> Result<RowIter<'_>, DriverError>;
}

/// In-memory column driver.
#[derive(Debug, Default)]
pub struct MemoryDriver {
    columns: FxHashMap<(String, String), Vec<Option<Vec<u8>>>>,
}

impl MemoryDriver {
    /// Creates an empty driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a column of raw byte values.
    pub fn insert_column(
        &mut self,
        table: &str,
        column: &str,
        rows: Vec<Option<Vec<u8>>>,
    ) {
        self.columns
            .insert((table.to_owned(), column.to_owned()), rows);
    }

    /// Registers a column of text values; `None` rows model SQL NULL.
    pub fn insert_text_column<'a, I>(&mut self, table: &str, column: &str, rows: I)
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.map(|text| text.as_bytes().to_vec()))
            .collect();
        self.insert_column(table, column, rows);
    }

    /// Number of rows in a registered column, if present.
    #[must_use]
    pub fn row_count(&self, table: &str, column: &str) -> Option<usize> {
        self.columns
            .get(&(table.to_owned(), column.to_owned()))
            .map(Vec::len)
    }
}

impl Driver for MemoryDriver {
    fn scan(&mut self, table: &str, column: &str) -> Result<RowIter<'_>, DriverError> {
        let rows = self
            .columns
            .get(&(table.to_owned(), column.to_owned()))
            .ok_or_else(|| DriverError::ColumnNotFound {
                table: table.to_owned(),
                column: column.to_owned(),
            })?;
        Ok(Box::new(rows.iter().map(|row| Ok(row.clone()))))
    }
}
