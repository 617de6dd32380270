use std::cmp::Ordering;

use anyhow::{bail, ensure, Context, Result};
use unicode_width::UnicodeWidthStr;

use crate::model::column::{Column, ColumnCatalog};
use crate::source::DataSource;

/// Sort direction of a column. Only header cells ever carry anything but `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortOrder {
    /// Direction a header click moves to: unsorted and descending go ascending,
    /// ascending goes descending.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::None | SortOrder::Descending => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Descending,
        }
    }

    pub fn glyph(self) -> Option<char> {
        match self {
            SortOrder::None => None,
            SortOrder::Ascending => Some('▵'),
            SortOrder::Descending => Some('▽'),
        }
    }
}

/// Smallest unit of a table. `width` is the number of character cells the
/// content is fitted into when drawn; storage never truncates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub content: String,
    pub width: u16,
    pub sort: SortOrder,
}

impl Cell {
    pub fn new(content: impl Into<String>, width: u16) -> Self {
        Self {
            content: content.into(),
            width,
            sort: SortOrder::None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

/// Tabular data shown by a table window. The table name doubles as the
/// window title.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    header: Option<Row>,
    rows: Vec<Row>,
    width: u16,
    columns: Vec<Column>,
    sort_column: Option<usize>,
    sort_order: SortOrder,
    dynamic: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, dynamic: bool) -> Result<Self> {
        let name = name.into();
        ensure!(!name.is_empty(), "empty table name not allowed");

        Ok(Self {
            name,
            header: None,
            rows: Vec::new(),
            width: 0,
            columns: Vec::new(),
            sort_column: None,
            sort_order: SortOrder::None,
            dynamic,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn header(&self) -> Option<&Row> {
        self.header.as_ref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Characters needed to draw the table: every column plus a one-cell
    /// separator between neighbours.
    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.as_ref().map_or(0, |h| h.cells.len())
    }

    pub fn sort_column(&self) -> Option<usize> {
        self.sort_column
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Set the header row. `max_width` is the number of terminal columns
    /// available; a table wider than that could never be shown.
    pub fn set_header(&mut self, cells: Vec<Cell>, max_width: u16) -> Result<()> {
        ensure!(
            self.header.is_none(),
            "table {}: header already set",
            self.name
        );
        ensure!(
            self.rows.is_empty(),
            "table {}: header must be set before adding rows ({} present)",
            self.name,
            self.rows.len()
        );
        ensure!(!cells.is_empty(), "table {}: header has no cells", self.name);

        let mut total = 0usize;
        for (i, cell) in cells.iter().enumerate() {
            let text_width = cell.content.width();
            ensure!(
                usize::from(cell.width) >= text_width,
                "table {}: header cell {} ({:?}) needs width {}, got {}",
                self.name,
                i,
                cell.content,
                text_width,
                cell.width
            );
            total += usize::from(cell.width) + 1;
        }
        // No separator after the last column.
        total -= 1;

        ensure!(
            total <= usize::from(max_width),
            "table {}: width {} exceeds terminal width {}",
            self.name,
            total,
            max_width
        );

        self.width = total as u16;
        self.header = Some(Row { cells });
        Ok(())
    }

    pub fn append_row<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let row = self.build_row(values.into_iter().map(Into::into).collect())?;
        self.rows.push(row);
        Ok(())
    }

    fn build_row(&self, values: Vec<String>) -> Result<Row> {
        let Some(header) = &self.header else {
            bail!("table {}: header must be set before adding rows", self.name);
        };
        ensure!(
            values.len() == header.cells.len(),
            "table {}: row has {} values, header has {} columns",
            self.name,
            values.len(),
            header.cells.len()
        );

        let cells = values
            .into_iter()
            .zip(&header.cells)
            .map(|(value, h)| Cell::new(value, h.width))
            .collect();
        Ok(Row { cells })
    }

    /// Add a column by id, resolving its definition through `catalog`.
    /// The first column must be the key column and there can only be one.
    pub fn add_column(&mut self, column_id: &str, catalog: &dyn ColumnCatalog) -> Result<()> {
        let column = catalog.resolve(column_id).with_context(|| {
            format!("table {}: failed to resolve column {}", self.name, column_id)
        })?;

        if self.columns.is_empty() {
            ensure!(
                column.is_key,
                "first column added to table {} must be a key column, {} is not",
                self.name,
                column.id
            );
        } else {
            ensure!(
                !column.is_key,
                "table {} already has a key column, cannot add {}",
                self.name,
                column.id
            );
        }

        tracing::debug!(
            table = %self.name,
            column = %column.header,
            total = self.columns.len() + 1,
            "added column"
        );
        self.columns.push(column);
        Ok(())
    }

    /// Rebuild every row of a dynamic table from `source`.
    ///
    /// The header is built from the column definitions on the first call and
    /// kept afterwards. Records come from the key column's source; every other
    /// column is resolved to its latest value. Any failure aborts the whole
    /// refresh and leaves the previous rows in place.
    pub fn regenerate(&mut self, source: &dyn DataSource, max_width: u16) -> Result<()> {
        ensure!(
            self.dynamic,
            "table {}: only dynamic tables can be regenerated",
            self.name
        );
        ensure!(
            !self.columns.is_empty(),
            "table {}: no columns added",
            self.name
        );

        if self.header.is_none() {
            let cells = self
                .columns
                .iter()
                .map(|c| Cell::new(c.header.clone(), c.width))
                .collect();
            self.rows.clear();
            self.set_header(cells, max_width)?;
        }

        let key = &self.columns[0];
        ensure!(key.is_key, "table {}: first column is not a key", self.name);

        let records = source
            .list_records(&key.source)
            .with_context(|| format!("table {}: failed to list records", self.name))?;

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let mut values = Vec::with_capacity(self.columns.len());
            for col in &self.columns {
                if col.is_key {
                    values.push(record.clone());
                    continue;
                }
                let value = source
                    .latest_value(&key.source, &record, &col.source)
                    .with_context(|| {
                        format!(
                            "table {}: no latest value for key {}, column {}",
                            self.name, record, col.header
                        )
                    })?;
                values.push(value);
            }
            rows.push(self.build_row(values)?);
        }

        self.rows = rows;

        if let Some(idx) = self.sort_column {
            self.sort(idx, self.sort_order)?;
        }
        Ok(())
    }

    /// Sort rows by the text of column `idx`. The comparison is textual, so
    /// "9" sorts after "10". Marks the header of `idx` and clears all others.
    pub fn sort(&mut self, idx: usize, order: SortOrder) -> Result<()> {
        if order == SortOrder::None {
            return Ok(());
        }

        let Some(header) = &mut self.header else {
            bail!("table {}: cannot sort without a header", self.name);
        };
        ensure!(
            idx < header.cells.len(),
            "table {}: sort column {} out of range ({} columns)",
            self.name,
            idx,
            header.cells.len()
        );

        tracing::debug!(table = %self.name, column = idx, ?order, "sorting");

        for (i, cell) in header.cells.iter_mut().enumerate() {
            cell.sort = if i == idx { order } else { SortOrder::None };
        }
        self.sort_column = Some(idx);
        self.sort_order = order;

        self.rows.sort_by(|a, b| {
            let ord: Ordering = a.cells[idx].content.cmp(&b.cells[idx].content);
            match order {
                SortOrder::Descending => ord.reverse(),
                _ => ord,
            }
        });
        Ok(())
    }
}
