use serde::Serialize;

/// One cell of the tracker table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Number(_) => None,
        }
    }
}

/// Ordered column-store holding the denormalized tracker rows. Column order
/// is part of the contract; rows are positional against `columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TrackerTable {
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)
    }

    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.cell(row, column)?.as_number()
    }

    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.cell(row, column)?.as_text()
    }

    /// Reorders columns to the canonical layout: listed columns first, in
    /// list order; columns the list does not mention follow, preserving
    /// their relative order. Listed columns absent from the table are
    /// skipped.
    pub fn reorder(self, canonical: &[String]) -> Self {
        let mut order: Vec<usize> = canonical
            .iter()
            .filter_map(|name| self.columns.iter().position(|column| column == name))
            .collect();
        for (index, _) in self.columns.iter().enumerate() {
            if !order.contains(&index) {
                order.push(index);
            }
        }

        let columns = order.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| order.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Self { columns, rows }
    }
}
