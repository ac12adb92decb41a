use std::fmt::{Display, Formatter};

/// Text table where every column is padded to its widest cell and
/// terminated by `|`.
///
/// ```text
/// name  |Data Type|
/// ------|---------|
/// field1|string   |
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. Missing trailing cells render empty; extra cells are dropped.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .map(|row| row[index].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(header.chars().count())
            })
            .collect()
    }

    pub fn header_line(&self) -> String {
        format_line(&self.headers, &self.widths())
    }

    pub fn separator_line(&self) -> String {
        self.widths()
            .into_iter()
            .map(|width| format!("{}|", "-".repeat(width)))
            .collect()
    }

    pub fn row_lines(&self) -> Vec<String> {
        let widths = self.widths();
        self.rows
            .iter()
            .map(|row| format_line(row, &widths))
            .collect()
    }

    /// Header, separator, then one line per row.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(self.header_line());
        lines.push(self.separator_line());
        lines.extend(self.row_lines());
        lines
    }
}

impl Display for TextTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}|"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_columns_to_widest_cell_or_header() {
        let mut table = TextTable::new(["name", "Data Type"]);
        table.push_row(["field_long_name", "str"]);
        table.push_row(["f2", "string"]);

        assert_eq!(table.header_line(), "name           |Data Type|");
        assert_eq!(table.separator_line(), "---------------|---------|");
        assert_eq!(
            table.row_lines(),
            vec![
                String::from("field_long_name|str      |"),
                String::from("f2             |string   |"),
            ]
        );
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let mut table = TextTable::new(["a", "b"]);
        table.push_row(["1"]);

        assert_eq!(table.to_string(), "a|b|\n-|-|\n1| |");
    }

    #[test]
    fn empty_table_renders_header_and_separator_only() {
        let table = TextTable::new(["only"]);
        assert_eq!(table.lines(), vec!["only|", "----|"]);
        assert_eq!(table.row_count(), 0);
    }
}
