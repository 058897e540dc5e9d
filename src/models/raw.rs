/// Untyped table as read from the source file: header names plus string cells.
///
/// Every row holds exactly `headers.len()` cells; short source rows are padded
/// with empty strings by the reader.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub source_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(source_name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            source_name: source_name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the column at `index`, in row order
    pub fn column(&self, index: usize) -> Option<Vec<&str>> {
        if index >= self.headers.len() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[index].as_str()).collect())
    }

    /// Keep only the rows whose flag is set
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut table = RawTable::new("t.csv", vec!["a".into(), "b".into(), "c".into()]);
        table.push_row(vec!["1".into()]);

        assert_eq!(table.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_column_lookup() {
        let mut table = RawTable::new("t.csv", vec!["Date".into(), "Rain".into(), "Rain".into()]);
        table.push_row(vec!["2024-01-01".into(), "3.2".into(), "1".into()]);
        table.push_row(vec!["2024-01-02".into(), "".into(), "2".into()]);

        assert_eq!(table.column(1).unwrap(), vec!["3.2", ""]);
        assert_eq!(table.column(2).unwrap(), vec!["1", "2"]);
        assert!(table.column(3).is_none());
    }

    #[test]
    fn test_retain_rows() {
        let mut table = RawTable::new("t.csv", vec!["a".into()]);
        for v in ["1", "2", "3"] {
            table.push_row(vec![v.into()]);
        }
        table.retain_rows(&[true, false, true]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][0], "3");
    }
}
