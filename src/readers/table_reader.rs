use crate::error::{ProcessingError, Result};
use crate::models::RawTable;
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_DELIMITER};
use csv::ReaderBuilder;
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Reads a delimited text file with a header row into a [`RawTable`]
pub struct TableReader {
    delimiter: u8,
}

impl TableReader {
    pub fn new() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER as u8,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read the whole file. A missing file is a precondition failure.
    pub fn read_table(&self, path: &Path) -> Result<RawTable> {
        if !path.is_file() {
            return Err(ProcessingError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let source_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.parse_bytes(&source_name, &bytes)
    }

    /// Parse already loaded file contents
    pub fn parse_bytes(&self, source_name: &str, bytes: &[u8]) -> Result<RawTable> {
        let decoded = decode_text(bytes);
        let text = decoded
            .strip_prefix('\u{feff}')
            .unwrap_or(&*decoded);

        let mut csv_reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "'{}' has no header row",
                source_name
            )));
        }

        let mut table = RawTable::new(source_name, headers);
        for record in csv_reader.records() {
            let record = record?;

            // Skip blank lines
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            table.push_row(record.iter().map(|cell| cell.to_string()).collect());
        }

        debug!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.headers.len(),
            source_name
        );

        Ok(table)
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode as UTF-8, falling back to Windows-1252 for legacy exports
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            warn!("Input is not valid UTF-8, decoding as Windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_table_file() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "Date,Temp,Rain")?;
        writeln!(temp_file, "2024-01-01,10.5,0")?;
        writeln!(temp_file, "2024-01-02,11")?;
        writeln!(temp_file, ",,")?;
        writeln!(temp_file, "2024-01-03,12,1.5,extra")?;

        let reader = TableReader::new();
        let table = reader.read_table(temp_file.path())?;

        assert_eq!(table.headers, vec!["Date", "Temp", "Rain"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1], vec!["2024-01-02", "11", ""]);
        assert_eq!(table.rows[2].len(), 3);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_precondition_failure() {
        let reader = TableReader::new();
        let err = reader
            .read_table(Path::new("definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, ProcessingError::InputNotFound { .. }));
    }

    #[test]
    fn test_semicolon_delimiter_and_bom() -> Result<()> {
        let reader = TableReader::with_delimiter(b';');
        let table = reader.parse_bytes("x.csv", "\u{feff}time;rh\n01/02/2024;55\n".as_bytes())?;

        assert_eq!(table.headers, vec!["time", "rh"]);
        assert_eq!(table.rows[0], vec!["01/02/2024", "55"]);
        Ok(())
    }

    #[test]
    fn test_windows_1252_headers() -> Result<()> {
        // "Temp (°C)" with a Latin-1 degree sign
        let mut bytes = b"Date,Temp (".to_vec();
        bytes.push(0xB0);
        bytes.extend_from_slice(b"C)\n2024-01-01,3\n");

        let table = TableReader::new().parse_bytes("legacy.csv", &bytes)?;
        assert_eq!(table.headers[1], "Temp (°C)");
        Ok(())
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(TableReader::new().parse_bytes("empty.csv", b"").is_err());
    }
}
