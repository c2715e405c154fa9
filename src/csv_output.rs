//! CSV report: one row per analyzed function
//!
//! Header and rows are streamed into the artifact as the walk proceeds.

use crate::accountant::FunctionAnalysis;
use crate::artifact::ArtifactFile;
use crate::error::Result;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Column names, in output order
pub const CSV_COLUMNS: [&str; 5] = [
    "Function Name (Demangled)",
    "Function Name (Mangled)",
    "Loads",
    "Stores",
    "Bytes",
];

/// Streaming CSV writer for function analyses
pub struct CsvReportWriter {
    file: ArtifactFile,
    rows: usize,
}

impl CsvReportWriter {
    /// Open the artifact and write the header row
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = ArtifactFile::create(path)?;
        file.write_str(&Self::header())?;
        Ok(Self { file, rows: 0 })
    }

    /// Header row: every column name quoted
    fn header() -> String {
        let quoted: Vec<String> = CSV_COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        format!("{}\n", quoted.join(","))
    }

    /// Quote a function name that would otherwise split or break its row
    pub fn escape_field(field: &str) -> Cow<'_, str> {
        if field.contains([',', '"', '\n', '\r']) {
            Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
        } else {
            Cow::Borrowed(field)
        }
    }

    /// Format an analysis as a CSV row, without the line terminator
    pub fn format_row(analysis: &FunctionAnalysis) -> String {
        [
            Self::escape_field(&analysis.demangled_name).into_owned(),
            Self::escape_field(&analysis.mangled_name).into_owned(),
            analysis.loads.to_string(),
            analysis.stores.to_string(),
            analysis.bytes.to_string(),
        ]
        .join(",")
    }

    pub fn write_row(&mut self, analysis: &FunctionAnalysis) -> Result<()> {
        let mut row = Self::format_row(analysis);
        row.push('\n');
        self.file.write_str(&row)?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Push the report to disk, leaving it unpublished
    pub fn close(&mut self) -> Result<()> {
        self.file.sync()
    }

    /// Finish the report and move it to its final path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.close()?;
        self.file.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn analysis(demangled: &str, mangled: &str) -> FunctionAnalysis {
        FunctionAnalysis {
            mangled_name: mangled.to_string(),
            demangled_name: demangled.to_string(),
            loads: 3,
            stores: 2,
            bytes: 20,
        }
    }

    #[test]
    fn test_escape_plain_field() {
        assert_eq!(CsvReportWriter::escape_field("main"), "main");
    }

    #[test]
    fn test_escape_comma() {
        assert_eq!(CsvReportWriter::escape_field("foo,bar"), "\"foo,bar\"");
    }

    #[test]
    fn test_escape_quotes_doubled() {
        assert_eq!(
            CsvReportWriter::escape_field("say \"hi\""),
            "\"say \"\"hi\"\"\""
        );
    }

    #[test]
    fn test_escape_newline() {
        assert_eq!(CsvReportWriter::escape_field("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_format_row() {
        let row = CsvReportWriter::format_row(&analysis("sum(int*, int)", "_Z3sumPii"));
        assert_eq!(row, "\"sum(int*, int)\",_Z3sumPii,3,2,20");
    }

    #[test]
    fn test_header_and_rows_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.csv");

        let mut writer = CsvReportWriter::create(&path).unwrap();
        writer.write_row(&analysis("main", "main")).unwrap();
        writer.write_row(&analysis("helper", "helper")).unwrap();
        assert_eq!(writer.rows(), 2);
        writer.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            concat!(
                "\"Function Name (Demangled)\",\"Function Name (Mangled)\",",
                "\"Loads\",\"Stores\",\"Bytes\""
            )
        );
        assert_eq!(lines[1], "main,main,3,2,20");
        assert_eq!(lines[2], "helper,helper,3,2,20");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_report_has_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");

        CsvReportWriter::create(&path).unwrap().finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
