//! JSON report: a single array of function records
//!
//! The opening bracket is written when the report is created, records are
//! appended as they are analyzed and the array is closed by `finish`.

use crate::accountant::FunctionAnalysis;
use crate::artifact::ArtifactFile;
use crate::error::{MemcheckError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One analyzed function as it appears in the JSON report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonFunctionRecord {
    #[serde(rename = "Function Name (Demangled)")]
    pub demangled_name: String,
    #[serde(rename = "Function Name (Mangled)")]
    pub mangled_name: String,
    #[serde(rename = "Loads")]
    pub loads: u64,
    #[serde(rename = "Stores")]
    pub stores: u64,
    #[serde(rename = "Bytes")]
    pub bytes: u64,
}

impl From<&FunctionAnalysis> for JsonFunctionRecord {
    fn from(analysis: &FunctionAnalysis) -> Self {
        Self {
            demangled_name: analysis.demangled_name.clone(),
            mangled_name: analysis.mangled_name.clone(),
            loads: analysis.loads,
            stores: analysis.stores,
            bytes: analysis.bytes,
        }
    }
}

/// Streaming writer for the JSON array
pub struct JsonReportWriter {
    file: ArtifactFile,
    records: usize,
    closed: bool,
}

impl JsonReportWriter {
    /// Open the artifact and write the opening bracket
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = ArtifactFile::create(path)?;
        file.write_str("[")?;
        Ok(Self {
            file,
            records: 0,
            closed: false,
        })
    }

    /// Append a record, preceded by a separator unless it is the first
    pub fn write_record(&mut self, analysis: &FunctionAnalysis) -> Result<()> {
        let separator = if self.records == 0 { "\n  " } else { ",\n  " };
        self.file.write_str(separator)?;

        let record = JsonFunctionRecord::from(analysis);
        serde_json::to_writer(&mut self.file, &record)
            .map_err(|e| MemcheckError::output(self.file.path(), e.into()))?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    /// Close the array and push the report to disk, leaving it unpublished
    pub fn close(&mut self) -> Result<()> {
        if !self.closed {
            let closing = if self.records == 0 { "]\n" } else { "\n]\n" };
            self.file.write_str(closing)?;
            self.closed = true;
        }
        self.file.sync()
    }

    /// Close the array if needed and move the report to its final path
    pub fn finish(mut self) -> Result<PathBuf> {
        self.close()?;
        self.file.commit()
    }
}
