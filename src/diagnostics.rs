//! Human-readable report on the diagnostic stream (stderr)

use crate::accountant::FunctionAnalysis;
use crate::walker::RunSummary;
use std::io::{self, Write};

const RULE: &str = "-------------------------------------------";

/// Printed once per run when no user source root is configured
pub fn write_missing_root<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Error: user source root is not set (export SCOP_ROOT or pass --root); \
         no functions will be analyzed."
    )
}

/// Block printed for every analyzed function
pub fn write_function_block<W: Write>(
    out: &mut W,
    analysis: &FunctionAnalysis,
) -> io::Result<()> {
    writeln!(out, "{}", RULE)?;
    writeln!(out, " Function Name (Demangled): {}", analysis.demangled_name)?;
    writeln!(out, " Function Name (Mangled): {}", analysis.mangled_name)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "  'Loads': {}", analysis.loads)?;
    writeln!(out, "  'Stores': {}", analysis.stores)?;
    writeln!(out, "  'Bytes': {}", analysis.bytes)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out)
}

/// One-paragraph summary printed at the end of a run
pub fn write_run_summary<W: Write>(out: &mut W, summary: &RunSummary) -> io::Result<()> {
    writeln!(
        out,
        "memcheck: analyzed {} function(s) ({} loads, {} stores, {} bytes)",
        summary.analyzed, summary.total_loads, summary.total_stores, summary.total_bytes
    )?;
    writeln!(
        out,
        "memcheck: skipped {} declaration(s), {} non-user function(s), {} excluded",
        summary.skipped_declarations, summary.skipped_non_user, summary.skipped_excluded
    )?;
    writeln!(
        out,
        "memcheck: wrote {} and {}",
        summary.csv_path.display(),
        summary.json_path.display()
    )
}
