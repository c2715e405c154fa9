//! Module walker: one complete analysis run over a module
//!
//! Init -> ScanningCalls -> OpenOutputs -> Walking -> CloseOutputs -> Done.
//! Every defined, user-owned, non-excluded function is analyzed once (through
//! the cache), printed to the diagnostic stream and appended to both reports.
//! Reports only replace previous ones when the whole run succeeds.

use crate::accountant::{FunctionAnalysis, InstructionAccountant};
use crate::cache::AnalysisCache;
use crate::call_counts::CallCountTable;
use crate::config::AnalysisConfig;
use crate::csv_output::CsvReportWriter;
use crate::demangle::demangle;
use crate::diagnostics::{write_function_block, write_missing_root, write_run_summary};
use crate::error::Result;
use crate::ir::Module;
use crate::json_output::JsonReportWriter;
use crate::membership::{MembershipClassifier, PathMatch};
use regex::Regex;
use std::io::{self, Write};
use std::path::PathBuf;

/// Where the walker is in its run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Init,
    ScanningCalls,
    OpenOutputs,
    Walking,
    CloseOutputs,
    Done,
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub analyzed: usize,
    pub skipped_declarations: usize,
    pub skipped_non_user: usize,
    pub skipped_excluded: usize,
    pub total_loads: u64,
    pub total_stores: u64,
    pub total_bytes: u64,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
}

impl RunSummary {
    fn record(&mut self, analysis: &FunctionAnalysis) {
        self.analyzed += 1;
        self.total_loads += analysis.loads;
        self.total_stores += analysis.stores;
        self.total_bytes = self.total_bytes.saturating_add(analysis.bytes);
    }
}

pub struct ModuleWalker {
    root: Option<PathBuf>,
    path_match: PathMatch,
    exclude: Vec<Regex>,
    csv_path: PathBuf,
    json_path: PathBuf,
    cache: AnalysisCache,
    call_counts: CallCountTable,
    state: WalkState,
}

impl ModuleWalker {
    /// Prepare a walker; fails only on invalid exclude patterns
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            root: config.root.clone(),
            path_match: config.path_match,
            exclude,
            csv_path: config.csv_path.clone(),
            json_path: config.json_path.clone(),
            cache: AnalysisCache::new(),
            call_counts: CallCountTable::default(),
            state: WalkState::Init,
        })
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Analyses computed by the most recent run
    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Call counts gathered by the most recent run
    pub fn call_counts(&self) -> &CallCountTable {
        &self.call_counts
    }

    /// Run over `module`, reporting on stderr
    pub fn run(&mut self, module: &Module) -> Result<RunSummary> {
        let stderr = io::stderr();
        let mut diag = stderr.lock();
        self.run_with_diagnostics(module, &mut diag)
    }

    /// Run over `module`, reporting on `diag`
    pub fn run_with_diagnostics<W: Write>(
        &mut self,
        module: &Module,
        diag: &mut W,
    ) -> Result<RunSummary> {
        self.state = WalkState::Init;
        self.cache = AnalysisCache::new();
        let classifier = MembershipClassifier::new(self.root.clone(), self.path_match);
        if classifier.root().is_none() {
            if let Err(e) = write_missing_root(diag) {
                tracing::warn!("failed to write diagnostics: {}", e);
            }
        }

        self.state = WalkState::ScanningCalls;
        self.call_counts = CallCountTable::build(module);
        tracing::debug!(
            "{}: {} direct callee(s), {} unresolved call(s)",
            module.name(),
            self.call_counts.len(),
            self.call_counts.unresolved()
        );

        self.state = WalkState::OpenOutputs;
        let mut json = JsonReportWriter::create(&self.json_path)?;
        let mut csv = CsvReportWriter::create(&self.csv_path)?;

        self.state = WalkState::Walking;
        let accountant = InstructionAccountant::new(module.data_layout());
        let mut summary = RunSummary::default();

        for (id, function) in module.functions() {
            if function.is_declaration() {
                summary.skipped_declarations += 1;
                continue;
            }
            if !classifier.is_user_defined(function) {
                summary.skipped_non_user += 1;
                continue;
            }
            if self.is_excluded(&function.name) {
                tracing::debug!("{}: excluded by pattern", function.name);
                summary.skipped_excluded += 1;
                continue;
            }

            let analysis = self
                .cache
                .get_or_compute(id, || accountant.analyze(function));

            if let Err(e) = write_function_block(diag, analysis) {
                tracing::warn!("failed to write diagnostics: {}", e);
            }
            csv.write_row(analysis)?;
            json.write_record(analysis)?;
            summary.record(analysis);
        }

        self.state = WalkState::CloseOutputs;
        // Both reports are complete on disk before either is published
        json.close()?;
        csv.close()?;
        summary.json_path = json.finish()?;
        summary.csv_path = csv.finish()?;

        if let Err(e) = write_run_summary(diag, &summary) {
            tracing::warn!("failed to write diagnostics: {}", e);
        }
        self.state = WalkState::Done;
        Ok(summary)
    }

    /// Matches either the linkage name or its demangled form
    fn is_excluded(&self, name: &str) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let demangled = demangle(name);
        self.exclude
            .iter()
            .any(|re| re.is_match(name) || re.is_match(&demangled))
    }
}
