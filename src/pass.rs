//! Module passes and the registry that builds pipelines from names

use crate::config::AnalysisConfig;
use crate::error::{MemcheckError, Result};
use crate::ir::Module;
use crate::walker::{ModuleWalker, RunSummary};

/// Which analyses survive a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreservedAnalyses {
    All,
    None,
}

impl PreservedAnalyses {
    pub fn all() -> Self {
        PreservedAnalyses::All
    }

    pub fn are_all_preserved(&self) -> bool {
        matches!(self, PreservedAnalyses::All)
    }

    /// What is still valid after running `self` then `other`
    pub fn intersect(self, other: Self) -> Self {
        if self.are_all_preserved() && other.are_all_preserved() {
            PreservedAnalyses::All
        } else {
            PreservedAnalyses::None
        }
    }
}

/// A pass run over a whole module
pub trait ModulePass {
    fn name(&self) -> &'static str;
    fn run(&mut self, module: &Module) -> Result<PreservedAnalyses>;
}

/// The memory-access analysis; never modifies the module
pub struct MemcheckPass {
    walker: ModuleWalker,
    last_summary: Option<RunSummary>,
}

impl MemcheckPass {
    pub const NAME: &'static str = "memcheck";

    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            walker: ModuleWalker::new(config)?,
            last_summary: None,
        })
    }

    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }
}

impl ModulePass for MemcheckPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(&mut self, module: &Module) -> Result<PreservedAnalyses> {
        tracing::info!("running {} on {}", Self::NAME, module.name());
        let summary = self.walker.run(module)?;
        self.last_summary = Some(summary);
        Ok(PreservedAnalyses::all())
    }
}

type PassFactory = fn(&AnalysisConfig) -> Result<Box<dyn ModulePass>>;

fn memcheck_factory(config: &AnalysisConfig) -> Result<Box<dyn ModulePass>> {
    Ok(Box::new(MemcheckPass::new(config)?))
}

/// Maps pipeline element names to pass constructors
pub struct PassRegistry {
    factories: Vec<(&'static str, PassFactory)>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registry holding every pass this crate provides
    pub fn with_builtin_passes() -> Self {
        let mut registry = Self::new();
        registry.register(MemcheckPass::NAME, memcheck_factory);
        registry
    }

    pub fn register(&mut self, name: &'static str, factory: PassFactory) {
        self.factories.push((name, factory));
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|(name, _)| *name)
    }

    fn factory(&self, name: &str) -> Option<PassFactory> {
        self.factories
            .iter()
            .find(|(registered, _)| *registered == name)
            .map(|(_, factory)| *factory)
    }

    /// Build the passes named by a comma-separated pipeline text
    ///
    /// `memcheck<...>` is a known name with parameters and is rejected
    /// distinctly from a name nobody registered.
    pub fn build_pipeline(
        &self,
        pipeline: &str,
        config: &AnalysisConfig,
    ) -> Result<Vec<Box<dyn ModulePass>>> {
        let mut passes = Vec::new();

        for element in pipeline.split(',').map(str::trim) {
            let (name, has_params) = match element.find('<') {
                Some(idx) => (&element[..idx], true),
                None => (element, false),
            };

            let factory = self
                .factory(name)
                .ok_or_else(|| MemcheckError::UnknownPass(element.to_string()))?;
            if has_params {
                return Err(MemcheckError::PassParameters(name.to_string()));
            }

            tracing::debug!("pipeline element: {}", name);
            passes.push(factory(config)?);
        }

        Ok(passes)
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_builtin_passes()
    }
}

/// Run passes in order, stopping at the first error
pub fn run_pipeline(
    passes: &mut [Box<dyn ModulePass>],
    module: &Module,
) -> Result<PreservedAnalyses> {
    let mut preserved = PreservedAnalyses::all();
    for pass in passes.iter_mut() {
        let result = pass.run(module)?;
        tracing::debug!(
            "{} preserved all analyses: {}",
            pass.name(),
            result.are_all_preserved()
        );
        preserved = preserved.intersect(result);
    }
    Ok(preserved)
}
