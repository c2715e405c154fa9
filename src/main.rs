use anyhow::{Context, Result};
use clap::Parser;
use memcheck::{
    cli::Cli,
    ir::Module,
    pass::{run_pipeline, PassRegistry},
};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` turns on everything
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = args.analysis_config()?;
    tracing::debug!(?config, "effective configuration");

    // Reject a bad pipeline before touching the module
    let registry = PassRegistry::with_builtin_passes();
    let mut passes = registry
        .build_pipeline(&args.passes, &config)
        .with_context(|| format!("Invalid pass pipeline '{}'", args.passes))?;

    let module = Module::from_json_file(&args.module)
        .with_context(|| format!("Failed to load module {}", args.module.display()))?;
    tracing::info!("{}: {} function(s)", module.name(), module.len());

    let preserved = run_pipeline(&mut passes, &module)?;
    tracing::debug!(?preserved, "pipeline finished");

    Ok(())
}
