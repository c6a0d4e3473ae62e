//! pack-narrator CLI entry point.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pack_narrator::cli::{Args, read_batch};
use pack_narrator::config::TtsConfig;
use pack_narrator::dispatch::Dispatcher;
use pack_narrator::provider::{ProviderContext, ProviderRegistry, SynthesisError, SynthesisOutcome};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Exit status when a required external tool is missing.
const EXIT_TOOL_NOT_FOUND: u8 = 3;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            let fatal = e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<SynthesisError>())
                .any(SynthesisError::is_fatal);
            error!("{e:#}");
            if fatal {
                ExitCode::from(EXIT_TOOL_NOT_FOUND)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => TtsConfig::load(path)?,
        None => TtsConfig::default(),
    };
    args.apply(&mut config);
    debug!(cache = %config.cache_root().display(), lang = %config.lang, "configuration loaded");

    let ctx = Arc::new(ProviderContext::from_config(&config));
    let registry = ProviderRegistry::with_defaults(ctx, &config);

    if args.list_providers {
        list_providers(&registry);
        return Ok(ExitCode::SUCCESS);
    }

    let dispatcher = Dispatcher::from_config(&registry, &config)?;

    if let Some(batch) = &args.batch {
        return run_batch(&dispatcher, batch);
    }

    if let Some(text) = &args.generate {
        return generate_speech(&dispatcher, text, &args.output);
    }

    eprintln!("No action specified. Use -g to generate speech or --batch to narrate a file.");
    eprintln!("Run with --help for usage information.");
    Ok(ExitCode::SUCCESS)
}

fn list_providers(registry: &ProviderRegistry) {
    let available = registry.list_available();

    println!("Providers:");
    for name in registry.list() {
        let status = if available.contains(&name) {
            "available"
        } else {
            "unavailable"
        };
        println!("  {name:<10} {status}");
    }
}

fn generate_speech(dispatcher: &Dispatcher, text: &str, output: &Path) -> Result<ExitCode> {
    let narration = dispatcher.synthesize(text, output).with_context(|| {
        format!(
            "{} could not narrate into {}",
            dispatcher.provider_name(),
            output.display()
        )
    })?;

    let origin = match narration.outcome {
        SynthesisOutcome::Cached => "from cache",
        SynthesisOutcome::Generated => "generated",
    };
    println!("Audio saved to: {} ({origin})", narration.path.display());
    Ok(ExitCode::SUCCESS)
}

fn run_batch(dispatcher: &Dispatcher, batch: &Path) -> Result<ExitCode> {
    let jobs = read_batch(batch)?;
    let report = dispatcher
        .synthesize_all(&jobs)
        .context("Batch aborted")?;

    println!(
        "{} narrated ({} generated, {} from cache), {} failed",
        report.succeeded(),
        report.generated,
        report.cached,
        report.failed.len()
    );
    for (output, reason) in &report.failed {
        println!("  {}: {reason}", output.display());
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
