use crate::cli::GenerateArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rxnet::core::models::network::ReactionNetworkConfig;
use rxnet::engine::progress::ProgressReporter;
use rxnet::workflows::generate;
use std::path::Path;
use tracing::info;

pub fn run(args: GenerateArgs, config: &ReactionNetworkConfig, system_dir: &Path) -> Result<()> {
    info!("Dispatching input generation.");
    let progress = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    let stats = generate::run(
        config,
        system_dir,
        args.overwrite.map(Into::into),
        args.sp_strategy.into(),
        &reporter,
    );

    println!(
        "Generation complete: {} written, {} skipped, {} failed.",
        stats.written, stats.skipped, stats.failed
    );
    Ok(())
}
