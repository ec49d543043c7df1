use crate::cli::StatusArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rxnet::core::models::network::ReactionNetworkConfig;
use rxnet::engine::progress::ProgressReporter;
use rxnet::workflows::status::{self, GroupReport};
use std::path::Path;
use tracing::info;

pub fn run(args: StatusArgs, config: &ReactionNetworkConfig, system_dir: &Path) -> Result<()> {
    info!("Dispatching status check.");
    let progress = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    let report = status::report(config, system_dir, &reporter);

    for group in &report.groups {
        print_group(group, args.summary_only);
    }

    let boundary = "=".repeat(60);
    println!("\n{boundary}");
    println!("{:8}OVERALL STATUS SUMMARY", "");
    println!("{boundary}");
    for (state, count) in &report.overall {
        println!("    {state} : {count}");
    }
    println!("{boundary}");
    Ok(())
}

fn print_group(group: &GroupReport, summary_only: bool) {
    let boundary = "-".repeat(60);
    println!("\n{boundary}");
    println!("{:8}GROUP: {}", "", group.name);
    println!("{boundary}");

    if !summary_only {
        let header = "Calculation (rel)";
        let width = group
            .rows
            .iter()
            .map(|row| row.rel_path.to_string_lossy().len())
            .chain([header.len()])
            .max()
            .unwrap_or(header.len());

        println!("{header:<width$} | {:<4} | {:<10} | Details", "Mode", "Status");
        println!("{boundary}");
        for row in &group.rows {
            println!(
                "{:<width$} | {:<4} | {:<10} | {}",
                row.rel_path.display(),
                row.mode.as_str().to_uppercase(),
                row.status.state,
                row.status.detail
            );
        }
    }

    println!("\n{:4}Summary for {}:", "", group.name);
    for (state, count) in &group.counts {
        println!("    {state} : {count}");
    }
}
