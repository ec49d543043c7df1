use crate::cli::ExtractArgs;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use rxnet::core::io::csv::{write_profiles_csv, write_records_csv, ProfileSelection};
use rxnet::core::models::identity::Mode;
use rxnet::core::models::network::ReactionNetworkConfig;
use rxnet::core::models::record::ResultRecord;
use rxnet::engine::progress::ProgressReporter;
use rxnet::workflows::{extract, profile};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

pub fn run(args: ExtractArgs, config: &ReactionNetworkConfig, system_dir: &Path) -> Result<()> {
    info!("Dispatching data extraction.");
    let progress = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    let outcome = extract::run(config, system_dir, args.criteria.into(), &reporter);
    println!(
        "Extraction complete: {} records ({} processed, {} skipped, {} failed).",
        outcome.stats.extracted, outcome.stats.processed, outcome.stats.skipped, outcome.stats.failed
    );
    if outcome.records.is_empty() {
        println!("Nothing to export.");
        return Ok(());
    }

    let out_dir = args
        .out_dir
        .unwrap_or_else(|| system_dir.join("extracted_data"));

    // One table per method combo; single points additionally split by
    // their refinement combo so columns stay homogeneous.
    let mut tables: BTreeMap<String, Vec<ResultRecord>> = BTreeMap::new();
    for record in &outcome.records {
        let combo = record.identity.combo.folder_name();
        let key = match (&record.identity.mode, &record.identity.sp_combo) {
            (Mode::Sp, Some(sp)) => format!("{combo}__{}_sp", sp.folder_name()),
            _ => format!("{combo}_opt"),
        };
        tables.entry(key).or_default().push(record.clone());
    }

    for (key, records) in &tables {
        let path = out_dir.join(format!("{key}.csv"));
        write_records_csv(&path, records)?;
        info!(table = %path.display(), rows = records.len(), "records exported");

        let profiles = profile::assemble(config, records);
        if profiles.is_empty() {
            continue;
        }
        let profile_dir = out_dir.join("energy_profiles");
        for (selection, suffix) in [
            (ProfileSelection::Raw, "profile"),
            (ProfileSelection::Electronic, "profile_E"),
            (ProfileSelection::Gibbs, "profile_G"),
        ] {
            write_profiles_csv(
                &profile_dir.join(format!("{key}_{suffix}.csv")),
                &profiles,
                selection,
            )?;
        }
        info!(combo = %key, pathways = profiles.len(), "profiles exported");
    }

    println!("Tables written to {}.", out_dir.display());
    Ok(())
}
