use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use modelsweep::config::SweepConfig;

/// Read a JSON sweep configuration. Missing keys take their defaults.
pub fn load_sweep_config(path: &Path) -> Result<SweepConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

fn many(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
}

/// Build the sweep configuration from the optional `--config` file and the
/// command-line overrides, then validate it.
pub fn config_from_arguments(matches: &ArgMatches) -> Result<SweepConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("[modelsweep::input] Loading config: {:?}", path);
            load_sweep_config(path)?
        }
        None => SweepConfig::default(),
    };

    // Apply CLI overrides
    if let Some(data) = matches.get_one::<PathBuf>("data") {
        config.data = data.clone();
    }
    if let Some(ycol) = matches.get_one::<String>("ycol") {
        config.ycol = ycol.clone();
    }
    if matches.get_flag("classify") {
        config.classify = true;
    }
    if let Some(&bins) = matches.get_one::<u32>("bins") {
        config.bins = bins as usize;
    }
    if let Some(cutoffs) = matches.get_many::<f64>("cutoffs") {
        config.cutoffs = Some(cutoffs.copied().collect());
    }
    if let Some(models) = many(matches, "models") {
        config.models = models;
    }
    if let Some(&cv) = matches.get_one::<u32>("cv") {
        config.cv = cv as usize;
    }
    if let Some(&threads) = matches.get_one::<i32>("threads") {
        config.threads = threads;
    }
    if let Some(groupcols) = many(matches, "groupcols") {
        config.groupcols = groupcols;
    }
    if let Some(out_dir) = matches.get_one::<PathBuf>("out_dir") {
        config.out_dir = out_dir.clone();
    }
    if let Some(prefix) = matches.get_one::<String>("prefix") {
        config.prefix = Some(prefix.clone());
    }
    if let Some(&seed) = matches.get_one::<u64>("seed") {
        config.seed = seed;
    }
    if matches.get_flag("keep_going") {
        config.keep_going = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;

    #[test]
    fn flags_fill_the_config() {
        let matches = build_cli().get_matches_from([
            "modelsweep", "-d", "train.tsv", "-y", "AUC", "-c", "--cutoffs", "-0.5", "0.5",
            "-m", "KNN", "Bayes", "-t", "-1", "-g", "CELL", "DRUG", "-o", "out",
        ]);
        let config = config_from_arguments(&matches).unwrap();
        assert_eq!(config.data, PathBuf::from("train.tsv"));
        assert_eq!(config.ycol, "AUC");
        assert!(config.classify);
        assert_eq!(config.cutoffs(), Some(&[-0.5, 0.5][..]));
        assert_eq!(config.models, vec!["KNN", "Bayes"]);
        assert_eq!(config.threads, -1);
        assert_eq!(config.groupcols, vec!["CELL", "DRUG"]);
        assert_eq!(config.out_dir, PathBuf::from("out"));
        assert_eq!(config.cv, 3);
    }

    #[test]
    fn zero_threads_means_all_cores() {
        let matches = build_cli().get_matches_from(["modelsweep", "-d", "train.tsv", "-t", "0"]);
        assert_eq!(config_from_arguments(&matches).unwrap().threads, 0);
    }

    #[test]
    fn unset_flags_keep_defaults() {
        let matches = build_cli().get_matches_from(["modelsweep", "-d", "train.tsv"]);
        let config = config_from_arguments(&matches).unwrap();
        assert_eq!(
            config,
            SweepConfig {
                data: "train.tsv".into(),
                ..SweepConfig::default()
            }
        );
    }
}
