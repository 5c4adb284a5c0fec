use anyhow::Result;
use log::LevelFilter;

use modelsweep::trainer::CrossValTrainer;
use modelsweep_cli::cli::build_cli;
use modelsweep_cli::sweep::input::config_from_arguments;
use modelsweep_cli::sweep::runner::{execute, Outcome};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("MODELSWEEP_LOG", "error,modelsweep=info"))
        .init();

    let matches = build_cli().get_matches();
    let config = config_from_arguments(&matches)?;
    log::info!(
        "[modelsweep::main] Sweeping {:?} with models {:?}",
        config.data,
        config.models
    );

    let mut trainer = CrossValTrainer::new();
    match execute(&config, &mut trainer) {
        Ok(Outcome::NotEnoughClasses { good_bins }) => {
            println!("Not enough classes");
            log::info!(
                "[modelsweep::main] Only {} usable class bin(s); nothing to train",
                good_bins
            );
            Ok(())
        }
        Ok(outcome) => {
            let failures = outcome.failures();
            if !failures.is_empty() {
                log::error!("Sweep finished with failing models: {}", failures.join(", "));
                std::process::exit(1)
            }
            log::info!("[modelsweep::main] Sweep complete");
            Ok(())
        }
        Err(e) => {
            log::error!("Sweep failed: {}", e);
            std::process::exit(1)
        }
    }
}
