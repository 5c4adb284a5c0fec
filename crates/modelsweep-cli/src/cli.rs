use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, ValueHint};

/// The `modelsweep` command line.
pub fn build_cli() -> Command {
    Command::new("modelsweep")
        .version(clap::crate_version!())
        .about("Sweep a tabular dataset through a list of regression or classification models")
        .arg(
            Arg::new("data")
                .short('d')
                .long("data")
                .help("Input table (*.csv is comma separated, anything else tab separated)")
                .required_unless_present("config")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("ycol")
                .short('y')
                .long("ycol")
                .help("Target column, as a 0-based index or a column name [default: 0]")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("classify")
                .short('c')
                .long("classify")
                .help("Bin the target and train classifiers instead of regressors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("bins")
                .short('b')
                .long("bins")
                .help("Number of equal-width target bins; 0 infers them [default: 0]")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("cutoffs")
                .long("cutoffs")
                .help("Explicit bin boundaries, overriding --bins")
                .num_args(1..)
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("models")
                .short('m')
                .long("models")
                .help("Models to sweep, in order [default: LightGBM RandomForest XGB.1K]")
                .num_args(1..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("cv")
                .long("cv")
                .help("Cross-validation folds [default: 3]")
                .value_parser(clap::value_parser!(u32).range(2..)),
        )
        .arg(
            Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Threads per training job; -1 (or any value <= 0) uses all cores [default: 4]")
                .allow_negative_numbers(true)
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("groupcols")
                .short('g')
                .long("groupcols")
                .help("Columns whose values are never split across folds")
                .num_args(1..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("out_dir")
                .short('o')
                .long("out_dir")
                .help("Directory receiving predictions and metrics [default: p1save]")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("prefix")
                .short('p')
                .long("prefix")
                .help("Artifact file prefix [default: data file name]")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for fold shuffling and bagging [default: 2017]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("keep_going")
                .long("keep-going")
                .help("Log failing models and continue with the next one")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON sweep configuration; command-line options override it")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
