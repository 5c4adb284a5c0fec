pub mod artifacts;
pub mod delimited;

pub use artifacts::{artifact_path, write_metrics, write_predictions};
pub use delimited::{read_table, sniff_delimiter};
