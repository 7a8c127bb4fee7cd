//! ledgerlift-export: writers for the reconstructed statement table.

pub mod csv_out;
pub mod folders;
pub mod xlsx;

pub use csv_out::write_csv;
pub use folders::{dated_output_dir, prune_dated_dirs};
pub use xlsx::write_xlsx;
