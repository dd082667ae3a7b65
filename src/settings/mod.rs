//! Settings come from a TOML file (`settings/dev.toml` in debug builds,
//! `settings/release.toml` in release) or from `--settings <path>`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
