//! Library side of the `samc` command-line driver.
//!
//! The binary only dispatches on the command name; argument parsing and the
//! commands themselves live here so they can be tested without a process.

mod args;
pub mod commands;
mod error;

use std::sync::Once;

pub use args::{parse_edit, parse_parser_options, EditArg};
pub use error::CliError;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=sam_parse=debug`;
/// set `SAMC_LOG_TREE` as well for indented, span-nested output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_err() {
            return;
        }
        let filter = EnvFilter::from_default_env();
        if std::env::var_os("SAMC_LOG_TREE").is_some() {
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        } else {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .with(filter)
                .init();
        }
    });
}
