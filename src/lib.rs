//! Exact-match table placement engine.
//!
//! Hardware exact-match tables store each key in one of a few candidate
//! locations picked by hash functions. When every candidate is taken, an
//! existing entry can often be relocated to one of its own alternates to make
//! room. This library models a table as a graph of slots, searches for the
//! shortest such relocation chain with a bounded breadth-first search, and
//! applies the chain under a transaction that can be rolled back if the
//! hardware update fails.
//!
//! # Layout
//!
//! - [`data_structures`]: the placement graph and the per-table registry
//! - [`simulation`]: synthetic key generation and a table driver that
//!   exercises the engine end to end
//! - [`config`]: layered configuration (defaults, file, environment)
//! - [`error`]: the application error type and error reporting

pub mod config;
pub mod data_structures;
pub mod error;
pub mod simulation;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version of the placement engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the global `tracing` subscriber described by `log`.
///
/// `RUST_LOG` takes precedence over `log.level` when set.
pub fn init_logging(log: &config::LogConfig) -> error::EngineResult<()> {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(log.source_location)
        .with_line_number(log.source_location)
        .with_writer(std::io::stderr);

    let result = if log.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| {
        error::EngineError::Custom(format!("Failed to set global tracing subscriber: {e}"))
    })
}
