//! Subscriber setup for the binary.
//!
//! The library crates only emit `tracing` events. Installing a subscriber is
//! left to the process entry point (or to a test, via
//! `tracing::subscriber::with_default`).

use tracing_subscriber::EnvFilter;

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "userstore=debug,userstore_db=trace,r2d2=debug"
    } else {
        "userstore=info,userstore_db=info,r2d2=warn"
    }
}

/// Install the global fmt subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the default filter.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
