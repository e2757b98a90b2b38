pub mod config;
pub mod draw;
pub mod generate;
pub mod providers;
pub mod serve;
pub mod techniques;

use std::path::Path;

use qprompt_core::{EntropySourceManager, Error, QpromptConfig, TechniqueCatalog};

/// Exit code for caller/config misuse.
const EXIT_USAGE: i32 = 2;
/// Exit code when no provider could serve a draw.
const EXIT_EXHAUSTED: i32 = 3;
/// Exit code after Ctrl+C.
const EXIT_CANCELLED: i32 = 130;

/// Process exit code for an error.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        e if e.is_caller_error() => EXIT_USAGE,
        Error::Config(_) => EXIT_USAGE,
        Error::AllProvidersExhausted { .. } => EXIT_EXHAUSTED,
        Error::Cancelled => EXIT_CANCELLED,
        _ => 1,
    }
}

/// Print `err` and exit with its code.
pub fn fail(err: &Error) -> ! {
    eprintln!("Error: {err}");
    std::process::exit(exit_code(err));
}

/// Resolve configuration from `--config`, `$QPROMPT_CONFIG`, or defaults.
pub fn load_config(path: Option<&Path>) -> QpromptConfig {
    QpromptConfig::resolve(path).unwrap_or_else(|e| fail(&e))
}

/// Build the provider chain and catalog described by `config`.
pub fn make_runtime(config: &QpromptConfig) -> (EntropySourceManager, TechniqueCatalog) {
    let manager = config.build_manager().unwrap_or_else(|e| fail(&e));
    let catalog = config.build_catalog().unwrap_or_else(|e| fail(&e));
    (manager, catalog)
}

/// Quantum badge used in listings.
pub fn badge(quantum: bool) -> &'static str {
    if quantum {
        "TRUE quantum"
    } else {
        "physical random"
    }
}
