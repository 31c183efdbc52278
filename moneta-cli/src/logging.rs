use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static INIT_TRACING: Once = Once::new();

const DEFAULT_FILTER: &str = "moneta_core=info,moneta_ingest=info,moneta_cli=info";
const VERBOSE_FILTER: &str = "moneta_core=debug,moneta_ingest=debug,moneta_cli=debug";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    INIT_TRACING.call_once(|| {
        let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}
