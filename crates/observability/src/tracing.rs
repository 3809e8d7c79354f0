//! Process-wide log subscriber.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Install a JSON-lines subscriber on stdout.
///
/// Event fields are flattened into the top-level object and the enclosing
/// span (store operation, request) is attached as `span`. Only the first call
/// installs anything.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_env_filter(env_filter())
        .finish()
        .try_init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_a_no_op() {
        init();
        init();
    }

    #[test]
    fn default_directive_is_info() {
        assert_eq!(EnvFilter::new(DEFAULT_DIRECTIVE).to_string(), "info");
    }
}
