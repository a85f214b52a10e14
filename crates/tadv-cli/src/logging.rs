use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Install the stderr subscriber. `TADV_LOG` takes `EnvFilter` syntax,
/// e.g. `TADV_LOG=tadv_engine=debug`; the default is `warn`.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("TADV_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
