use crate::backend::ReportBackend;
use crate::core::{ReportConfig, ReportCore};
use crate::layer::ReportLayer;
use std::sync::Arc;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the global subscriber installed by
/// [`init_tracing_with_config`].
///
/// **Fields**
/// - `report`: gate, merge policy and level mapping of the [`ReportCore`].
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`ReportLayer`] so every event is also printed.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub report: ReportConfig,
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            report: ReportConfig::default(),
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that tees events to stdout (when
/// enabled) and to `backend` through a new [`ReportCore`].
///
/// **Returns**
/// - The shared core, for attaching persistent fields with
///   [`ReportCore::with`] and draining with [`ReportCore::sync`] before exit.
/// - `Err(..)` if a global subscriber was already set.
pub fn init_tracing_with_config(
    backend: Arc<dyn ReportBackend>,
    config: LayerConfig,
) -> Result<Arc<ReportCore>, SetGlobalDefaultError> {
    let core = Arc::new(ReportCore::new(backend, config.report));
    let layer = ReportLayer::new(Arc::clone(&core));

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(core)
}

/// Initialize tracing with [`LayerConfig::default`]: warnings and above are
/// reported, everything is printed to stdout.
pub fn init_tracing(backend: Arc<dyn ReportBackend>) -> Result<Arc<ReportCore>, SetGlobalDefaultError> {
    init_tracing_with_config(backend, LayerConfig::default())
}
