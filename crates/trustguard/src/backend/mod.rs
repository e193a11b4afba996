//! Tunnel engines available to the CLI.

mod simulated;
mod wg_quick;

use std::path::Path;
use std::sync::Arc;

use trustguard_config::BackendKind;
use trustguard_core::TunnelBackend;

pub use simulated::SimulatedBackend;
pub use wg_quick::WgQuickBackend;

/// Instantiate the configured engine. `state_dir` holds the rendered
/// interface configuration for `wg-quick`.
pub fn build(kind: BackendKind, state_dir: &Path) -> Arc<dyn TunnelBackend> {
    match kind {
        BackendKind::WgQuick => Arc::new(WgQuickBackend::new(state_dir)),
        BackendKind::Simulated => Arc::new(SimulatedBackend::new()),
    }
}
