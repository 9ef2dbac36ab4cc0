//! Built-in provider backends.

pub mod bitmovin;
pub mod encodingcom;

use crate::provider::registry::ProviderRegistry;

/// Register every built-in provider factory on `registry`.
pub fn register_builtin(registry: &mut ProviderRegistry) {
    registry.register(bitmovin::NAME, bitmovin::factory);
    registry.register(encodingcom::NAME, encodingcom::factory);
}
