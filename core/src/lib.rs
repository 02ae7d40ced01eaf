//! # Ember Engine Core
//!
//! Engine-agnostic building blocks shared by the ECS and the application:
//! math helpers, the `.ani` / `.mesh` binary codecs, skeletal animation
//! evaluation and the GUID resource cache.

pub mod animation;
pub mod binary;
pub mod math;
pub mod mesh;
pub mod resource;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logs the core version. Call after the logger is installed.
pub fn init() {
    log::info!("Ember Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
