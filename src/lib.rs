//! tidc - identity cloud administration SDK
//!
//! Typed operations over the access-management realm configuration, the
//! environment variables API and the WS-Federation admin API.

pub mod config;
pub mod idc;
pub mod ops;
pub mod progress;
pub mod resource;

/// Version injected at compile time via TIDC_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("TIDC_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};
