//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Input (key state oracle, per-step sampling)
//! - Storage (LocalStorage on web)

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod storage;

pub use input::{Action, InputOracle, InputSampler, KeyCode};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorageStore;
