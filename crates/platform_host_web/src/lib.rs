//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! The desktop shell only needs lightweight preferences from the browser: `localStorage`-backed
//! JSON per key. Off `wasm32` the adapters degrade to no-ops so the runtime and its tests build
//! natively.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
pub mod storage;

pub use adapters::{
    host_strategy_name, prefs_store, selected_host_strategy, HostStrategy, PrefsStoreAdapter,
};
pub use storage::local_prefs::WebPrefsStore;
