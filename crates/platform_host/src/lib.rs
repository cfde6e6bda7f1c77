//! Typed host-domain contracts shared by the window-manager runtime and its browser adapters.
//!
//! This crate is the API-first boundary for platform services used by the desktop shell: a
//! lightweight preference store (JSON text per key) and time helpers. Concrete browser adapters
//! live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;
pub mod time;

pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsError, PrefsStore,
    PrefsStoreFuture,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now, Clock, ManualClock, SystemClock};
