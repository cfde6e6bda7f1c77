//! Storage contracts for host-backed desktop preferences.

pub mod prefs;
