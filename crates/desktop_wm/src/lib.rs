//! Window management for a browser-rendered desktop.
//!
//! The pure core ([`registry`], [`geometry`], [`animation`], [`reducer`]) has no DOM access and is
//! driven by explicit timestamps. The Leptos shell ([`components`], [`runtime_context`], [`host`])
//! executes reducer effects against the browser.

pub mod animation;
pub mod components;
pub mod config;
pub mod content;
pub mod dock;
mod effect_executor;
pub mod geometry;
pub mod host;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod registry;
pub mod runtime_context;

pub use components::{use_desktop_runtime, DesktopProvider, DesktopRuntimeContext, DesktopWindowLayer};
pub use config::WindowManagerConfig;
pub use content::WindowContent;
pub use host::DesktopHostContext;
pub use model::*;
pub use reducer::{reduce_desktop, DesktopAction, DesktopState, ReducerError, RuntimeEffect};
pub use registry::WindowRegistry;
pub use runtime_context::ShellState;
