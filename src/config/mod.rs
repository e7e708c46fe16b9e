//! Configuration management for netprobe.
//!
//! Provides XDG-compliant settings lookup. Settings are read-only at runtime.

mod settings;

pub use settings::{Paths, Settings};
