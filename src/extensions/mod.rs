//! Extension modules for the MAC simulator
//!
//! Extensions wrap the core unit in a specific pin-level harness.

pub mod tiny_tapeout;

pub use tiny_tapeout::TinyTapeoutExtension;
