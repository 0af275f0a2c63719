//! Built-in displayers
//!
//! Displayers only read store snapshots; they are driven by their own timer
//! and never block sampling.

mod console;

pub use console::ConsoleDisplayer;
