//! Engine and scheduling for sens-capture

mod engine;
mod update_manager;

pub use engine::Engine;
pub use update_manager::UpdateManager;
