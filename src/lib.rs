pub mod app;
pub mod broker;
pub mod context;
pub mod core;
pub mod listener;

pub use inventory;
