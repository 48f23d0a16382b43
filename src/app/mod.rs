//! Application module

pub mod builtin;
pub mod cli;
pub mod startup;
