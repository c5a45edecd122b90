//! Side-effecting operations: process execution, git, configuration.

pub mod config;
pub mod git;
pub mod inspector;
pub mod merge;
pub mod process;
pub mod resolver;
