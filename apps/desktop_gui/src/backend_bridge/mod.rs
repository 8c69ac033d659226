//! Backend bridge: command definitions and the worker thread that runs them.

pub mod commands;
pub mod runtime;
