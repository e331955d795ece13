//! Backend side of the app: the command queue and the worker that serves it.

pub mod commands;
pub mod runtime;
