//! Integration test modules.

mod commands;
mod persistence;
mod timing;
