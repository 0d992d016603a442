// src/lib.rs — Library root for designloop

pub mod cli;
pub mod core;
pub mod evaluator;
pub mod infra;
pub mod provider;
pub mod report;
pub mod util;
