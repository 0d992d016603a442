// src/core/mod.rs — Design exploration pipeline

pub mod backend;
pub mod brief;
pub mod extract;
pub mod gate;
pub mod generator;
pub mod orchestrator;
pub mod prompts;
pub mod refiner;
pub mod selector;
pub mod types;
