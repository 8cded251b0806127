pub mod common;
pub mod config;
pub mod consolidation_algorithm;
pub mod consolidation_algorithms;
pub mod host_profiler;
pub mod stats;
