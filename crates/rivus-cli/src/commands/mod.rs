pub mod batch;
pub mod completions;
pub mod config;
pub mod db;
pub mod graph;
pub mod grid;
pub mod plot;
pub mod reanalyse;
pub mod report;
pub mod snap;
pub mod solve;
