pub mod adapters;
pub mod audit;
pub mod config;
pub mod execution;
pub mod models;
pub mod orchestration;
pub mod parser;
pub mod reconcile;
