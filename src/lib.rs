pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod feature;
pub mod indicator;
pub mod model;
pub mod report;
pub mod stats;
pub mod strategy;
