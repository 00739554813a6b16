pub mod analysis;
pub mod base;
pub mod config;
pub mod cycle;
pub mod market_data;
pub mod publish;
