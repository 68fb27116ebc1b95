pub mod api;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod imagery;
pub mod pipeline;
pub mod state;
pub mod telemetry;
pub mod utils;
pub mod vision;
