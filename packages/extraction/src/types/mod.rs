//! Data types for the vacancy pipeline.

pub mod cities;
pub mod config;
pub mod page;
pub mod vacancy;
