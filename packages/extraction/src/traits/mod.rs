//! Core trait abstractions for the vacancy pipeline.
//!
//! These traits define the seams where applications plug in transport,
//! persistence and the city reference source.

pub mod cities;
pub mod fetcher;
pub mod store;
