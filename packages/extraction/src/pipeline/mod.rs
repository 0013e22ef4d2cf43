//! Scraping pipeline - the core of the library.
//!
//! The pipeline orchestrates, per seed URL:
//! - Fetch (via any [`Fetcher`](crate::traits::fetcher::Fetcher))
//! - Field extraction into parallel columns
//! - Record assembly with an alignment check
//! - Writes to a [`VacancyStore`](crate::traits::store::VacancyStore)

pub mod assemble;
pub mod extract;
pub mod run;

pub use assemble::{assemble, assemble_aligned};
pub use extract::{FieldExtractor, MetaFields, SkillsFields};
pub use run::{FailurePolicy, Pipeline, RunPolicy, RunReport};
