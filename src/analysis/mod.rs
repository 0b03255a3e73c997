//! Filter cascade and aggregation over a loaded table.

pub mod aggregate;
pub mod filter;

pub use aggregate::{AggregatedResult, aggregate};
pub use filter::{FilterOptions, FilterRequest, FilterSelection, FilterSelector, ResolvedFilters};
