//! Regional energy-consumption dashboard: cascading filters over a CSV table,
//! per-region sums, and a choropleth over region boundaries.

pub mod analysis;
#[cfg(feature = "api")]
pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod io;
pub mod logging;
pub mod render;
#[cfg(feature = "tui")]
pub mod tui;
