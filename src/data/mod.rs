//! Input loading: the consumption table and the region geometry.

pub mod cache;
pub mod geometry;
pub mod loader;
pub mod record;

pub use cache::{DataStore, LoadCache};
pub use geometry::{GeometryCollection, load_geometry};
pub use loader::{LoaderOptions, load_table, load_table_file};
pub use record::{ColumnNames, Record, Table};
