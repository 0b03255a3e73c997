//! Presentation: number formatting, colour scales, SVG choropleth, text report.

pub mod format;
pub mod report;
pub mod scale;
pub mod svg;
