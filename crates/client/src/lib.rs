//! Client code for sheetview.
//!
//! This crate provides reference resolution, the HTTP fetcher, payload
//! parsing, table and chart rendering, and the pipeline that composes them.

pub mod fetch;
pub mod options;
pub mod parse;
pub mod pipeline;
pub mod render;
pub mod resolve;

pub use fetch::{FetchConfig, Fetcher, HttpFetcher};
pub use options::{CachePolicy, RenderOptions, SheetRequest};
pub use parse::{Row, Table, parse};
pub use pipeline::{Pipeline, Rendered, error_markup};
pub use render::{ChartDescriptor, render_chart_descriptor, render_table};
pub use resolve::resolve;
