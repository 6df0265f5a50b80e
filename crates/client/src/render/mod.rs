//! Rendering of parsed tables.
//!
//! ### Table mode
//! - HTML table with positional `row-N`/`col-N` and `odd`/`even` classes.
//! - Every cell and user-supplied attribute is escaped; bare URLs are
//!   optionally turned into links afterwards.
//!
//! ### Chart mode
//! - A descriptor (element id, chart type, data URL, options) plus a container
//!   element for a client-side widget.

pub mod chart;
pub mod escape;
pub mod linkify;
pub mod table;

pub use chart::{CHART_CLASS, ChartDescriptor, query_endpoint_url, render_chart_descriptor};
pub use table::{TABLE_CLASS, render_table};

/// Prefix of every generated element id.
pub const BASE_ID_PREFIX: &str = "igsv-";

/// `odd` or `even` for a 1-based position.
pub fn parity(position: usize) -> &'static str {
    if position % 2 == 1 { "odd" } else { "even" }
}
