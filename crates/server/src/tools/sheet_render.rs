//! sheet_render tool implementation.
//!
//! Runs the pipeline for one set of shortcode attributes. Document failures
//! come back as inline error markup, not as tool errors.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sheetview_client::{ChartDescriptor, Pipeline};

use super::json_result;

/// Input parameters for the sheet_render tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetRenderParams {
    /// Shortcode attributes; `key` is required.
    pub attributes: BTreeMap<String, String>,

    /// Enclosed shortcode content, rendered as the table caption.
    #[serde(default)]
    pub caption: Option<String>,
}

/// Output structure for the sheet_render tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SheetRenderOutput {
    /// Table, chart container, or inline error markup.
    pub markup: String,
    /// Chart descriptor, in chart mode only.
    pub chart: Option<ChartOutput>,
    /// Whether the payload came from the cache.
    pub from_cache: bool,
    /// Cache key of the document.
    pub cache_key: Option<String>,
    /// Pipeline invocation sequence number.
    pub invocation: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChartOutput {
    pub element_id: String,
    pub chart_type: String,
    pub data_url: String,
    pub options: BTreeMap<String, String>,
}

impl From<ChartDescriptor> for ChartOutput {
    fn from(chart: ChartDescriptor) -> Self {
        Self { element_id: chart.element_id, chart_type: chart.chart_type, data_url: chart.data_url, options: chart.options }
    }
}

/// Implementation of the sheet_render tool.
pub async fn render_impl(pipeline: &Pipeline, params: SheetRenderParams) -> Result<CallToolResult, McpError> {
    let rendered = pipeline.render_attributes(&params.attributes, params.caption).await;

    let output = SheetRenderOutput {
        markup: rendered.markup,
        chart: rendered.chart.map(ChartOutput::from),
        from_cache: rendered.from_cache,
        cache_key: rendered.cache_key,
        invocation: rendered.invocation,
    };

    json_result(&output)
}
