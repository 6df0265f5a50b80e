//! Chart descriptors for client-side chart widgets.
//!
//! No chart is drawn here. The descriptor names the element, the chart type
//! and the query-endpoint URL the widget loads its data from.

use std::collections::BTreeMap;

use serde::Serialize;
use sheetview_core::FetchTarget;

use super::BASE_ID_PREFIX;
use super::escape::escape_attribute;
use crate::options::{CHART_OPTION_PREFIX, RenderOptions};
use crate::resolve::{CSV_EXPORT_ENDPOINT, QUERY_ENDPOINT};

/// Class every chart container carries.
pub const CHART_CLASS: &str = "igsv-chart";

/// Attributes a client-side chart widget consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDescriptor {
    /// Unique per pipeline invocation.
    pub element_id: String,
    pub chart_type: String,
    pub data_url: String,
    /// Hyphenated option names (`chart_title` becomes `chart-title`) to values.
    pub options: BTreeMap<String, String>,
}

/// Build the descriptor for a resolved target.
pub fn render_chart_descriptor(target: &FetchTarget, options: &RenderOptions, invocation: u64) -> ChartDescriptor {
    let chart_type = options.chart_type.clone().unwrap_or_default();
    let id_type: String = chart_type
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();

    let chart_options = options
        .chart_options
        .iter()
        .filter(|(name, value)| name.starts_with(CHART_OPTION_PREFIX) && !value.trim().is_empty())
        .map(|(name, value)| (name.replace('_', "-"), value.clone()))
        .collect();

    ChartDescriptor {
        element_id: format!("{BASE_ID_PREFIX}{invocation}-{id_type}chart-{}", target.document_key),
        chart_type,
        data_url: query_endpoint_url(target),
        options: chart_options,
    }
}

/// Data URL for a chart: the query-language endpoint.
///
/// Targets that already use it are returned unchanged; a CSV export URL is
/// rewritten to the endpoint root, keeping any sheet parameter.
pub fn query_endpoint_url(target: &FetchTarget) -> String {
    if target.is_query {
        return target.url.clone();
    }

    let with_params = format!("{CSV_EXPORT_ENDPOINT}&");
    if target.url.contains(&with_params) {
        target.url.replacen(&with_params, &format!("{QUERY_ENDPOINT}?"), 1)
    } else {
        target.url.replacen(CSV_EXPORT_ENDPOINT, QUERY_ENDPOINT, 1)
    }
}

impl ChartDescriptor {
    /// Container element carrying the descriptor as `data-*` attributes.
    pub fn to_markup(&self, options: &RenderOptions) -> String {
        let class = match options.css_class.as_deref() {
            Some(extra) => format!("{CHART_CLASS} {extra}"),
            None => CHART_CLASS.to_string(),
        };

        let mut html = format!(
            "<div id=\"{}\" class=\"{}\" data-chart-type=\"{}\" data-datasource-href=\"{}\"",
            escape_attribute(&self.element_id),
            escape_attribute(&class),
            escape_attribute(&self.chart_type),
            escape_attribute(&self.data_url),
        );

        for (name, value) in &self.options {
            html.push_str(&format!(" data-{}=\"{}\"", escape_attribute(name), escape_attribute(value)));
        }

        if let Some(title) = &options.title {
            html.push_str(&format!(" title=\"{}\"", escape_attribute(title)));
        }

        let style = container_style(options);
        if !style.is_empty() {
            html.push_str(&format!(" style=\"{}\"", escape_attribute(&style)));
        }

        html.push_str("></div>");
        html
    }
}

fn container_style(options: &RenderOptions) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(style) = &options.style {
        parts.push(style.trim().trim_end_matches(';').to_string());
    }
    for (property, value) in [("width", &options.width), ("height", &options.height)] {
        if let Some(value) = value {
            parts.push(format!("{property}: {}", css_length(value)));
        }
    }
    parts.join("; ")
}

/// Bare numbers are taken as pixels.
fn css_length(value: &str) -> String {
    if value.chars().all(|c| c.is_ascii_digit()) { format!("{value}px") } else { value.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://docs.google.com/spreadsheets/d/DOC/";

    fn target(url: &str, is_query: bool) -> FetchTarget {
        FetchTarget { url: url.to_string(), is_query, document_key: "DOC".into() }
    }

    fn chart(kind: &str) -> RenderOptions {
        RenderOptions { chart_type: Some(kind.into()), ..Default::default() }
    }

    #[test]
    fn test_rewrites_export_to_query_root() {
        let t = target(&format!("{BASE}export?format=csv"), false);
        assert_eq!(query_endpoint_url(&t), format!("{BASE}gviz/tq"));
    }

    #[test]
    fn test_rewrite_keeps_sheet() {
        let t = target(&format!("{BASE}export?format=csv&gid=4"), false);
        assert_eq!(query_endpoint_url(&t), format!("{BASE}gviz/tq?gid=4"));
    }

    #[test]
    fn test_query_target_unchanged() {
        let url = format!("{BASE}gviz/tq?tqx=out:csv&tq=select+A");
        assert_eq!(query_endpoint_url(&target(&url, true)), url);
    }

    #[test]
    fn test_element_id_unique_per_invocation() {
        let t = target(&format!("{BASE}export?format=csv"), false);
        let first = render_chart_descriptor(&t, &chart("Bar"), 1);
        let second = render_chart_descriptor(&t, &chart("Bar"), 2);
        assert_eq!(first.element_id, "igsv-1-barchart-DOC");
        assert_eq!(second.element_id, "igsv-2-barchart-DOC");
        assert_eq!(first.chart_type, "Bar");
    }

    #[test]
    fn test_chart_options_hyphenated_and_filtered() {
        let mut options = chart("Line");
        options.chart_options.insert("chart_title".into(), "Revenue".into());
        options.chart_options.insert("chart_h_axis".into(), "{\"title\":\"Month\"}".into());
        options.chart_options.insert("chart_empty".into(), "  ".into());

        let descriptor = render_chart_descriptor(&target(&format!("{BASE}export?format=csv"), false), &options, 1);
        assert_eq!(descriptor.options.len(), 2);
        assert_eq!(descriptor.options.get("chart-title").map(String::as_str), Some("Revenue"));
        assert!(descriptor.options.contains_key("chart-h-axis"));
    }

    #[test]
    fn test_markup() {
        let mut options = chart("Pie");
        options.chart_options.insert("chart_title".into(), "A \"quoted\" title".into());
        options.width = Some("400".into());
        options.height = Some("50%".into());

        let descriptor = render_chart_descriptor(&target(&format!("{BASE}export?format=csv"), false), &options, 3);
        assert_eq!(
            descriptor.to_markup(&options),
            format!(
                "<div id=\"igsv-3-piechart-DOC\" class=\"igsv-chart\" data-chart-type=\"Pie\" \
                 data-datasource-href=\"{BASE}gviz/tq\" data-chart-title=\"A &quot;quoted&quot; title\" \
                 style=\"width: 400px; height: 50%\"></div>"
            )
        );
    }
}
