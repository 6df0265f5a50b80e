//! Request options, validated once at the pipeline boundary.
//!
//! The host hands over a loosely typed attribute bag (shortcode attributes).
//! [`SheetRequest::from_attributes`] is the only place that interprets it.

use std::collections::BTreeMap;
use std::time::Duration;

use sheetview_core::{DocumentReference, Error};

/// Prefix of attributes forwarded to chart descriptors.
pub const CHART_OPTION_PREFIX: &str = "chart_";

/// Table `summary` attribute when none is given.
pub const DEFAULT_SUMMARY: &str = "Google Spreadsheet";

/// Default cache lifetime when `expire_in` is absent.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(600);

/// Presentation options for table and chart output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Leading rows rendered in the table header. Always at least 1.
    pub header_rows: usize,
    /// Leading rows discarded before header/body partitioning.
    pub strip_rows: usize,
    /// Extra CSS class appended to the base class.
    pub css_class: Option<String>,
    pub caption: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub style: Option<String>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub linkify: bool,
    /// Chart type; its presence selects chart mode.
    pub chart_type: Option<String>,
    /// `chart_*` attributes, keys as given.
    pub chart_options: BTreeMap<String, String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            header_rows: 1,
            strip_rows: 0,
            css_class: None,
            caption: None,
            title: None,
            summary: Some(DEFAULT_SUMMARY.to_string()),
            style: None,
            width: None,
            height: None,
            linkify: true,
            chart_type: None,
            chart_options: BTreeMap::new(),
        }
    }
}

/// Whether and for how long to cache the fetched payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub use_cache: bool,
    pub expire_in: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { use_cache: true, expire_in: DEFAULT_EXPIRE }
    }
}

/// A fully validated pipeline request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRequest {
    pub reference: DocumentReference,
    pub render: RenderOptions,
    pub cache: CachePolicy,
}

impl SheetRequest {
    /// A request for `key` with all defaults.
    pub fn for_key(key: impl Into<String>) -> Self {
        Self {
            reference: DocumentReference::from_key(key),
            render: RenderOptions::default(),
            cache: CachePolicy::default(),
        }
    }

    /// Interpret shortcode-style attributes.
    ///
    /// Recognized: `key` (required), `gid`, `query`, `summary`, `title`,
    /// `class`, `style`, `width`, `height`, `strip`, `header_rows`,
    /// `use_cache`, `expire_in`, `linkify`, `chart`, and any `chart_*`.
    /// Empty values count as absent; unknown attributes are ignored.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidReference` if `key` is missing.
    /// - `Error::InvalidInput` if a numeric or boolean attribute does not parse.
    pub fn from_attributes(attributes: &BTreeMap<String, String>, caption: Option<String>) -> Result<Self, Error> {
        Self::from_attributes_with_expiry(attributes, caption, DEFAULT_EXPIRE)
    }

    /// Like [`from_attributes`](Self::from_attributes) with a host-configured
    /// lifetime for requests that do not set `expire_in`.
    pub fn from_attributes_with_expiry(
        attributes: &BTreeMap<String, String>, caption: Option<String>, default_expire: Duration,
    ) -> Result<Self, Error> {
        let attrs = Attributes(attributes);

        let key = attrs
            .text("key")
            .ok_or_else(|| Error::InvalidReference("the key attribute is required".into()))?;
        let reference = DocumentReference::new(key, attrs.text("gid"), attrs.text("query"));

        let chart_options = attributes
            .iter()
            .filter(|(name, _)| name.starts_with(CHART_OPTION_PREFIX))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let render = RenderOptions {
            header_rows: attrs
                .integer("header_rows")?
                .filter(|n| *n > 0)
                .map_or(1, |n| n as usize),
            strip_rows: attrs.count("strip")?.unwrap_or(0),
            css_class: attrs.text("class"),
            caption: caption.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            title: attrs.text("title"),
            summary: attrs.text("summary").or_else(|| Some(DEFAULT_SUMMARY.to_string())),
            style: attrs.text("style"),
            width: attrs.text("width"),
            height: attrs.text("height"),
            linkify: attrs.flag("linkify")?.unwrap_or(true),
            chart_type: attrs.text("chart"),
            chart_options,
        };

        let cache = CachePolicy {
            use_cache: attrs.flag("use_cache")?.unwrap_or(true),
            expire_in: attrs
                .count("expire_in")?
                .map(|secs| Duration::from_secs(secs as u64))
                .unwrap_or(default_expire),
        };

        for name in attributes.keys() {
            if !KNOWN.contains(&name.as_str()) && !name.starts_with(CHART_OPTION_PREFIX) {
                tracing::debug!(attribute = %name, "ignoring unknown attribute");
            }
        }

        Ok(Self { reference, render, cache })
    }
}

const KNOWN: &[&str] = &[
    "key",
    "gid",
    "query",
    "summary",
    "title",
    "class",
    "style",
    "width",
    "height",
    "strip",
    "header_rows",
    "use_cache",
    "expire_in",
    "linkify",
    "chart",
];

struct Attributes<'a>(&'a BTreeMap<String, String>);

impl Attributes<'_> {
    fn text(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn count(&self, name: &str) -> Result<Option<usize>, Error> {
        self.text(name)
            .map(|v| {
                v.parse::<usize>()
                    .map_err(|_| Error::InvalidInput(format!("{name} must be a non-negative integer, got {v:?}")))
            })
            .transpose()
    }

    fn integer(&self, name: &str) -> Result<Option<i64>, Error> {
        self.text(name)
            .map(|v| {
                v.parse::<i64>()
                    .map_err(|_| Error::InvalidInput(format!("{name} must be an integer, got {v:?}")))
            })
            .transpose()
    }

    fn flag(&self, name: &str) -> Result<Option<bool>, Error> {
        self.text(name)
            .map(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(Error::InvalidInput(format!("{name} must be true or false, got {v:?}"))),
            })
            .transpose()
    }
}
