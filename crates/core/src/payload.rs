//! Raw payloads as retrieved from the origin.

use bytes::Bytes;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// How a payload body should be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Csv,
    Html,
}

impl ContentType {
    /// Classify a declared media type (e.g. a `Content-Type` header value).
    ///
    /// Anything that is not recognizably HTML is treated as CSV.
    pub fn from_media_type(media_type: Option<&str>) -> Self {
        let essence = media_type
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match essence.as_str() {
            "text/html" | "application/xhtml+xml" => ContentType::Html,
            _ => ContentType::Csv,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Csv => "csv",
            ContentType::Html => "html",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ContentType::Csv),
            "html" => Ok(ContentType::Html),
            other => Err(Error::CorruptPayload(format!("unknown content type tag: {other}"))),
        }
    }
}

/// A retrieved document body with its classified content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub content_type: ContentType,
    pub body: Bytes,
}

impl RawPayload {
    pub fn new(content_type: ContentType, body: impl Into<Bytes>) -> Self {
        Self { content_type, body: body.into() }
    }

    pub fn csv(body: impl Into<Bytes>) -> Self {
        Self::new(ContentType::Csv, body)
    }

    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::new(ContentType::Html, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_html() {
        assert_eq!(ContentType::from_media_type(Some("text/html; charset=utf-8")), ContentType::Html);
        assert_eq!(ContentType::from_media_type(Some("TEXT/HTML")), ContentType::Html);
        assert_eq!(ContentType::from_media_type(Some("application/xhtml+xml")), ContentType::Html);
    }

    #[test]
    fn test_media_type_defaults_to_csv() {
        assert_eq!(ContentType::from_media_type(Some("text/csv")), ContentType::Csv);
        assert_eq!(ContentType::from_media_type(Some("application/octet-stream")), ContentType::Csv);
        assert_eq!(ContentType::from_media_type(None), ContentType::Csv);
    }

    #[test]
    fn test_tag_parse() {
        assert_eq!("csv".parse::<ContentType>().unwrap(), ContentType::Csv);
        assert_eq!("html".parse::<ContentType>().unwrap(), ContentType::Html);
        assert!(matches!("xml".parse::<ContentType>(), Err(Error::CorruptPayload(_))));
    }
}
