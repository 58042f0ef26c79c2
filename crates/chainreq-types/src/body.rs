//! Request body variants and content types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content types a request body may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    /// `application/json`
    #[serde(rename = "application/json")]
    ApplicationJson,
    /// `application/ld+json`
    #[serde(rename = "application/ld+json")]
    ApplicationLdJson,
    /// `application/hal+json`
    #[serde(rename = "application/hal+json")]
    ApplicationHalJson,
    /// `application/vnd.api+json`
    #[serde(rename = "application/vnd.api+json")]
    VndApiJson,
    /// `application/xml`
    #[serde(rename = "application/xml")]
    ApplicationXml,
    /// `application/x-www-form-urlencoded`
    #[serde(rename = "application/x-www-form-urlencoded")]
    FormUrlEncoded,
    /// `multipart/form-data`
    #[serde(rename = "multipart/form-data")]
    MultipartFormData,
    /// `text/html`
    #[serde(rename = "text/html")]
    TextHtml,
    /// `text/plain`
    #[serde(rename = "text/plain")]
    TextPlain,
}

impl ContentType {
    /// All known content types
    pub const ALL: [ContentType; 9] = [
        Self::ApplicationJson,
        Self::ApplicationLdJson,
        Self::ApplicationHalJson,
        Self::VndApiJson,
        Self::ApplicationXml,
        Self::FormUrlEncoded,
        Self::MultipartFormData,
        Self::TextHtml,
        Self::TextPlain,
    ];

    /// MIME string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ApplicationJson => "application/json",
            Self::ApplicationLdJson => "application/ld+json",
            Self::ApplicationHalJson => "application/hal+json",
            Self::VndApiJson => "application/vnd.api+json",
            Self::ApplicationXml => "application/xml",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::MultipartFormData => "multipart/form-data",
            Self::TextHtml => "text/html",
            Self::TextPlain => "text/plain",
        }
    }

    /// JSON family; these bodies carry the call envelope
    #[inline]
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(
            self,
            Self::ApplicationJson | Self::ApplicationLdJson | Self::ApplicationHalJson | Self::VndApiJson
        )
    }

    /// Multipart bodies hold structured entries instead of text
    #[inline]
    #[must_use]
    pub fn is_multipart(self) -> bool {
        matches!(self, Self::MultipartFormData)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown content type: {s}"))
    }
}

/// Value of a multipart entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FormDataValue {
    /// Plain text field
    Text(String),
    /// File attachments, by path
    Files(Vec<String>),
}

/// One multipart entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDataEntry {
    /// Field name
    pub key: String,
    /// Field value
    pub value: FormDataValue,
    /// Only active entries are sent
    pub active: bool,
}

impl FormDataEntry {
    /// Active text entry
    #[must_use]
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: FormDataValue::Text(value.into()),
            active: true,
        }
    }

    /// Text value, if this is not a file entry
    #[inline]
    #[must_use]
    pub fn text_value(&self) -> Option<&str> {
        match &self.value {
            FormDataValue::Text(v) => Some(v),
            FormDataValue::Files(_) => None,
        }
    }
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RestReqBody {
    /// No body
    #[default]
    None,
    /// Text body with a declared content type
    Raw {
        /// Declared content type
        content_type: ContentType,
        /// Body text
        body: String,
    },
    /// `multipart/form-data` entries
    Multipart {
        /// Entries in order
        entries: Vec<FormDataEntry>,
    },
}

impl RestReqBody {
    /// Raw text body
    #[must_use]
    pub fn raw(content_type: ContentType, body: impl Into<String>) -> Self {
        Self::Raw {
            content_type,
            body: body.into(),
        }
    }

    /// Declared content type, `None` for an empty body
    #[must_use]
    pub fn content_type(&self) -> Option<ContentType> {
        match self {
            Self::None => None,
            Self::Raw { content_type, .. } => Some(*content_type),
            Self::Multipart { .. } => Some(ContentType::MultipartFormData),
        }
    }

    /// Body text for raw bodies
    #[must_use]
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Raw { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Parse `key: value` lines; `#` marks an inactive entry
///
/// Lines without a colon are skipped.
#[must_use]
pub fn parse_raw_key_value(text: &str) -> Vec<FormDataEntry> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (active, line) = match line.strip_prefix('#') {
                Some(rest) => (false, rest.trim_start()),
                None => (true, line),
            };
            let (key, value) = line.split_once(':')?;
            Some(FormDataEntry {
                key: key.trim().to_string(),
                value: FormDataValue::Text(value.trim().to_string()),
                active,
            })
        })
        .collect()
}

/// Render text entries as `key: value` lines; file entries are dropped
#[must_use]
pub fn raw_key_value_to_string(entries: &[FormDataEntry]) -> String {
    entries
        .iter()
        .filter_map(|e| {
            let value = e.text_value()?;
            let prefix = if e.active { "" } else { "#" };
            Some(format!("{prefix}{}: {value}", e.key))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_parses_mime_strings() {
        assert_eq!(
            "application/json".parse::<ContentType>().unwrap(),
            ContentType::ApplicationJson
        );
        assert_eq!(
            "Multipart/Form-Data".parse::<ContentType>().unwrap(),
            ContentType::MultipartFormData
        );
        assert!("image/png".parse::<ContentType>().is_err());
    }

    #[test]
    fn json_family() {
        assert!(ContentType::VndApiJson.is_json());
        assert!(!ContentType::TextPlain.is_json());
        assert!(!ContentType::MultipartFormData.is_json());
    }

    #[test]
    fn body_reports_content_type() {
        assert_eq!(RestReqBody::None.content_type(), None);
        let multipart = RestReqBody::Multipart { entries: vec![] };
        assert_eq!(multipart.content_type(), Some(ContentType::MultipartFormData));
    }

    #[test]
    fn raw_key_value_round_trip() {
        let entries = parse_raw_key_value("a: 1\n#b: 2\n\nbroken line\nc:3");
        assert_eq!(entries.len(), 3);
        assert!(entries[0].active);
        assert!(!entries[1].active);
        assert_eq!(entries[2].text_value(), Some("3"));

        assert_eq!(raw_key_value_to_string(&entries), "a: 1\n#b: 2\nc: 3");
    }

    #[test]
    fn file_entries_are_not_rendered() {
        let entries = vec![
            FormDataEntry::text("name", "x"),
            FormDataEntry {
                key: "upload".into(),
                value: FormDataValue::Files(vec!["/tmp/a.bin".into()]),
                active: true,
            },
        ];
        assert_eq!(raw_key_value_to_string(&entries), "name: x");
    }
}
