//! Effective request: templates resolved, inactive entries dropped

use crate::body::{ContentType, FormDataValue, RestReqBody};
use crate::request::RestRequest;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name, referenced as `<<key>>`
    pub key: String,
    /// Replacement text
    pub value: String,
}

impl EnvVar {
    /// New variable
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Global variables plus the selected environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedEnv {
    /// Global variables
    pub global: Vec<EnvVar>,
    /// Variables of the selected environment; these win over globals
    pub selected: Vec<EnvVar>,
}

impl CombinedEnv {
    /// Value for `key`, selected environment first
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.selected
            .iter()
            .rev()
            .chain(self.global.iter().rev())
            .find(|v| v.key == key)
            .map(|v| v.value.as_str())
    }

    /// Replace every `<<name>>` with its value
    ///
    /// Unknown names are left verbatim.
    #[must_use]
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find("<<") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find(">>") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = &after[..end];
            match self.lookup(name) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("<<");
                    out.push_str(name);
                    out.push_str(">>");
                }
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

/// Resolved key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    /// Key
    pub key: String,
    /// Value
    pub value: String,
}

/// Resolved body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectiveBody {
    /// No body
    #[default]
    None,
    /// Text with its content type
    Text {
        /// Declared content type
        content_type: ContentType,
        /// Rendered text
        body: String,
    },
    /// Active multipart text fields
    FormData {
        /// Rendered fields in order
        entries: Vec<KeyValue>,
    },
}

impl EffectiveBody {
    /// Body text, when it is a text body
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Request snapshot ready for execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveRequest {
    /// Source request
    pub request: RestRequest,
    /// Rendered URL
    pub effective_final_url: String,
    /// Active rendered headers, last key wins
    pub effective_final_headers: Vec<KeyValue>,
    /// Active rendered params, last key wins
    pub effective_final_params: Vec<KeyValue>,
    /// Rendered body
    pub effective_final_body: EffectiveBody,
}

impl EffectiveRequest {
    /// Resolve a request against environment variables
    ///
    /// A `content-type` header is added from the body when none is set.
    #[must_use]
    pub fn resolve(request: &RestRequest, env: &CombinedEnv) -> Self {
        let render_pairs = |pairs: IndexMap<String, String>| {
            pairs
                .into_iter()
                .map(|(key, value)| KeyValue {
                    key: env.render(&key),
                    value: env.render(&value),
                })
                .collect::<Vec<_>>()
        };

        let mut headers = render_pairs(request.active_headers());
        let params = render_pairs(request.active_args());

        let body = match &request.body {
            RestReqBody::None => EffectiveBody::None,
            RestReqBody::Raw { content_type, body } => EffectiveBody::Text {
                content_type: *content_type,
                body: env.render(body),
            },
            RestReqBody::Multipart { entries } => EffectiveBody::FormData {
                entries: entries
                    .iter()
                    .filter(|e| e.active)
                    .filter_map(|e| match &e.value {
                        FormDataValue::Text(v) => Some(KeyValue {
                            key: env.render(&e.key),
                            value: env.render(v),
                        }),
                        FormDataValue::Files(_) => None,
                    })
                    .collect(),
            },
        };

        let has_content_type = headers
            .iter()
            .any(|h| h.key.eq_ignore_ascii_case("content-type"));
        if let (false, Some(content_type)) = (has_content_type, request.body.content_type()) {
            headers.push(KeyValue {
                key: "content-type".to_string(),
                value: content_type.as_str().to_string(),
            });
        }

        Self {
            request: request.clone(),
            effective_final_url: env.render(&request.url),
            effective_final_headers: headers,
            effective_final_params: params,
            effective_final_body: body,
        }
    }

    /// Plain resolution with no variables
    #[must_use]
    pub fn from_request(request: &RestRequest) -> Self {
        Self::resolve(request, &CombinedEnv::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::FormDataEntry;
    use crate::request::{RestHeader, RestParam};
    use pretty_assertions::assert_eq;

    fn env() -> CombinedEnv {
        CombinedEnv {
            global: vec![EnvVar::new("host", "global.example"), EnvVar::new("acct", "g")],
            selected: vec![EnvVar::new("host", "selected.example")],
        }
    }

    #[test]
    fn selected_env_wins_over_global() {
        let env = env();
        assert_eq!(env.lookup("host"), Some("selected.example"));
        assert_eq!(env.lookup("acct"), Some("g"));
        assert_eq!(env.lookup("missing"), None);
    }

    #[test]
    fn render_replaces_known_names_only() {
        let env = env();
        assert_eq!(env.render("https://<<host>>/<<nope>>"), "https://selected.example/<<nope>>");
        assert_eq!(env.render("open <<host"), "open <<host");
    }

    #[test]
    fn resolve_drops_inactive_and_renders() {
        let mut req = RestRequest::default();
        req.url = "https://<<host>>".into();
        req.params = vec![
            RestParam::new("who", "<<acct>>"),
            RestParam::new("skip", "x").inactive(),
        ];
        req.headers = vec![RestHeader::new("x-a", "1"), RestHeader::new("x-a", "2")];

        let eff = EffectiveRequest::resolve(&req, &env());
        assert_eq!(eff.effective_final_url, "https://selected.example");
        assert_eq!(
            eff.effective_final_params,
            vec![KeyValue {
                key: "who".into(),
                value: "g".into()
            }]
        );
        assert_eq!(eff.effective_final_headers[0].value, "2");
        assert_eq!(eff.effective_final_headers[1].key, "content-type");
        assert_eq!(eff.effective_final_headers[1].value, "application/json");
    }

    #[test]
    fn explicit_content_type_is_kept() {
        let mut req = RestRequest::default();
        req.headers = vec![RestHeader::new("Content-Type", "text/plain")];
        let eff = EffectiveRequest::from_request(&req);
        assert_eq!(eff.effective_final_headers.len(), 1);
    }

    #[test]
    fn multipart_body_keeps_active_text_fields() {
        let mut req = RestRequest::default();
        let mut off = FormDataEntry::text("b", "2");
        off.active = false;
        req.body = RestReqBody::Multipart {
            entries: vec![FormDataEntry::text("a", "<<acct>>"), off],
        };
        let eff = EffectiveRequest::resolve(&req, &env());
        assert_eq!(
            eff.effective_final_body,
            EffectiveBody::FormData {
                entries: vec![KeyValue {
                    key: "a".into(),
                    value: "g".into()
                }]
            }
        );
    }
}
