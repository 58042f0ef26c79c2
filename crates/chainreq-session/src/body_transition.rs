//! Body content-type transitions
//!
//! Switching content type keeps what can be carried over and discards the
//! rest:
//!
//! | from | to | result |
//! |---|---|---|
//! | any | none | no body |
//! | raw | raw | same text, new type |
//! | url-encoded | multipart | `key: value` lines parsed into entries |
//! | multipart | url-encoded | text entries rendered as `key: value` lines |
//! | multipart | multipart | unchanged |
//! | anything else | | empty body of the new type |

use chainreq_types::{body, ContentType, RestReqBody};

/// Body after switching to `target`
///
/// Applying the same target twice gives the same body as applying it once.
#[must_use]
pub fn apply_body_transition(current: &RestReqBody, target: Option<ContentType>) -> RestReqBody {
    let Some(target) = target else {
        return RestReqBody::None;
    };

    if target.is_multipart() {
        return match current {
            RestReqBody::Multipart { .. } => current.clone(),
            RestReqBody::Raw {
                content_type: ContentType::FormUrlEncoded,
                body,
            } => RestReqBody::Multipart {
                entries: body::parse_raw_key_value(body),
            },
            _ => RestReqBody::Multipart {
                entries: Vec::new(),
            },
        };
    }

    match current {
        RestReqBody::Raw { body, .. } => RestReqBody::raw(target, body.clone()),
        RestReqBody::Multipart { entries } if target == ContentType::FormUrlEncoded => {
            RestReqBody::raw(target, body::raw_key_value_to_string(entries))
        }
        _ => RestReqBody::raw(target, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainreq_types::FormDataEntry;
    use pretty_assertions::assert_eq;

    #[test]
    fn none_drops_body() {
        let body = RestReqBody::raw(ContentType::ApplicationJson, "{}");
        assert_eq!(apply_body_transition(&body, None), RestReqBody::None);
    }

    #[test]
    fn raw_to_raw_keeps_text() {
        let body = RestReqBody::raw(ContentType::ApplicationJson, "{\"a\":1}");
        assert_eq!(
            apply_body_transition(&body, Some(ContentType::TextPlain)),
            RestReqBody::raw(ContentType::TextPlain, "{\"a\":1}")
        );
    }

    #[test]
    fn url_encoded_to_multipart_parses_lines() {
        let body = RestReqBody::raw(ContentType::FormUrlEncoded, "a: 1\n#b: 2");
        let RestReqBody::Multipart { entries } =
            apply_body_transition(&body, Some(ContentType::MultipartFormData))
        else {
            panic!("expected multipart");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], FormDataEntry::text("a", "1"));
        assert!(!entries[1].active);
    }

    #[test]
    fn multipart_to_url_encoded_renders_lines() {
        let body = RestReqBody::Multipart {
            entries: vec![FormDataEntry::text("a", "1")],
        };
        assert_eq!(
            apply_body_transition(&body, Some(ContentType::FormUrlEncoded)),
            RestReqBody::raw(ContentType::FormUrlEncoded, "a: 1")
        );
    }

    #[test]
    fn multipart_to_json_starts_empty() {
        let body = RestReqBody::Multipart {
            entries: vec![FormDataEntry::text("a", "1")],
        };
        assert_eq!(
            apply_body_transition(&body, Some(ContentType::ApplicationJson)),
            RestReqBody::raw(ContentType::ApplicationJson, "")
        );
    }
}
