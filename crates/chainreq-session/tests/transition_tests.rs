//! Properties of session edits

use chainreq_session::{apply_body_transition, SessionAction, SessionStore};
use chainreq_types::{ContentType, FormDataEntry, RestParam, RestReqBody};
use proptest::prelude::*;
use serde_json::Value;

fn content_type() -> impl Strategy<Value = ContentType> {
    proptest::sample::select(ContentType::ALL.to_vec())
}

fn body() -> impl Strategy<Value = RestReqBody> {
    prop_oneof![
        Just(RestReqBody::None),
        (content_type(), "[a-z: \n]{0,24}")
            .prop_filter("raw bodies are not multipart", |(ct, _)| !ct.is_multipart())
            .prop_map(|(ct, text)| RestReqBody::raw(ct, text)),
        proptest::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..4).prop_map(|pairs| {
            RestReqBody::Multipart {
                entries: pairs
                    .into_iter()
                    .map(|(k, v)| FormDataEntry::text(k, v))
                    .collect(),
            }
        }),
    ]
}

#[derive(Debug, Clone)]
enum ParamEdit {
    Add(String, String, bool),
    Update(usize, String, String),
    Delete(usize),
    DeleteAll,
}

fn param_edit() -> impl Strategy<Value = ParamEdit> {
    prop_oneof![
        4 => ("[a-c]{0,1}", "[a-z0-9]{0,3}", any::<bool>())
            .prop_map(|(k, v, active)| ParamEdit::Add(k, v, active)),
        2 => (0usize..6, "[a-c]{1}", "[0-9]{1,2}")
            .prop_map(|(i, k, v)| ParamEdit::Update(i, k, v)),
        2 => (0usize..6).prop_map(ParamEdit::Delete),
        1 => Just(ParamEdit::DeleteAll),
    ]
}

fn to_action(edit: ParamEdit) -> SessionAction {
    match edit {
        ParamEdit::Add(key, value, active) => {
            let param = RestParam::new(key, value);
            SessionAction::AddParam(if active { param } else { param.inactive() })
        }
        ParamEdit::Update(index, key, value) => SessionAction::UpdateParam {
            index,
            param: RestParam::new(key, value),
        },
        ParamEdit::Delete(index) => SessionAction::DeleteParam(index),
        ParamEdit::DeleteAll => SessionAction::DeleteAllParams,
    }
}

proptest! {
    #[test]
    fn transition_is_idempotent(current in body(), target in proptest::option::of(content_type())) {
        let once = apply_body_transition(&current, target);
        let twice = apply_body_transition(&once, target);
        prop_assert_eq!(once.content_type(), target);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn raw_text_survives_raw_switches(text in "[ -~]{0,32}", from in content_type(), to in content_type()) {
        prop_assume!(!from.is_multipart() && !to.is_multipart());
        let switched = apply_body_transition(&RestReqBody::raw(from, text.clone()), Some(to));
        prop_assert_eq!(switched.raw_text(), Some(text.as_str()));
    }

    #[test]
    fn envelope_args_follow_active_params(edits in proptest::collection::vec(param_edit(), 0..12)) {
        let store = SessionStore::default();
        store.dispatch(SessionAction::SetEndpoint("get_posts".into()));
        for edit in edits {
            store.dispatch(to_action(edit));
        }

        let request = store.value().request;
        let expected: Vec<(String, Value)> = request
            .active_args()
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        let args: Vec<(String, Value)> = request
            .envelope()
            .unwrap()
            .decoded_args()
            .unwrap()
            .into_iter()
            .collect();
        prop_assert_eq!(args, expected);
    }
}
