//! Request collections and contract ABI import

use crate::error::TypesError;
use crate::request::{CallKind, RestParam, RestRequest};
use serde::{Deserialize, Serialize};

/// Collection schema version
pub const COLLECTION_SCHEMA_VERSION: u32 = 1;

/// Name given to collections built from an ABI
pub const IMPORTED_COLLECTION_NAME: &str = "collection_name";

/// Folder tree of saved requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Schema version
    pub v: u32,
    /// Display name
    pub name: String,
    /// Nested folders
    pub folders: Vec<Collection>,
    /// Requests at this level
    pub requests: Vec<RestRequest>,
}

impl Collection {
    /// Empty collection
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            v: COLLECTION_SCHEMA_VERSION,
            name: name.into(),
            folders: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Request at a slash-separated folder path such as `0/2`
    ///
    /// An empty path addresses this collection's own requests.
    #[must_use]
    pub fn request_at(&self, folder_path: &str, index: usize) -> Option<&RestRequest> {
        let mut folder = self;
        for part in folder_path.split('/').filter(|p| !p.is_empty()) {
            folder = folder.folders.get(part.parse::<usize>().ok()?)?;
        }
        folder.requests.get(index)
    }

    /// Count of requests in this collection and every nested folder
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.len() + self.folders.iter().map(Collection::request_count).sum::<usize>()
    }
}

/// Input of an ABI method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInput {
    /// Argument name
    pub name: String,
    /// Declared type, used as the placeholder value
    #[serde(default)]
    pub param_type: String,
}

/// Method entry of a contract ABI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiMethod {
    /// Method name
    pub name: String,
    /// Inputs in declaration order
    #[serde(default)]
    pub inputs: Vec<AbiInput>,
    /// `read` for view methods; anything else is a write
    #[serde(default)]
    pub state_mutability: String,
}

impl AbiMethod {
    /// Request template calling this method
    #[must_use]
    pub fn to_request(&self) -> RestRequest {
        let mut request = RestRequest {
            name: self.name.clone(),
            endpoint: self.name.clone(),
            call_kind: if self.state_mutability == "read" {
                CallKind::View
            } else {
                CallKind::NonPayable
            },
            params: self
                .inputs
                .iter()
                .map(|i| RestParam::new(i.name.clone(), i.param_type.clone()))
                .collect(),
            ..RestRequest::default()
        };
        request.sync_envelope();
        request
    }
}

/// Build a collection from a contract ABI document
///
/// The document is a JSON array of methods.
///
/// # Errors
/// `TypesError::InvalidAbi` when the text is not an array of methods
pub fn import_contract_abi(text: &str) -> Result<Collection, TypesError> {
    let methods: Vec<AbiMethod> =
        serde_json::from_str(text).map_err(|e| TypesError::InvalidAbi(e.to_string()))?;
    tracing::debug!(methods = methods.len(), "Importing contract ABI");

    let mut collection = Collection::new(IMPORTED_COLLECTION_NAME);
    collection.requests = methods.iter().map(AbiMethod::to_request).collect();
    Ok(collection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{Finality, RequestType};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    const ABI: &str = r#"[
        {"name":"get_posts","inputs":[{"name":"from","param_type":"u64"}],"state_mutability":"read"},
        {"name":"add_post","inputs":[{"name":"text","param_type":"String"}],"state_mutability":"write"}
    ]"#;

    #[test]
    fn read_methods_become_view_calls() {
        let collection = import_contract_abi(ABI).unwrap();
        assert_eq!(collection.v, 1);
        assert_eq!(collection.name, "collection_name");
        assert!(collection.folders.is_empty());
        assert_eq!(collection.requests.len(), 2);

        let view = &collection.requests[0];
        assert_eq!(view.call_kind, CallKind::View);
        assert_eq!(view.name, "get_posts");
        let env = view.envelope().unwrap();
        assert_eq!(env.params.request_type, RequestType::CallFunction);
        assert_eq!(env.params.method_name, "get_posts");
        assert_eq!(env.params.finality, Some(Finality::Optimistic));
        assert_eq!(
            env.decoded_args().unwrap().get("from"),
            Some(&Value::from("u64"))
        );
    }

    #[test]
    fn other_methods_become_writes() {
        let collection = import_contract_abi(ABI).unwrap();
        let write = &collection.requests[1];
        assert_eq!(write.call_kind, CallKind::NonPayable);
        assert_eq!(
            write.envelope().unwrap().params.request_type,
            RequestType::WriteFunction
        );
        assert!(write.params[0].active);
        assert_eq!(write.params[0].value, "String");
    }

    #[test]
    fn rejects_non_array() {
        assert!(matches!(
            import_contract_abi(r#"{"name":"x"}"#),
            Err(TypesError::InvalidAbi(_))
        ));
    }

    #[test]
    fn request_at_walks_folders() {
        let mut root = Collection::new("root");
        let mut folder = Collection::new("f");
        folder.requests.push(RestRequest::default());
        root.folders.push(Collection::new("empty"));
        root.folders.push(folder);

        assert!(root.request_at("1", 0).is_some());
        assert!(root.request_at("0", 0).is_none());
        assert!(root.request_at("x", 0).is_none());
        assert_eq!(root.request_count(), 1);
    }
}
