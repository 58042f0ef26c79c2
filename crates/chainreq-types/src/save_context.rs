//! Where a session's request is persisted when saved

use serde::{Deserialize, Serialize};

/// Save location of the current request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "originLocation", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum SaveContext {
    /// Request in a personal collection
    UserCollection {
        /// Slash-separated folder indices, e.g. `0/2`
        folder_path: String,
        /// Index within the folder
        request_index: usize,
    },
    /// Request in a team collection
    TeamCollection {
        /// Team request id
        request_id: String,
        /// Owning team
        #[serde(default, skip_serializing_if = "Option::is_none")]
        team_id: Option<String>,
        /// Owning collection
        #[serde(default, skip_serializing_if = "Option::is_none")]
        collection_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        let ctx = SaveContext::UserCollection {
            folder_path: "0/1".into(),
            request_index: 3,
        };
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["originLocation"], "user-collection");
        assert_eq!(json["folderPath"], "0/1");
        assert_eq!(json["requestIndex"], 3);

        let back: SaveContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }
}
