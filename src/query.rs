//! Custom queries: cheap projections over decoded entries.
//!
//! Queries read decoded entries directly; they never build providers or
//! trees, so they stay cheap even over a whole capture.

/// Kind of custom query.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CustomQueryType {
    /// Vsync id of each entry.
    VsyncId,
    /// Id and name of every layer of every entry.
    LayersIdAndName,
    /// One integral entry-level field per entry; absent fields read as
    /// their schema default.
    EntryScalar { field: String },
    /// Window tokens and titles. Only window-manager traces answer it;
    /// layer traces reject it.
    WindowTokensAndTitles,
}

/// Id and name of one layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerIdAndName {
    pub id: i64,
    pub name: String,
}

/// Result of a custom query; the variant matches the query kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CustomQueryResult {
    VsyncIds(Vec<i64>),
    LayerIdsAndNames(Vec<LayerIdAndName>),
    Scalars(Vec<i64>),
}

impl CustomQueryResult {
    /// Number of result items.
    pub fn len(&self) -> usize {
        match self {
            Self::VsyncIds(v) | Self::Scalars(v) => v.len(),
            Self::LayerIdsAndNames(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON rendering for tooling output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::VsyncIds(v) | Self::Scalars(v) => serde_json::json!(v),
            Self::LayerIdsAndNames(v) => v
                .iter()
                .map(|l| serde_json::json!({ "id": l.id, "name": l.name }))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_len() {
        assert_eq!(CustomQueryResult::VsyncIds(vec![1, 2]).len(), 2);
        assert!(CustomQueryResult::LayerIdsAndNames(Vec::new()).is_empty());
    }

    #[test]
    fn test_result_json() {
        let result = CustomQueryResult::LayerIdsAndNames(vec![LayerIdAndName { id: 3, name: "Dim".into() }]);
        assert_eq!(result.to_json(), serde_json::json!([{ "id": 3, "name": "Dim" }]));
        assert_eq!(CustomQueryResult::Scalars(vec![5]).to_json(), serde_json::json!([5]));
    }
}
