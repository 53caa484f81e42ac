//! Parser for compositor layer traces.

use std::sync::Arc;

use crate::core::{DecodedTrace, Timestamp, TimestampType, TraceParser, TraceType, DEFAULT_CACHE_CAPACITY};
use crate::hierarchy::{
    ComputationList, DuplicateCounter, HierarchyConfig, HierarchyTree, HierarchyTreeBuilder, NodeIdentity,
    NodeLinks, NO_PARENT,
};
use crate::properties::{
    LazyPropertiesStrategy, PropertiesProvider, PropertiesProviderBuilder, PropertySource, PropertyTree,
};
use crate::query::{CustomQueryResult, CustomQueryType, LayerIdAndName};
use crate::surface_flinger::computations::{RectsComputation, VisibilityPropertiesComputation, ZOrderPathsComputation};
use crate::surface_flinger::operations::*;
use crate::surface_flinger::schema::{ENTRY, MAGIC_NUMBER, TRACE_FILE};
use crate::util::{Error, Result};
use crate::wire::{self, Message, Value};

/// Id string of the entry-level root node.
pub const ROOT_ID: &str = "LayerTraceEntry root";

static COMPUTATIONS: ComputationList = &[
    &ZOrderPathsComputation,
    &VisibilityPropertiesComputation,
    &RectsComputation,
];

/// Parser settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParserConfig {
    pub hierarchy: HierarchyConfig,
    /// Number of processed trees kept cached per trace.
    pub cache_capacity: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            hierarchy: HierarchyConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// One decoded snapshot (`LayersTraceProto`).
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedEntry {
    message: Arc<Message>,
}

impl DecodedEntry {
    pub fn new(message: Message) -> Self {
        Self { message: Arc::new(message) }
    }

    /// The raw entry record.
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Layer records in capture order.
    pub fn layers(&self) -> impl Iterator<Item = &Message> {
        layer_list(&self.message).iter().filter_map(Value::as_message)
    }

    /// Present only for trace entries; dumps have none.
    pub fn elapsed_realtime_nanos(&self) -> Option<i64> {
        self.message.get_i64("elapsedRealtimeNanos")
    }

    pub fn is_dump(&self) -> bool {
        !self.message.contains("elapsedRealtimeNanos")
    }

    pub fn vsync_id(&self) -> i64 {
        self.message.get_i64("vsyncId").unwrap_or(0)
    }

    pub fn excludes_composition_state(&self) -> bool {
        self.message.get_bool("excludesCompositionState").unwrap_or(false)
    }

    pub fn displays(&self) -> impl Iterator<Item = &Message> {
        self.message.get_list("displays").iter().filter_map(Value::as_message)
    }

    pub fn where_(&self) -> &str {
        self.message.get_str("where").unwrap_or("")
    }
}

fn layer_list(entry: &Message) -> &[Value] {
    entry.get_message("layers").map_or(&[], |l| l.get_list("layers"))
}

fn is_eager(name: &str) -> bool {
    EAGER_PROPERTIES.iter().any(|n| *n == name)
}

fn is_denied(name: &str) -> bool {
    DENYLIST_PROPERTIES.iter().any(|n| *n == name)
}

/// Parent and relative-z links of layers.
struct LayerLinks;

impl NodeLinks for LayerLinks {
    fn parent_id(&self, eager: &PropertyTree) -> Option<i64> {
        eager
            .child("parent")
            .filter(|p| p.source() == PropertySource::Proto)
            .and_then(|p| p.value().as_i64())
    }

    fn relative_parent_id(&self, eager: &PropertyTree) -> Option<i64> {
        if eager.child_bool("isRelativeOf") != Some(true) {
            return None;
        }
        eager.child_i64("zOrderRelativeOf").filter(|&id| id != NO_PARENT)
    }
}

/// Layer trace parser: decodes `LYRTRACE` captures into per-entry
/// hierarchy trees.
#[derive(Clone, Debug, Default)]
pub struct SurfaceFlingerParser {
    config: ParserConfig,
}

impl SurfaceFlingerParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Build the annotated hierarchy tree of one entry.
    pub fn make_hierarchy_tree(&self, entry: &DecodedEntry) -> Result<HierarchyTree> {
        let layer_eager_ops = if entry.excludes_composition_state() {
            LAYER_EAGER_OPS_EXCLUDING_COMPOSITION
        } else {
            LAYER_EAGER_OPS
        };

        let mut counter = DuplicateCounter::new();
        let layers: Vec<(NodeIdentity, PropertiesProvider)> = layer_list(&entry.message)
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.as_message().map(|layer| (index, layer)))
            .map(|(index, layer)| {
                let id = layer.get_i64("id").unwrap_or(0);
                let name = layer.get_str("name").unwrap_or("");
                let identity = NodeIdentity::new(id, name, counter.next(id));
                let id_string = identity.to_string();

                let eager = PropertyTree::from_message(id_string.as_str(), layer, PropertySource::Proto, is_eager);
                let provider = PropertiesProviderBuilder::new()
                    .set_eager_properties(eager)
                    .set_lazy_properties_strategy(layer_lazy_strategy(&entry.message, index, id_string))
                    .set_common_operations(LAYER_COMMON_OPS)
                    .set_eager_operations(layer_eager_ops)
                    .set_lazy_operations(LAYER_LAZY_OPS)
                    .build();
                (identity, provider)
            })
            .collect();

        let root_eager = PropertyTree::from_message(ROOT_ID, &entry.message, PropertySource::Proto, |n| {
            ENTRY_EAGER_PROPERTIES.iter().any(|e| *e == n)
        });
        let root = PropertiesProviderBuilder::new()
            .set_eager_properties(root_eager)
            .set_lazy_properties_strategy(entry_lazy_strategy(&entry.message))
            .set_common_operations(ENTRY_COMMON_OPS)
            .set_eager_operations(ENTRY_EAGER_OPS)
            .set_lazy_operations(ENTRY_LAZY_OPS)
            .build();

        HierarchyTreeBuilder::new(self.config.hierarchy)
            .set_root(ROOT_ID, root)
            .set_children(layers)
            .set_computations(COMPUTATIONS)
            .build(&LayerLinks)
    }
}

/// Lazy layer properties: every field not materialized eagerly.
fn layer_lazy_strategy(entry: &Arc<Message>, index: usize, id_string: String) -> LazyPropertiesStrategy {
    let entry = Arc::clone(entry);
    Box::new(move || {
        let layer = layer_list(&entry)
            .get(index)
            .and_then(Value::as_message)
            .ok_or_else(|| Error::other(format!("layer {} missing from entry", index)))?;
        Ok(PropertyTree::from_message(id_string, layer, PropertySource::Proto, |n| {
            !is_eager(n) && !is_denied(n)
        }))
    })
}

fn entry_lazy_strategy(entry: &Arc<Message>) -> LazyPropertiesStrategy {
    let entry = Arc::clone(entry);
    Box::new(move || Ok(PropertyTree::from_message(ROOT_ID, &entry, PropertySource::Proto, |n| !is_denied(n))))
}

fn scalar(entry: &DecodedEntry, field: &str) -> Result<i64> {
    let schema = ENTRY
        .field(field)
        .ok_or_else(|| Error::missing_field(ENTRY.name, field))?;
    let value = match entry.message.get(field) {
        Some(value) => value.clone(),
        None => schema.default_value().ok_or_else(|| Error::TypeMismatch {
            expected: "integer".to_string(),
            actual: "message".to_string(),
        })?,
    };
    match value {
        Value::Bool(b) => Ok(i64::from(b)),
        other => other.as_i64().ok_or_else(|| Error::TypeMismatch {
            expected: "integer".to_string(),
            actual: other.type_name().to_string(),
        }),
    }
}

impl TraceParser for SurfaceFlingerParser {
    type Entry = DecodedEntry;
    type Processed = HierarchyTree;

    fn trace_type(&self) -> TraceType {
        TraceType::SurfaceFlinger
    }

    fn decode_trace(&self, buffer: &[u8]) -> Result<DecodedTrace<DecodedEntry>> {
        let mut file = wire::decode(&TRACE_FILE, buffer)?;

        if let Some(magic) = file.get_u64("magicNumber") {
            if magic != MAGIC_NUMBER {
                return Err(Error::decode(0, format!("unexpected magic number 0x{:016x}", magic)));
            }
        }

        let offset = file
            .get_u64("realToElapsedTimeOffsetNanos")
            .map(|v| v as i64)
            .filter(|&v| v != 0);

        let entries: Vec<DecodedEntry> = match file.remove("entry") {
            Some(Value::List(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Message(m) => Some(DecodedEntry::new(m)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };

        tracing::debug!(
            entries = entries.len(),
            dumps = entries.iter().filter(|e| e.is_dump()).count(),
            real_to_elapsed_offset = offset,
            "decoded layer trace"
        );
        Ok(DecodedTrace { entries, real_to_elapsed_offset: offset })
    }

    fn timestamp(&self, kind: TimestampType, entry: &DecodedEntry, offset: Option<i64>) -> Option<Timestamp> {
        match entry.elapsed_realtime_nanos() {
            // Dumps sit at time zero of either kind
            None if Timestamp::can_make(kind, offset) => Some(Timestamp::new(kind, 0)),
            None => None,
            Some(elapsed) => Timestamp::make(kind, elapsed, offset),
        }
    }

    fn process_entry(&self, index: usize, entry: &DecodedEntry) -> Result<HierarchyTree> {
        let _span = tracing::info_span!("make_hierarchy_tree", index).entered();
        self.make_hierarchy_tree(entry)
    }

    fn custom_query(&self, query: &CustomQueryType, entries: &[DecodedEntry]) -> Result<CustomQueryResult> {
        match query {
            CustomQueryType::VsyncId => Ok(CustomQueryResult::VsyncIds(
                entries.iter().map(DecodedEntry::vsync_id).collect(),
            )),
            CustomQueryType::LayersIdAndName => Ok(CustomQueryResult::LayerIdsAndNames(
                entries
                    .iter()
                    .flat_map(DecodedEntry::layers)
                    .map(|layer| LayerIdAndName {
                        id: layer.get_i64("id").unwrap_or(0),
                        name: layer.get_str("name").unwrap_or("").to_string(),
                    })
                    .collect(),
            )),
            CustomQueryType::EntryScalar { field } => Ok(CustomQueryResult::Scalars(
                entries.iter().map(|e| scalar(e, field)).collect::<Result<_>>()?,
            )),
            CustomQueryType::WindowTokensAndTitles => Err(Error::UnsupportedQuery(query.clone())),
        }
    }

    fn cache_capacity(&self) -> usize {
        self.config.cache_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(id: i32, parent: i32) -> Value {
        Value::Message(
            Message::new()
                .with("id", id)
                .with("name", format!("L{}", id))
                .with("parent", parent),
        )
    }

    fn entry(elapsed: Option<i64>, layers: Vec<Value>) -> DecodedEntry {
        let mut m = Message::new()
            .with("layers", Message::new().with("layers", layers))
            .with("vsyncId", 11i64);
        if let Some(e) = elapsed {
            m.set("elapsedRealtimeNanos", e);
        }
        DecodedEntry::new(m)
    }

    #[test]
    fn test_dump_timestamps() {
        let parser = SurfaceFlingerParser::default();
        let dump = entry(None, Vec::new());
        assert!(dump.is_dump());
        assert_eq!(parser.timestamp(TimestampType::Elapsed, &dump, None), Some(Timestamp::elapsed(0)));
        assert_eq!(parser.timestamp(TimestampType::Real, &dump, None), None);
        assert_eq!(parser.timestamp(TimestampType::Real, &dump, Some(5)), Some(Timestamp::real(0)));
    }

    #[test]
    fn test_trace_timestamps() {
        let parser = SurfaceFlingerParser::default();
        let e = entry(Some(100), Vec::new());
        assert_eq!(parser.timestamp(TimestampType::Elapsed, &e, Some(5)), Some(Timestamp::elapsed(100)));
        assert_eq!(parser.timestamp(TimestampType::Real, &e, Some(5)), Some(Timestamp::real(105)));
        assert_eq!(parser.timestamp(TimestampType::Real, &e, None), None);
    }

    #[test]
    fn test_bad_magic() {
        let file = Message::new().with("magicNumber", 0x1234u64);
        let bytes = wire::encode(&TRACE_FILE, &file).unwrap();
        let err = SurfaceFlingerParser::default().decode_trace(&bytes).unwrap_err();
        assert!(matches!(err, Error::Decode { offset: 0, .. }));
    }

    #[test]
    fn test_make_tree() {
        let parser = SurfaceFlingerParser::default();
        let e = entry(Some(1), vec![layer(1, -1), layer(2, 1), layer(3, 1)]);
        let tree = parser.make_hierarchy_tree(&e).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.node(tree.root()).id(), ROOT_ID);
        let one = tree.find("1 L1").unwrap();
        assert_eq!(tree.node(one).children().len(), 2);

        let lazy = tree.node(one).lazy_properties().unwrap();
        assert!(!lazy.has_child("id"));
        assert!(lazy.has_child("crop"));
        assert!(!lazy.has_child("relatives"));
    }

    #[test]
    fn test_scalar_query() {
        let parser = SurfaceFlingerParser::default();
        let entries = vec![entry(Some(1), Vec::new()), entry(None, Vec::new())];
        let query = CustomQueryType::EntryScalar { field: "missedEntries".into() };
        assert_eq!(parser.custom_query(&query, &entries).unwrap(), CustomQueryResult::Scalars(vec![0, 0]));

        let query = CustomQueryType::EntryScalar { field: "layers".into() };
        assert!(matches!(parser.custom_query(&query, &entries), Err(Error::TypeMismatch { .. })));

        let query = CustomQueryType::EntryScalar { field: "bogus".into() };
        assert!(matches!(parser.custom_query(&query, &entries), Err(Error::SchemaFieldMissing { .. })));
    }

    #[test]
    fn test_unsupported_query() {
        let parser = SurfaceFlingerParser::default();
        let err = parser.custom_query(&CustomQueryType::WindowTokensAndTitles, &[]).unwrap_err();
        assert_eq!(err, Error::UnsupportedQuery(CustomQueryType::WindowTokensAndTitles));
    }
}
