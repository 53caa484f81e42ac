//! Custom queries over decoded entries.

mod common;

use common::*;
use layertrace::prelude::*;
use layertrace::query::LayerIdAndName;
use layertrace::surface_flinger::capture::CaptureBuilder;

#[test]
fn test_vsync_ids_without_processing() {
    let trace = load(&fifty_entries().build().unwrap());
    let result = trace.custom_query(&CustomQueryType::VsyncId, 5..8).unwrap();
    assert_eq!(result, CustomQueryResult::VsyncIds(vec![5, 6, 7]));

    // Queries never build trees
    assert_eq!(trace.cached_entries(), 0);
}

#[test]
fn test_layer_ids_and_names() {
    let trace = load(&fifty_entries().build().unwrap());
    let result = trace.custom_query(&CustomQueryType::LayersIdAndName, 0..1).unwrap();
    let expected: Vec<LayerIdAndName> = [(1, "Root"), (2, "Left"), (3, "Right")]
        .into_iter()
        .map(|(id, name)| LayerIdAndName { id, name: name.to_string() })
        .collect();
    assert_eq!(result, CustomQueryResult::LayerIdsAndNames(expected));

    let all = trace.custom_query(&CustomQueryType::LayersIdAndName, 0..50).unwrap();
    assert_eq!(all.len(), 150);
}

#[test]
fn test_entry_scalar() {
    let bytes = CaptureBuilder::new()
        .raw_entry(entry_with(FIRST_ELAPSED_NS, 1, &[("missedEntries", 3)]))
        .raw_entry(entry_with(FIRST_ELAPSED_NS + FRAME_NS, 2, &[]))
        .build()
        .unwrap();
    let trace = load(&bytes);

    let query = CustomQueryType::EntryScalar { field: "missedEntries".into() };
    assert_eq!(trace.custom_query(&query, 0..2).unwrap(), CustomQueryResult::Scalars(vec![3, 0]));

    let query = CustomQueryType::EntryScalar { field: "excludesCompositionState".into() };
    assert_eq!(trace.custom_query(&query, 0..2).unwrap(), CustomQueryResult::Scalars(vec![0, 0]));

    let query = CustomQueryType::EntryScalar { field: "notAField".into() };
    assert!(matches!(trace.custom_query(&query, 0..2), Err(Error::SchemaFieldMissing { .. })));
    assert_eq!(trace.cached_entries(), 0);
}

#[test]
fn test_unsupported_query() {
    let trace = load(&fifty_entries().build().unwrap());
    assert_eq!(
        trace.custom_query(&CustomQueryType::WindowTokensAndTitles, 0..1).unwrap_err(),
        Error::UnsupportedQuery(CustomQueryType::WindowTokensAndTitles)
    );
}

#[test]
fn test_invalid_range() {
    let trace = load(&fifty_entries().build().unwrap());
    assert_eq!(
        trace.custom_query(&CustomQueryType::VsyncId, 40..60).unwrap_err(),
        Error::InvalidRange { start: 40, end: 60, count: 50 }
    );
    #[allow(clippy::reversed_empty_ranges)]
    let reversed = 8..5;
    assert!(matches!(
        trace.custom_query(&CustomQueryType::VsyncId, reversed),
        Err(Error::InvalidRange { .. })
    ));

    // An empty range is fine
    assert!(trace.custom_query(&CustomQueryType::VsyncId, 5..5).unwrap().is_empty());
}
