//! layertrace CLI - Tool for inspecting compositor layer trace captures.

use std::env;
use std::fs::File;
use std::ops::Range;
use std::path::Path;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use tracing_subscriber::EnvFilter;

use layertrace::hierarchy::HierarchyConfig;
use layertrace::prelude::*;
use layertrace::surface_flinger::capture::{CaptureBuilder, LayerBuilder};

/// Log filter for each verbosity flag.
const LOG_QUIET: &str = "error";
const LOG_INFO: &str = "warn,layertrace=info";
const LOG_DEBUG: &str = "layertrace=debug";
const LOG_TRACE: &str = "layertrace=trace";

/// First elapsed timestamp of synthesized captures.
const SYNTH_START_NS: i64 = 850_746_266_486;
/// One frame at 60Hz.
const SYNTH_FRAME_NS: i64 = 16_666_667;
const SYNTH_OFFSET_NS: u64 = 1_700_000_000_000_000_000;

fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut log_filter = LOG_INFO;
    let mut config = ParserConfig::default();
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => log_filter = LOG_DEBUG,
            "-vv" | "--trace" => log_filter = LOG_TRACE,
            "-q" | "--quiet" => log_filter = LOG_QUIET,
            "--strict-orphans" => config.hierarchy = HierarchyConfig { tolerate_orphans: false },
            _ => filtered_args.push(arg),
        }
    }
    init_logging(log_filter);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let json = filtered_args.iter().any(|&s| s == "--json" || s == "-j");
    let lazy = filtered_args.iter().any(|&s| s == "--lazy");
    let positional: Vec<&str> = filtered_args
        .iter()
        .copied()
        .filter(|s| !matches!(*s, "--json" | "-j" | "--lazy"))
        .collect();
    if positional.is_empty() {
        print_help();
        return;
    }

    let result = match positional[0] {
        "info" | "i" => match positional.get(1) {
            Some(file) => cmd_info(file, config),
            None => usage("layertrace info <file>"),
        },
        "tree" | "t" => match positional.get(1) {
            Some(file) => cmd_tree(file, positional.get(2).copied(), config),
            None => usage("layertrace tree <file> [index | @elapsed_ns]"),
        },
        "props" | "p" => match (positional.get(1), positional.get(2), positional.get(3)) {
            (Some(file), Some(index), Some(node)) => cmd_props(file, index, node, lazy, json, config),
            _ => usage("layertrace props <file> <index | @elapsed_ns> <node> [--lazy] [--json]"),
        },
        "query" | "q" => match (positional.get(1), positional.get(2)) {
            (Some(file), Some(kind)) => cmd_query(file, kind, &positional[3..], json, config),
            _ => usage("layertrace query <file> <vsync | layers | windows | scalar FIELD> [start..end] [--json]"),
        },
        "synth" | "s" => match positional.get(1) {
            Some(out) => cmd_synth(out, positional.get(2).copied()),
            None => usage("layertrace synth <out> [entries]"),
        },

        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }

        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other, config)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn usage(text: &str) -> Result<()> {
    eprintln!("Error: missing arguments");
    eprintln!("Usage: {}", text);
    std::process::exit(1);
}

fn print_help() {
    println!("layertrace - compositor layer trace inspector");
    println!();
    println!("USAGE:");
    println!("    layertrace [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info  <file>                       Show entry count, timestamps and layer counts");
    println!("    t, tree  <file> [entry]               Show the layer hierarchy of one entry");
    println!("    p, props <file> <entry> <node>        Show properties of one node");
    println!("    q, query <file> <kind> [start..end]   Run a custom query (vsync, layers, windows, scalar FIELD)");
    println!("    s, synth <out> [entries]              Write a synthesized capture");
    println!("    h, help                               Show this help");
    println!();
    println!("    <entry> is an index, or @<elapsed_ns> for the last entry at or before a time.");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose        Debug logging");
    println!("    -vv, --trace         Trace logging");
    println!("    -q, --quiet          Errors only");
    println!("    -j, --json           JSON output (props, query)");
    println!("    --lazy               Show lazy properties (props)");
    println!("    --strict-orphans     Fail entries with unknown parents or parent cycles");
    println!();
    println!("    RUST_LOG overrides the verbosity flags.");
    println!();
    println!(
        "layertrace {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("LAYERTRACE_BUILD_DATE"),
        env!("LAYERTRACE_BUILD_TIME")
    );
}

fn open(path: &str, config: ParserConfig) -> Result<Trace<SurfaceFlingerParser>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path))?;
    // Safety: the map is read-only and dropped before this function returns
    let map = unsafe { Mmap::map(&file) }.with_context(|| format!("cannot map {}", path))?;
    let trace = Trace::load(SurfaceFlingerParser::new(config), &map)
        .with_context(|| format!("cannot decode {}", path))?;
    Ok(trace)
}

/// Entry index from `N` or `@elapsed_ns`.
fn resolve_entry(trace: &Trace<SurfaceFlingerParser>, spec: &str) -> Result<usize> {
    if let Some(ns) = spec.strip_prefix('@') {
        let ns: i64 = ns.parse().with_context(|| format!("bad timestamp '{}'", ns))?;
        match trace.index_at(&Timestamp::elapsed(ns))? {
            Some(index) => return Ok(index),
            None => bail!("no entry at or before {}", Timestamp::elapsed(ns)),
        }
    }
    spec.parse().with_context(|| format!("bad entry index '{}'", spec))
}

fn parse_range(spec: Option<&&str>, len: usize) -> Result<Range<usize>> {
    let Some(spec) = spec else {
        return Ok(0..len);
    };
    let (start, end) = spec
        .split_once("..")
        .with_context(|| format!("bad range '{}', expected start..end", spec))?;
    let start = if start.is_empty() { 0 } else { start.parse()? };
    let end = if end.is_empty() { len } else { end.parse()? };
    Ok(start..end)
}

fn cmd_info(path: &str, config: ParserConfig) -> Result<()> {
    let trace = open(path, config)?;
    let entries = trace.decoded_entries();

    println!("File:     {}", path);
    println!("Type:     {:?}", trace.trace_type());
    println!("Entries:  {}", trace.len());
    println!("Dumps:    {}", entries.iter().filter(|e| e.is_dump()).count());
    match trace.real_to_elapsed_offset() {
        Some(offset) => println!("Offset:   {} ns (real - elapsed)", offset),
        None => println!("Offset:   none (real timestamps unavailable)"),
    }

    for kind in [TimestampType::Elapsed, TimestampType::Real] {
        if let Some(ts) = trace.timestamps(kind).filter(|ts| !ts.is_empty()) {
            println!("{:<9} {} .. {}", format!("{:?}:", kind), ts[0], ts[ts.len() - 1]);
        }
    }

    let layers: Vec<usize> = entries.iter().map(|e| e.layers().count()).collect();
    if let (Some(min), Some(max)) = (layers.iter().min(), layers.iter().max()) {
        println!("Layers:   {} .. {} per entry", min, max);
    }
    Ok(())
}

fn cmd_tree(path: &str, entry: Option<&str>, config: ParserConfig) -> Result<()> {
    let trace = open(path, config)?;
    let index = match entry {
        Some(spec) => resolve_entry(&trace, spec)?,
        None => 0,
    };
    let tree = trace.entry(index)?;

    for id in tree.preorder() {
        let node = tree.node(id);
        let indent = "  ".repeat(tree.depth(id));
        let visible = node
            .eager()
            .and_then(|e| e.child_bool("isVisible"))
            .map_or("", |v| if v { "" } else { " (hidden)" });
        let relative = node
            .relative_parent()
            .map(|r| format!(" [relative to {}]", tree.node(r).id()))
            .unwrap_or_default();
        println!("{}{}{}{}", indent, node.id(), visible, relative);
    }
    Ok(())
}

fn print_properties(tree: &PropertyTree, depth: usize) {
    let indent = "  ".repeat(depth);
    if tree.children().is_empty() || tree.formatter().is_some() {
        println!("{}{}: {}", indent, tree.name(), tree.formatted_value());
        return;
    }
    println!("{}{}:", indent, tree.name());
    for child in tree.children() {
        print_properties(child, depth + 1);
    }
}

fn cmd_props(path: &str, entry: &str, node: &str, lazy: bool, json: bool, config: ParserConfig) -> Result<()> {
    let trace = open(path, config)?;
    let index = resolve_entry(&trace, entry)?;
    let tree = trace.entry(index)?;
    let id = tree
        .find(node)
        .with_context(|| format!("no node '{}' in entry {}", node, index))?;

    let node = tree.node(id);
    let properties = if lazy { node.lazy_properties()? } else { node.eager_properties()? };

    if json {
        println!("{}", serde_json::to_string_pretty(&properties.to_json())?);
        return Ok(());
    }
    for child in properties.children() {
        print_properties(child, 0);
    }
    for rect in node.rects() {
        println!(
            "rect: {:?} stack={} depth={} visible={} opacity={}",
            rect.rect, rect.group_id, rect.depth, rect.is_visible, rect.opacity
        );
    }
    Ok(())
}

fn cmd_query(path: &str, kind: &str, rest: &[&str], json: bool, config: ParserConfig) -> Result<()> {
    let trace = open(path, config)?;
    let (query, range_arg) = match kind {
        "vsync" => (CustomQueryType::VsyncId, rest.first()),
        "layers" => (CustomQueryType::LayersIdAndName, rest.first()),
        "windows" => (CustomQueryType::WindowTokensAndTitles, rest.first()),
        "scalar" => match rest.first() {
            Some(field) => (CustomQueryType::EntryScalar { field: field.to_string() }, rest.get(1)),
            None => bail!("scalar query needs a field name"),
        },
        other => bail!("unknown query kind '{}'", other),
    };
    let range = parse_range(range_arg, trace.len())?;
    let result = trace.custom_query(&query, range)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
        return Ok(());
    }
    match &result {
        CustomQueryResult::VsyncIds(v) | CustomQueryResult::Scalars(v) => {
            for value in v {
                println!("{}", value);
            }
        }
        CustomQueryResult::LayerIdsAndNames(v) => {
            for layer in v {
                println!("{:>6}  {}", layer.id, layer.name);
            }
        }
    }
    Ok(())
}

/// One frame of the synthesized scene: a display root, a wallpaper, an
/// app window that slides right, a status bar z-ordered relative to the
/// app, and a hidden dim layer.
fn synth_layers(frame: usize) -> Vec<layertrace::wire::Message> {
    let x = (frame % 10) as f32 * 10.0;
    vec![
        LayerBuilder::new(1, "Display 0#0").z(0).bounds(Rect::from_xywh(0.0, 0.0, 1080.0, 2400.0)).opaque(false).build(),
        LayerBuilder::new(2, "Wallpaper#2").parent(1).z(-1).bounds(Rect::from_xywh(0.0, 0.0, 1080.0, 2400.0)).build(),
        LayerBuilder::new(3, "com.example.app#3").parent(1).z(1).bounds(Rect::from_xywh(x, 0.0, 1080.0, 2400.0)).build(),
        LayerBuilder::new(4, "StatusBar#4")
            .parent(1)
            .z(2)
            .relative_of(3)
            .bounds(Rect::from_xywh(0.0, 0.0, 1080.0, 120.0))
            .opaque(false)
            .color(0.0, 0.0, 0.0, 0.5)
            .build(),
        LayerBuilder::new(5, "Dim#5").parent(3).z(5).flags(0x01).build(),
    ]
}

fn cmd_synth(out: &str, entries: Option<&str>) -> Result<()> {
    let count: usize = match entries {
        Some(n) => n.parse().with_context(|| format!("bad entry count '{}'", n))?,
        None => 10,
    };
    let mut builder = CaptureBuilder::new().real_to_elapsed_offset(SYNTH_OFFSET_NS);
    for frame in 0..count {
        let elapsed = SYNTH_START_NS + frame as i64 * SYNTH_FRAME_NS;
        builder = builder.entry(elapsed, frame as i64 + 1, synth_layers(frame));
    }
    let bytes = builder.build()?;
    std::fs::write(out, &bytes).with_context(|| format!("cannot write {}", out))?;
    tracing::info!(entries = count, bytes = bytes.len(), path = out, "wrote capture");
    Ok(())
}
