use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, Log, Metadata, Record};
use pokebridge_core::core_api::{CoreError, Engine, Location, Session, StorageSlot};
use pokebridge_core::export;
use pokebridge_core::gen3::{self, SlotTieBreak, ValidationReport};
use pokebridge_core::progress::{self, ProgressEvent, ProgressSnapshot};
use pokebridge_core::{SaveHandle, StorageBridge, Title};
use pokebridge_render::{
    JsonStyle, TextRenderOptions, render_events_json, render_events_text, render_json,
    render_text_with_options,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum TieBreakArg {
    A,
    B,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Slot to trust when both slots carry the same save counter.
    #[arg(long = "tie-break", value_enum, default_value = "a", global = true)]
    tie_break: TieBreakArg,
    /// Log decoding and transfer steps to stderr (repeat for more detail).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the trainer sheet and every stored creature of one save.
    Info {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long, value_name = "TITLE", value_parser = parse_title)]
        title: Option<Title>,
        #[arg(long)]
        json: bool,
        /// Include moves, IVs and EVs.
        #[arg(long)]
        details: bool,
    },
    /// Validate section signatures and checksums without decoding.
    Check {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List the creatures of several saves in export order.
    List {
        #[command(flatten)]
        saves: SaveArgs,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        details: bool,
    },
    /// Move one creature and write the affected saves back.
    Transfer {
        #[command(flatten)]
        saves: SaveArgs,
        #[arg(long, value_name = "TITLE:LOCATION", value_parser = parse_storage_slot)]
        from: StorageSlot,
        #[arg(long, value_name = "TITLE:LOCATION", value_parser = parse_storage_slot)]
        to: StorageSlot,
        /// Check the move without writing anything.
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[arg(long)]
        json: bool,
    },
    /// Exchange two occupied slots and write the affected saves back.
    Swap {
        #[command(flatten)]
        saves: SaveArgs,
        #[arg(value_name = "TITLE:LOCATION", value_parser = parse_storage_slot)]
        a: StorageSlot,
        #[arg(value_name = "TITLE:LOCATION", value_parser = parse_storage_slot)]
        b: StorageSlot,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Report progress unlocked since a previously stored snapshot.
    Progress {
        #[command(flatten)]
        saves: SaveArgs,
        /// Snapshot written by an earlier run; missing means no prior progress.
        #[arg(long, value_name = "PATH")]
        previous: Option<PathBuf>,
        /// Store the current snapshot for the next run.
        #[arg(long, value_name = "PATH")]
        write: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Args)]
struct SaveArgs {
    /// A save to open, as TITLE=PATH. Repeat for each title.
    #[arg(
        long = "save",
        value_name = "TITLE=PATH",
        value_parser = parse_save_arg,
        required = true
    )]
    saves: Vec<(Title, PathBuf)>,
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let engine = Engine::with_tie_break(match cli.tie_break {
        TieBreakArg::A => SlotTieBreak::PreferSlotA,
        TieBreakArg::B => SlotTieBreak::PreferSlotB,
    });

    let result = match cli.command {
        Command::Info {
            path,
            title,
            json,
            details,
        } => run_info(engine, &path, title, json, details),
        Command::Check { path, json } => run_check(engine, &path, json),
        Command::List {
            saves,
            json,
            details,
        } => run_list(engine, &saves, json, details),
        Command::Transfer {
            saves,
            from,
            to,
            dry_run,
            json,
        } => run_transfer(engine, &saves, from, to, dry_run, json),
        Command::Swap {
            saves,
            a,
            b,
            dry_run,
        } => run_swap(engine, &saves, a, b, dry_run),
        Command::Progress {
            saves,
            previous,
            write,
            json,
        } => run_progress(engine, &saves, previous.as_deref(), write.as_deref(), json),
    };

    if let Err(message) = result {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn run_info(
    engine: Engine,
    path: &Path,
    title: Option<Title>,
    json: bool,
    details: bool,
) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let session = engine
        .open_bytes(bytes, title)
        .map_err(|e| describe(path, &e))?;
    let exported = export::from_session(&session);

    if json {
        let mut value = render_json(&exported, JsonStyle::CanonicalV1);
        if let JsonValue::Object(map) = &mut value {
            map.insert("save".to_string(), save_json(&session));
        }
        return print_json(&value);
    }

    print!(
        "{}",
        render_text_with_options(&exported, TextRenderOptions { verbose: details })
    );
    let snapshot = session.snapshot();
    println!(
        "Slot {} (counter {}), {} layout",
        snapshot.current_slot, snapshot.save_counter, snapshot.variant
    );
    for issue in &session.capabilities().issues {
        println!("Warning: {issue:?}");
    }
    Ok(())
}

fn run_check(engine: Engine, path: &Path, json: bool) -> Result<(), String> {
    let bytes = fs::read(path).map_err(|e| format!("reading {}: {e}", path.display()))?;
    let report = gen3::validate(&bytes, engine.tie_break());

    if json {
        let value = serde_json::to_value(&report).map_err(|e| e.to_string())?;
        print_json(&value)?;
    } else {
        print_report(&report);
    }

    if report.is_valid() {
        Ok(())
    } else if report.is_blank() {
        Err(format!("{} is blank or uninitialized", path.display()))
    } else {
        Err(format!("{} failed validation", path.display()))
    }
}

fn print_report(report: &ValidationReport) {
    println!("File size: {} bytes", report.file_len);
    for slot in &report.slots {
        if !slot.present {
            println!("Slot {}: blank", slot.slot);
            continue;
        }
        let bad: Vec<String> = slot
            .sections
            .iter()
            .filter(|check| !check.is_valid())
            .map(|check| {
                format!(
                    "section {} (stored {:04X}, computed {:04X})",
                    check.id, check.stored, check.computed
                )
            })
            .collect();
        let counter = slot.counter.unwrap_or_default();
        if bad.is_empty() {
            println!("Slot {}: counter {counter}, checksums OK", slot.slot);
        } else {
            println!(
                "Slot {}: counter {counter}, bad {}",
                slot.slot,
                bad.join(", ")
            );
        }
    }
    match (report.current, report.variant) {
        (Some(current), Some(variant)) => println!("Current: slot {current}, {variant} layout"),
        (Some(current), None) => println!("Current: slot {current}"),
        _ => println!("Current: none"),
    }
}

fn run_list(engine: Engine, saves: &SaveArgs, json: bool, details: bool) -> Result<(), String> {
    let bridge = open_all(engine, saves)?;
    let exported = export::collect(&bridge);
    if json {
        return print_json(&render_json(&exported, JsonStyle::CanonicalV1));
    }
    print!(
        "{}",
        render_text_with_options(&exported, TextRenderOptions { verbose: details })
    );
    Ok(())
}

fn run_transfer(
    engine: Engine,
    saves: &SaveArgs,
    from: StorageSlot,
    to: StorageSlot,
    dry_run: bool,
    json: bool,
) -> Result<(), String> {
    let mut bridge = open_all(engine, saves)?;
    let outcome = bridge
        .transfer(from, to.title, to.location)
        .map_err(|e| e.to_string())?;
    if !dry_run {
        commit_titles(&mut bridge, &[to.title, from.title])?;
    }

    if json {
        let value = serde_json::to_value(&outcome).map_err(|e| e.to_string())?;
        return print_json(&value);
    }
    let verb = if dry_run { "Would move" } else { "Moved" };
    println!(
        "{verb} {} (PID {:08X}) from {} to {}",
        pokebridge_core::species::display_name(outcome.species),
        outcome.pid,
        outcome.from,
        outcome.to
    );
    Ok(())
}

fn run_swap(
    engine: Engine,
    saves: &SaveArgs,
    a: StorageSlot,
    b: StorageSlot,
    dry_run: bool,
) -> Result<(), String> {
    let mut bridge = open_all(engine, saves)?;
    bridge.swap(a, b).map_err(|e| e.to_string())?;
    if !dry_run {
        commit_titles(&mut bridge, &[a.title, b.title])?;
    }
    let verb = if dry_run { "Would swap" } else { "Swapped" };
    println!("{verb} {a} with {b}");
    Ok(())
}

fn run_progress(
    engine: Engine,
    saves: &SaveArgs,
    previous: Option<&Path>,
    write: Option<&Path>,
    json: bool,
) -> Result<(), String> {
    let bridge = open_all(engine, saves)?;
    let current = ProgressSnapshot::capture(&bridge);
    let baseline = match previous {
        Some(path) if path.exists() => {
            let raw = fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            serde_json::from_str(&raw)
                .map_err(|e| format!("parsing snapshot {}: {e}", path.display()))?
        }
        _ => ProgressSnapshot::default(),
    };

    let events: Vec<ProgressEvent> = progress::evaluate(&baseline, &current)
        .into_iter()
        .collect();
    if json {
        print_json(&render_events_json(&events))?;
    } else if events.is_empty() {
        println!("No new progress.");
    } else {
        print!("{}", render_events_text(&events));
    }

    if let Some(path) = write {
        let rendered = serde_json::to_string_pretty(&current).map_err(|e| e.to_string())?;
        pokebridge_core::bridge::write_atomic(path, rendered.as_bytes())
            .map_err(|e| format!("writing {}: {e}", path.display()))?;
    }
    Ok(())
}

fn open_all(engine: Engine, saves: &SaveArgs) -> Result<StorageBridge, String> {
    let mut bridge = StorageBridge::new(engine);
    for (title, path) in &saves.saves {
        bridge
            .open(path, *title)
            .map_err(|e| describe(path, &e))?;
    }
    Ok(bridge)
}

/// Writes the first title first; callers list the save gaining a record
/// ahead of the one losing it.
fn commit_titles(bridge: &mut StorageBridge, titles: &[Title]) -> Result<(), String> {
    let handles: Vec<SaveHandle> = titles
        .iter()
        .filter_map(|&title| bridge.handle(title))
        .collect();
    bridge
        .commit_all(&handles)
        .map_err(|e| format!("committing {}: {e}", describe_titles(bridge, titles)))?;
    Ok(())
}

fn describe_titles(bridge: &StorageBridge, titles: &[Title]) -> String {
    let mut names: Vec<String> = Vec::new();
    for &title in titles {
        let name = bridge
            .path(title)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| title.to_string());
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names.join(" and ")
}

fn save_json(session: &Session) -> JsonValue {
    let snapshot = session.snapshot();
    let mut out = JsonMap::new();
    out.insert(
        "variant".to_string(),
        JsonValue::from(snapshot.variant.as_str()),
    );
    out.insert(
        "current_slot".to_string(),
        JsonValue::from(snapshot.current_slot.to_string()),
    );
    out.insert(
        "save_counter".to_string(),
        JsonValue::from(snapshot.save_counter),
    );
    out.insert(
        "issues".to_string(),
        JsonValue::Array(
            session
                .capabilities()
                .issues
                .iter()
                .map(|issue| JsonValue::from(format!("{issue:?}")))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

fn print_json(value: &JsonValue) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| format!("rendering JSON output: {e}"))?;
    println!("{rendered}");
    Ok(())
}

fn describe(path: &Path, error: &CoreError) -> String {
    format!("{}: {error}", path.display())
}

fn parse_title(value: &str) -> Result<Title, String> {
    value.parse()
}

/// `TITLE=PATH`, e.g. `emerald=saves/emerald.sav`.
fn parse_save_arg(value: &str) -> Result<(Title, PathBuf), String> {
    let (title, path) = value
        .split_once('=')
        .ok_or_else(|| format!("invalid save '{value}', expected TITLE=PATH"))?;
    if path.is_empty() {
        return Err(format!("missing path in '{value}'"));
    }
    Ok((title.parse()?, PathBuf::from(path)))
}

/// `TITLE:party:N` or `TITLE:box:B:S`.
fn parse_storage_slot(value: &str) -> Result<StorageSlot, String> {
    let (title, location) = value
        .split_once(':')
        .ok_or_else(|| format!("invalid slot '{value}', expected TITLE:LOCATION"))?;
    let location: Location = location.parse()?;
    Ok(StorageSlot::new(title.parse()?, location))
}
