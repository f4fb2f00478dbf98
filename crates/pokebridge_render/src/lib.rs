use std::fmt::Write as _;

use pokebridge_core::core_api::Location;
use pokebridge_core::export::{Export, ExportRecord, TrainerExport};
use pokebridge_core::gen3::save::PlayTime;
use pokebridge_core::progress::{ProgressEvent, ProgressFlag};
use serde_json::{Map as JsonMap, Value as JsonValue};

const SHEET_WIDTH: usize = 76;
const SLOT_COL_WIDTH: usize = 22;
const SPECIES_COL_WIDTH: usize = 16;
const NICKNAME_COL_WIDTH: usize = 11;
const LEVEL_COL_WIDTH: usize = 6;
const STAT_NAMES: [&str; 6] = ["HP", "Atk", "Def", "Spe", "SpA", "SpD"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// Adds moves, IVs and EVs under each record.
    pub verbose: bool,
}

pub fn render_json(export: &Export, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(export_json(export)),
    }
}

pub fn render_text(export: &Export) -> String {
    render_text_with_options(export, TextRenderOptions::default())
}

pub fn render_text_with_options(export: &Export, options: TextRenderOptions) -> String {
    let mut out = String::new();
    for trainer in &export.trainers {
        write_trainer_sheet(&mut out, trainer);
        let records: Vec<&ExportRecord> = export
            .creatures
            .iter()
            .filter(|record| record.slot.title == trainer.title)
            .collect();
        write_record_table(&mut out, &records, options);
        writeln!(&mut out).expect("writing to String cannot fail");
    }
    out
}

/// One line per event, in event order.
pub fn render_events_text(events: &[ProgressEvent]) -> String {
    let mut out = String::new();
    for event in events {
        writeln!(&mut out, "{}", describe_event(event)).expect("writing to String cannot fail");
    }
    out
}

pub fn render_events_json(events: &[ProgressEvent]) -> JsonValue {
    JsonValue::Array(
        events
            .iter()
            .map(|event| {
                let mut out = JsonMap::new();
                match event {
                    ProgressEvent::NewGameDetected { title } => {
                        out.insert("event".to_string(), JsonValue::from("new_game"));
                        out.insert("title".to_string(), JsonValue::from(title.as_str()));
                    }
                    ProgressEvent::Unlocked(flag) => {
                        out.insert("event".to_string(), JsonValue::from("unlocked"));
                        flag_json(&mut out, flag);
                    }
                }
                out.insert(
                    "description".to_string(),
                    JsonValue::from(describe_event(event)),
                );
                JsonValue::Object(out)
            })
            .collect(),
    )
}

fn export_json(export: &Export) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "trainers".to_string(),
        JsonValue::Array(
            export
                .trainers
                .iter()
                .map(|trainer| JsonValue::Object(trainer_json(trainer)))
                .collect(),
        ),
    );
    out.insert(
        "creatures".to_string(),
        JsonValue::Array(
            export
                .creatures
                .iter()
                .map(|record| JsonValue::Object(record_json(record)))
                .collect(),
        ),
    );
    out
}

fn trainer_json(trainer: &TrainerExport) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "title".to_string(),
        JsonValue::from(trainer.title.as_str()),
    );
    out.insert("name".to_string(), JsonValue::from(trainer.name.clone()));
    out.insert(
        "gender".to_string(),
        JsonValue::from(trainer.gender.to_string()),
    );
    out.insert("public_id".to_string(), JsonValue::from(trainer.public_id));
    out.insert("secret_id".to_string(), JsonValue::from(trainer.secret_id));
    out.insert(
        "play_time".to_string(),
        JsonValue::from(format_play_time(&trainer.play_time)),
    );
    out.insert("money".to_string(), JsonValue::from(trainer.money));
    out.insert("badges".to_string(), JsonValue::from(trainer.badges));
    out.insert("champion".to_string(), JsonValue::from(trainer.champion));
    out.insert(
        "national_dex".to_string(),
        JsonValue::from(trainer.national_dex),
    );
    out.insert("dex_owned".to_string(), JsonValue::from(trainer.dex_owned));
    out
}

fn record_json(record: &ExportRecord) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();
    out.insert(
        "title".to_string(),
        JsonValue::from(record.slot.title.as_str()),
    );
    out.insert(
        "location".to_string(),
        JsonValue::from(record.slot.location.to_string()),
    );
    out.insert("species".to_string(), JsonValue::from(record.species));
    out.insert(
        "species_name".to_string(),
        JsonValue::from(record.species_name.clone()),
    );
    out.insert(
        "nickname".to_string(),
        JsonValue::from(record.nickname.clone()),
    );
    out.insert(
        "level".to_string(),
        match record.level {
            Some(level) => JsonValue::from(level),
            None => JsonValue::Null,
        },
    );
    out.insert("pid".to_string(), JsonValue::from(record.pid));
    out.insert("otid".to_string(), JsonValue::from(record.otid));
    out.insert(
        "ot_name".to_string(),
        JsonValue::from(record.ot_name.clone()),
    );
    out.insert("is_egg".to_string(), JsonValue::from(record.is_egg));
    out.insert("held_item".to_string(), JsonValue::from(record.held_item));
    out.insert("experience".to_string(), JsonValue::from(record.experience));
    out.insert("moves".to_string(), JsonValue::from(record.moves.to_vec()));
    out.insert("ivs".to_string(), stats_json(&record.ivs));
    out.insert("evs".to_string(), stats_json(&record.evs));
    out.insert(
        "checksum_valid".to_string(),
        JsonValue::from(record.checksum_valid),
    );
    out
}

fn stats_json(values: &[u8; 6]) -> JsonValue {
    let mut out = JsonMap::new();
    for (name, value) in STAT_NAMES.iter().zip(values) {
        out.insert(name.to_string(), JsonValue::from(*value));
    }
    JsonValue::Object(out)
}

fn flag_json(out: &mut JsonMap<String, JsonValue>, flag: &ProgressFlag) {
    let (kind, title) = match flag {
        ProgressFlag::Badge { title, index } => {
            out.insert("badge".to_string(), JsonValue::from(index + 1));
            ("badge", Some(title))
        }
        ProgressFlag::Champion { title } => ("champion", Some(title)),
        ProgressFlag::NationalDex { title } => ("national_dex", Some(title)),
        ProgressFlag::DexOwned { threshold } => {
            out.insert("threshold".to_string(), JsonValue::from(*threshold));
            ("dex_owned", None)
        }
        ProgressFlag::LegendaryOwned { national } => {
            out.insert("national".to_string(), JsonValue::from(*national));
            ("legendary_owned", None)
        }
        ProgressFlag::AllTitlesStarted => ("all_titles_started", None),
    };
    out.insert("flag".to_string(), JsonValue::from(kind));
    if let Some(title) = title {
        out.insert("title".to_string(), JsonValue::from(title.as_str()));
    }
}

fn describe_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::NewGameDetected { title } => format!("{title}: new game detected"),
        ProgressEvent::Unlocked(flag) => match flag {
            ProgressFlag::Badge { title, index } => format!("{title}: badge {} earned", index + 1),
            ProgressFlag::Champion { title } => format!("{title}: entered the Hall of Fame"),
            ProgressFlag::NationalDex { title } => format!("{title}: National Dex unlocked"),
            ProgressFlag::DexOwned { threshold } => {
                format!("{threshold} species owned across all saves")
            }
            ProgressFlag::LegendaryOwned { national } => {
                format!("legendary #{national:03} owned")
            }
            ProgressFlag::AllTitlesStarted => "every title has a trainer".to_string(),
        },
    }
}

fn write_trainer_sheet(out: &mut String, trainer: &TrainerExport) {
    let heading = format!("POKEMON {}", trainer.title.as_str().to_uppercase());
    writeln!(out, "{}", centered_no_trailing(&heading, SHEET_WIDTH))
        .expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");

    let name_section = format!("  Name: {:<19}", trainer.name);
    let id_section = format!("ID: {:05}/{:05}", trainer.public_id, trainer.secret_id);
    writeln!(
        out,
        "{name_section}{:<22}Gender: {}",
        id_section, trainer.gender
    )
    .expect("writing to String cannot fail");

    let money_section = format!(" Money: ${}", format_number_with_commas(trainer.money));
    writeln!(
        out,
        "{:<27}Time: {:<14}Badges: {}/8",
        money_section,
        format_play_time(&trainer.play_time),
        trainer.badges
    )
    .expect("writing to String cannot fail");

    let dex = if trainer.national_dex {
        "National"
    } else {
        "Regional"
    };
    let champion = if trainer.champion { "Yes" } else { "No" };
    writeln!(
        out,
        "{:<27}Dex: {dex} ({} owned)",
        format!(" Champion: {champion}"),
        trainer.dex_owned
    )
    .expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");
}

fn write_record_table(out: &mut String, records: &[&ExportRecord], options: TextRenderOptions) {
    if records.is_empty() {
        writeln!(out, "  (no creatures)").expect("writing to String cannot fail");
        return;
    }

    writeln!(
        out,
        "  {:<a$}{:<b$}{:<c$}{:<d$}{}",
        "Slot",
        "Species",
        "Nickname",
        "Level",
        "OT",
        a = SLOT_COL_WIDTH,
        b = SPECIES_COL_WIDTH,
        c = NICKNAME_COL_WIDTH,
        d = LEVEL_COL_WIDTH
    )
    .expect("writing to String cannot fail");

    for record in records {
        let level = match record.level {
            Some(level) => level.to_string(),
            None => "-".to_string(),
        };
        let mut species = record.species_name.clone();
        if record.is_egg {
            species = format!("{species} (egg)");
        }
        if !record.checksum_valid {
            species.push('!');
        }
        let line = format!(
            "  {:<a$}{:<b$}{:<c$}{:<d$}{} {:05}",
            fit_column(&slot_label(record.slot.location), SLOT_COL_WIDTH - 1),
            fit_column(&species, SPECIES_COL_WIDTH - 1),
            fit_column(&record.nickname, NICKNAME_COL_WIDTH - 1),
            level,
            record.ot_name,
            record.otid & 0xFFFF,
            a = SLOT_COL_WIDTH,
            b = SPECIES_COL_WIDTH,
            c = NICKNAME_COL_WIDTH,
            d = LEVEL_COL_WIDTH
        );
        writeln!(out, "{}", line.trim_end()).expect("writing to String cannot fail");

        if options.verbose {
            let moves: Vec<String> = record
                .moves
                .iter()
                .filter(|&&id| id != 0)
                .map(|id| format!("#{id}"))
                .collect();
            writeln!(
                out,
                "      PID {:08X}  Exp {}  Moves {}",
                record.pid,
                format_number_with_commas(record.experience),
                if moves.is_empty() {
                    "-".to_string()
                } else {
                    moves.join(" ")
                }
            )
            .expect("writing to String cannot fail");
            writeln!(
                out,
                "      IV {}  EV {}",
                format_stats(&record.ivs),
                format_stats(&record.evs)
            )
            .expect("writing to String cannot fail");
        }
    }
}

fn slot_label(location: Location) -> String {
    match location {
        Location::Party(index) => format!("Party {}", index + 1),
        Location::Box { box_index, slot } => format!("Box {} slot {}", box_index + 1, slot + 1),
    }
}

fn format_stats(values: &[u8; 6]) -> String {
    values
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join("/")
}

fn format_play_time(play_time: &PlayTime) -> String {
    format!("{}:{:02}:{:02}", play_time.hours, play_time.minutes, play_time.seconds)
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn centered_no_trailing(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let left_padding = (width - len) / 2;
    format!("{}{}", " ".repeat(left_padding), value)
}

fn format_number_with_commas(n: u32) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}
