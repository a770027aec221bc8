//! Terminal rendering of the completion grid, letter checklist and roll
//! results.

use buddy_core::roll::RollResult;
use buddy_core::{Context, GameData, SaveData};

pub fn print_status(ctx: &Context) {
    let Some(save) = ctx.save_data() else { return };
    print_grid(ctx.game_data(), save);
    print_letters(ctx.game_data(), save);
}

fn print_grid(data: &GameData, save: &SaveData) {
    let name_width = data
        .character_order
        .iter()
        .map(|character| format_name(character).len())
        .max()
        .unwrap_or(0)
        .max("character".len());

    let codes: Vec<String> = save.stages.iter().map(|stage| abbr_stage(stage)).collect();

    let mut header = format!("{:<name_width$}", "character");
    for code in &codes {
        header.push_str(&format!(" {code:>3}"));
    }
    header.push_str("  flags");
    println!("{header}");

    for character in &data.character_order {
        let mut row = format!("{:<name_width$}", format_name(character));
        let cleared = save.clears.get(character);
        for stage in &save.stages {
            let mark = cleared.map_or(false, |list| list.iter().any(|s| s == stage));
            row.push_str(&format!(" {:>3}", if mark { "x" } else { "." }));
        }

        let mut flags = String::new();
        if save.all_done.contains(character) {
            flags.push('A');
        }
        if save.gachikoi.contains(character) {
            flags.push('G');
        }
        if save.owned.contains(character) {
            flags.push('O');
        }
        row.push_str("  ");
        row.push_str(&flags);
        println!("{row}");
    }

    println!("flags: A = all stages done, G = gachikoi, O = owned");
}

fn print_letters(data: &GameData, save: &SaveData) {
    if data.all_letters.is_empty() {
        return;
    }
    println!();
    println!("fan letters:");
    for (index, letter) in data.all_letters.iter().enumerate() {
        let mark = if save.letters.contains(letter) { "x" } else { " " };
        println!("{:>3}. [{mark}] {letter}", index + 1);
    }
}

/// Log everything `next` has that `previous` did not. Returns whether any
/// new stage clear was seen.
pub fn log_new_progress(data: &GameData, previous: &SaveData, next: &SaveData) -> bool {
    let empty = Vec::new();
    let mut saw_new_clear = false;

    for character in &data.character_order {
        let Some(next_list) = next.clears.get(character) else {
            continue;
        };
        let previous_list = previous.clears.get(character).unwrap_or(&empty);
        for stage in next_list {
            if !previous_list.iter().any(|s| s == stage) {
                log::info!("{} cleared {}", format_name(character), stage);
                saw_new_clear = true;
            }
        }
    }

    for letter in &next.letters {
        if !previous.letters.contains(letter) {
            log::info!("Obtained fan letter for {letter}");
        }
    }

    saw_new_clear
}

pub fn format_roll(result: &RollResult) -> String {
    let repeat = format_repeat_text(result.repeat_count);
    if repeat.is_empty() {
        format_name(&result.character)
    } else {
        format!("{} ({repeat})", format_name(&result.character))
    }
}

/// Character ids are lowercase in the data file; show them capitalized.
fn format_name(character: &str) -> String {
    let mut chars = character.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `STAGE 12 (HARD)` -> `12H`, `STAGE 3` -> `3`. Anything else passes
/// through untouched.
fn abbr_stage(stage: &str) -> String {
    let Some(rest) = stage.strip_prefix("STAGE ") else {
        return stage.to_string();
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return stage.to_string();
    }
    let tail = &rest[digits.len()..];
    if tail.is_empty() {
        digits
    } else if tail == " (HARD)" {
        format!("{digits}H")
    } else {
        stage.to_string()
    }
}

fn format_repeat_text(count: u32) -> String {
    if count > 3 {
        return "many times in a row".to_string();
    }
    if count > 0 {
        return vec!["again"; count as usize].join(" ");
    }
    String::new()
}
