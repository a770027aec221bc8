//! Save-file decoding and derivation of the completion view.
//!
//! The save file is a base64 blob wrapping a JSON object. Decoding gives
//! the untrusted [`RawSave`] record; [`derive`] normalizes it against the
//! known character roster into the [`SaveData`] view the frontends
//! consume. Derivation is pure, total and rebuilds the view from scratch
//! on every run.

use std::collections::{HashMap, HashSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::gamedata::GameData;
use crate::Result;

/// Only identifiers with this prefix count as stages; the game also logs
/// special events under other names.
pub const STAGE_PREFIX: &str = "STAGE";

/// Case-insensitive substring marking a hard variant.
const HARD_MARKER: &str = "hard";

/// Inclusive fandom-EXP threshold for gachikoi status.
const GACHIKOI_EXP_THRESHOLD: f64 = 100.0;

/// The decoded shape of the save file. Keys may repeat; the game makes no
/// uniqueness promises. Sections missing from the file decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSave {
    #[serde(default, rename = "completedStages")]
    pub completed_stages: Vec<(String, Vec<String>)>,

    #[serde(default)]
    pub fanletters: Vec<String>,

    #[serde(default, rename = "fandomEXP")]
    pub fandom_exp: Vec<(String, f64)>,

    #[serde(default)]
    pub characters: Vec<(String, f64)>,
}

/// The derived completion view. Replaced whole on every save change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveData {
    /// Deduplicated stage identifiers, normal variants first, numeric
    /// order within each tier.
    pub stages: Vec<String>,
    /// Cleared stages per character. Key set is exactly the known
    /// character roster; characters with no clears map to an empty list.
    pub clears: HashMap<String, Vec<String>>,
    /// Fan letters obtained.
    pub letters: HashSet<String>,
    /// Characters at or past the fandom-EXP threshold.
    pub gachikoi: HashSet<String>,
    /// Characters that cleared every known stage.
    pub all_done: HashSet<String>,
    /// Characters pulled at least once.
    pub owned: HashSet<String>,
}

/// Decode raw save-file contents: trim, base64-decode, parse JSON.
///
/// Empty contents are not handled here; the pipeline skips those before
/// calling in. Anything non-empty that fails to decode is a hard error.
pub fn decode(contents: &[u8]) -> Result<RawSave> {
    let json = STANDARD.decode(trim_ascii_whitespace(contents))?;
    Ok(serde_json::from_slice(&json)?)
}

/// Build the completion view for `raw` against the known roster.
pub fn derive(raw: &RawSave, data: &GameData) -> SaveData {
    let known: HashSet<&str> = data.character_order.iter().map(String::as_str).collect();

    let mut stages = Vec::new();
    let mut seen = HashSet::new();
    for (stage, _) in &raw.completed_stages {
        if stage.starts_with(STAGE_PREFIX) && seen.insert(stage.as_str()) {
            stages.push(stage.clone());
        }
    }
    sort_stages(&mut stages);

    // Invert the stage-major pairs into per-character lists, first-seen
    // order, duplicates collapsed.
    let mut by_char: HashMap<&str, Vec<String>> = HashMap::new();
    for (stage, characters) in &raw.completed_stages {
        for character in characters {
            let list = by_char.entry(character.as_str()).or_default();
            if !list.iter().any(|s| s == stage) {
                list.push(stage.clone());
            }
        }
    }

    let mut clears: HashMap<String, Vec<String>> = HashMap::new();
    for character in &data.character_order {
        if clears.contains_key(character) {
            continue;
        }
        let mut list = by_char.remove(character.as_str()).unwrap_or_default();
        sort_stages(&mut list);
        clears.insert(character.clone(), list);
    }

    let letters: HashSet<String> = raw.fanletters.iter().cloned().collect();

    let gachikoi: HashSet<String> = raw
        .fandom_exp
        .iter()
        .filter(|(name, exp)| *exp >= GACHIKOI_EXP_THRESHOLD && known.contains(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect();

    let all_done: HashSet<String> = clears
        .iter()
        .filter(|(_, list)| list.len() == stages.len())
        .map(|(character, _)| character.clone())
        .collect();

    let owned: HashSet<String> = raw
        .characters
        .iter()
        .filter(|(name, pulls)| *pulls > 0.0 && known.contains(name.as_str()))
        .map(|(name, _)| name.clone())
        .collect();

    SaveData {
        stages,
        clears,
        letters,
        gachikoi,
        all_done,
        owned,
    }
}

/// Sort stages so all normal variants come before all hard variants,
/// numerically within each tier. Stable, so already-sorted input is a
/// fixed point.
pub fn sort_stages(stages: &mut [String]) {
    stages.sort_by_key(|stage| stage_sort_key(stage));
}

fn stage_sort_key(stage: &str) -> (bool, u32) {
    (is_hard(stage), stage_number(stage))
}

fn is_hard(stage: &str) -> bool {
    stage.to_ascii_lowercase().contains(HARD_MARKER)
}

/// First contiguous digit run in the identifier. No digits, or a run too
/// large for u32, sorts like zero.
fn stage_number(stage: &str) -> u32 {
    let bytes = stage.as_bytes();
    let Some(start) = bytes.iter().position(|b| b.is_ascii_digit()) else {
        return 0;
    };
    let run = bytes[start..]
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len() - start);
    stage[start..start + run].parse().unwrap_or(0)
}

fn trim_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |pos| pos + 1);
    &bytes[start..end]
}
