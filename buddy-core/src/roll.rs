//! Random character selection with consecutive-repeat tracking.

use rand::Rng;

use crate::gamedata::GameData;
use crate::save::SaveData;

/// Which completion set filters the roll pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollKind {
    /// Exclude characters already at gachikoi.
    Gachikoi,
    /// Exclude characters that cleared every stage.
    Stage,
    /// The whole roster.
    Any,
}

impl Default for RollKind {
    fn default() -> Self {
        RollKind::Any
    }
}

/// Characters still eligible for `kind`, in roster order.
pub fn pool<'a>(data: &'a GameData, save: &SaveData, kind: RollKind) -> Vec<&'a str> {
    data.character_order
        .iter()
        .map(String::as_str)
        .filter(|character| match kind {
            RollKind::Gachikoi => !save.gachikoi.contains(*character),
            RollKind::Stage => !save.all_done.contains(*character),
            RollKind::Any => true,
        })
        .collect()
}

/// A roll type stays available until its completion set covers the whole
/// roster.
pub fn can_roll(data: &GameData, save: &SaveData, kind: RollKind) -> bool {
    match kind {
        RollKind::Gachikoi => save.gachikoi.len() != data.character_order.len(),
        RollKind::Stage => save.all_done.len() != data.character_order.len(),
        RollKind::Any => true,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollResult {
    pub character: String,
    /// How many times in a row this same character has come up.
    pub repeat_count: u32,
}

/// Tracks the current pick across rolls. Reset whenever a new save view
/// is published.
#[derive(Debug, Default)]
pub struct Roller {
    selected: Option<String>,
    repeat_count: u32,
    last_kind: Option<RollKind>,
}

impl Roller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The kind used by the most recent roll, `Any` before the first one.
    pub fn last_kind(&self) -> RollKind {
        self.last_kind.unwrap_or_default()
    }

    /// Forget the current pick and repeat counter.
    pub fn reset(&mut self) {
        self.selected = None;
        self.repeat_count = 0;
    }

    /// Pick uniformly from the eligible pool. `None` when the pool is
    /// empty.
    pub fn roll(
        &mut self,
        data: &GameData,
        save: &SaveData,
        kind: RollKind,
        rng: &mut impl Rng,
    ) -> Option<RollResult> {
        self.last_kind = Some(kind);

        let pool = pool(data, save, kind);
        if pool.is_empty() {
            return None;
        }

        let pick = pool[rng.gen_range(0..pool.len())].to_string();
        if self.selected.as_deref() == Some(pick.as_str()) {
            self.repeat_count += 1;
        } else {
            self.repeat_count = 0;
        }
        self.selected = Some(pick.clone());

        Some(RollResult {
            character: pick,
            repeat_count: self.repeat_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn roster(characters: &[&str]) -> GameData {
        GameData {
            character_order: characters.iter().map(|c| c.to_string()).collect(),
            all_letters: Vec::new(),
        }
    }

    fn save_with_gachikoi(characters: &[&str]) -> SaveData {
        SaveData {
            gachikoi: characters.iter().map(|c| c.to_string()).collect(),
            ..SaveData::default()
        }
    }

    #[test]
    fn gachikoi_pool_excludes_finished_characters() {
        let data = roster(&["ame", "gura", "kiara"]);
        let save = save_with_gachikoi(&["gura"]);
        assert_eq!(pool(&data, &save, RollKind::Gachikoi), vec!["ame", "kiara"]);
        assert_eq!(pool(&data, &save, RollKind::Any).len(), 3);
    }

    #[test]
    fn stage_pool_excludes_all_done_characters() {
        let data = roster(&["ame", "gura"]);
        let save = SaveData {
            all_done: ["ame".to_string()].into_iter().collect(),
            // A non-empty stage list so all_done is meaningful.
            stages: vec!["STAGE 1".to_string()],
            ..SaveData::default()
        };
        assert_eq!(pool(&data, &save, RollKind::Stage), vec!["gura"]);
    }

    #[test]
    fn can_roll_flips_once_everyone_is_done() {
        let data = roster(&["ame", "gura"]);
        assert!(can_roll(&data, &save_with_gachikoi(&["ame"]), RollKind::Gachikoi));
        assert!(!can_roll(
            &data,
            &save_with_gachikoi(&["ame", "gura"]),
            RollKind::Gachikoi
        ));
        assert!(can_roll(
            &data,
            &save_with_gachikoi(&["ame", "gura"]),
            RollKind::Any
        ));
    }

    #[test]
    fn empty_pool_rolls_nothing() {
        let data = roster(&["ame"]);
        let save = save_with_gachikoi(&["ame"]);
        let mut roller = Roller::new();
        let mut rng = StdRng::seed_from_u64(0);
        assert!(roller.roll(&data, &save, RollKind::Gachikoi, &mut rng).is_none());
        assert_eq!(roller.selected(), None);
    }

    #[test]
    fn repeats_count_up_and_reset_on_a_different_pick() {
        let data = roster(&["ame"]);
        let save = SaveData::default();
        let mut roller = Roller::new();
        let mut rng = StdRng::seed_from_u64(7);

        // Single-character pool, so every roll repeats the pick.
        let first = roller.roll(&data, &save, RollKind::Any, &mut rng).unwrap();
        assert_eq!(first.repeat_count, 0);
        let second = roller.roll(&data, &save, RollKind::Any, &mut rng).unwrap();
        assert_eq!(second.repeat_count, 1);
        let third = roller.roll(&data, &save, RollKind::Any, &mut rng).unwrap();
        assert_eq!(third.repeat_count, 2);

        roller.reset();
        let fresh = roller.roll(&data, &save, RollKind::Any, &mut rng).unwrap();
        assert_eq!(fresh.repeat_count, 0);
    }

    #[test]
    fn last_kind_follows_the_most_recent_roll() {
        let data = roster(&["ame"]);
        let save = SaveData::default();
        let mut roller = Roller::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(roller.last_kind(), RollKind::Any);
        roller.roll(&data, &save, RollKind::Stage, &mut rng);
        assert_eq!(roller.last_kind(), RollKind::Stage);
        roller.reset();
        // Reset clears the pick, not the remembered kind.
        assert_eq!(roller.last_kind(), RollKind::Stage);
    }

    #[test]
    fn rolls_stay_inside_the_pool() {
        let data = roster(&["ame", "gura", "kiara", "ina"]);
        let save = save_with_gachikoi(&["gura", "ina"]);
        let mut roller = Roller::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..64 {
            let result = roller
                .roll(&data, &save, RollKind::Gachikoi, &mut rng)
                .unwrap();
            assert!(result.character == "ame" || result.character == "kiara");
        }
    }
}
