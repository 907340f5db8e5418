//! Game rules: modes, wine colors, scoring constants, and the dice-sum
//! event tables that drive each turn.
//!
//! Everything here is pure data and lookup logic; the controller decides
//! when to consult it and the server remains authoritative for every
//! resulting score change.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The two game variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Fixed 5-round game; max score wins, min score loses.
    Family,
    /// Unbounded rounds; first player to 3 drinks loses.
    Drunk,
}

impl GameMode {
    pub fn label(self) -> &'static str {
        match self {
            GameMode::Family => "family",
            GameMode::Drunk => "drunk",
        }
    }
}

/// Rounds played in a family-mode game.
pub const FAMILY_ROUNDS: u32 = 5;

/// Drinks that end a drunk-mode game for whoever reaches them.
pub const DRUNK_DRINK_LIMIT: i32 = 3;

/// The four dispenser colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WineColor {
    Red,
    Blue,
    Yellow,
    Green,
}

impl WineColor {
    pub const ALL: [WineColor; 4] = [
        WineColor::Red,
        WineColor::Blue,
        WineColor::Yellow,
        WineColor::Green,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WineColor::Red => "red",
            WineColor::Blue => "blue",
            WineColor::Yellow => "yellow",
            WineColor::Green => "green",
        }
    }

    /// Pick a uniformly random color.
    pub fn random<R: Rng>(rng: &mut R) -> WineColor {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// The kind of dispenser action reported to the server via
/// `POST /api/game/event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PumpTrigger {
    /// Initial base pour when a game starts.
    GameStart,
    /// A dice event (sums 4, 7, 8) caused a pour.
    Score,
    /// Refill after a forced drink.
    AfterDrink,
}

/// Head-to-head minigames requiring manual adjudication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuelKind {
    /// Black-white matching game (family 6, drunk 6).
    BlackWhite,
    /// Never-have-I-ever (drunk 3).
    NeverHaveIEver,
    /// Arm wrestling (drunk 5).
    ArmWrestling,
}

impl DuelKind {
    pub fn label(self) -> &'static str {
        match self {
            DuelKind::BlackWhite => "black-white",
            DuelKind::NeverHaveIEver => "never have I ever",
            DuelKind::ArmWrestling => "arm wrestling",
        }
    }
}

/// What a dice roll triggers for the acting player.
///
/// Exactly one event exists for every `(mode, sum, double)` combination
/// with sums in `2..=12`; [`dice_event`] is the single lookup point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceEvent {
    /// Nothing happens; the turn simply advances.
    Nothing,
    /// The acting player drinks: score +1, base color reset, and in
    /// family mode the round advances.
    ForcedDrink,
    /// Multiple-choice quiz; correct +1, wrong -1.
    Quiz,
    /// The machine adds a random color to the stack.
    RandomWine,
    /// The acting player picks the color to add.
    PickWine,
    /// A duel against a random opponent. In family mode winner +1 and
    /// loser -1; in drunk mode the loser takes a forced drink.
    Duel(DuelKind),
    /// Truth-or-dare prompt fetched from the server.
    TruthOrDare,
    /// Dragon gate: draw a third card, strictly between the gate is safe,
    /// outside (or matching) is a forced drink.
    DragonGate,
}

/// Look up the event for a roll.
///
/// Double pairs are checked before the sum, matching the table order the
/// game was designed with.
pub fn dice_event(mode: GameMode, sum: u8, is_double: bool) -> DiceEvent {
    debug_assert!((2..=12).contains(&sum));
    match mode {
        GameMode::Family => {
            if is_double || sum == 9 {
                return DiceEvent::ForcedDrink;
            }
            match sum {
                3 | 5 => DiceEvent::Quiz,
                4 | 8 => DiceEvent::RandomWine,
                6 => DiceEvent::Duel(DuelKind::BlackWhite),
                7 => DiceEvent::PickWine,
                10 | 11 => DiceEvent::TruthOrDare,
                _ => DiceEvent::Nothing,
            }
        }
        GameMode::Drunk => {
            if is_double {
                return DiceEvent::ForcedDrink;
            }
            match sum {
                3 => DiceEvent::Duel(DuelKind::NeverHaveIEver),
                4 | 8 => DiceEvent::RandomWine,
                5 => DiceEvent::Duel(DuelKind::ArmWrestling),
                6 => DiceEvent::Duel(DuelKind::BlackWhite),
                7 => DiceEvent::PickWine,
                9 => DiceEvent::DragonGate,
                10 | 11 => DiceEvent::TruthOrDare,
                _ => DiceEvent::Nothing,
            }
        }
    }
}

/// Dispenser run time in seconds for a `Score` pump event, per mode and
/// dice sum. `GameStart` is always 0.5 and `AfterDrink` always 0.7.
pub fn pump_duration(mode: GameMode, trigger: PumpTrigger, sum: Option<u8>) -> f64 {
    match trigger {
        PumpTrigger::GameStart => 0.5,
        PumpTrigger::AfterDrink => 0.7,
        PumpTrigger::Score => match (mode, sum) {
            (GameMode::Family, Some(7)) => 0.6,
            (GameMode::Family, _) => 0.4,
            (GameMode::Drunk, Some(7)) => 0.7,
            (GameMode::Drunk, _) => 0.6,
        },
    }
}

/// Cups a drunk-mode player may still drink before losing, given the
/// current worst score. Shown in the round banner.
pub fn drunk_cups_left(scores: &HashMap<String, i32>) -> i32 {
    let max = scores.values().copied().max().unwrap_or(0);
    (DRUNK_DRINK_LIMIT - max).max(0)
}

/// Client-side redundancy for the drunk end condition: the first player
/// (in iteration order) at or past the drink limit, if any.
pub fn drunk_local_loser(scores: &HashMap<String, i32>) -> Option<(&str, i32)> {
    scores
        .iter()
        .find(|(_, score)| **score >= DRUNK_DRINK_LIMIT)
        .map(|(id, score)| (id.as_str(), *score))
}

/// Family-mode standings: ids at the max score and ids at the min score.
///
/// Every player can be both when all scores are equal, which the end
/// screen renders as a draw.
pub fn family_standings(scores: &HashMap<String, i32>) -> (Vec<&str>, Vec<&str>) {
    let Some(max) = scores.values().copied().max() else {
        return (Vec::new(), Vec::new());
    };
    let min = scores.values().copied().min().unwrap_or(max);
    let winners = scores
        .iter()
        .filter(|(_, s)| **s == max)
        .map(|(id, _)| id.as_str())
        .collect();
    let losers = scores
        .iter()
        .filter(|(_, s)| **s == min)
        .map(|(id, _)| id.as_str())
        .collect();
    (winners, losers)
}

/// A dragon-gate draw: two distinct gate cards and the verdict function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragonGate {
    pub low: u8,
    pub high: u8,
}

impl DragonGate {
    /// Draw two distinct cards in `1..=13` and order them.
    pub fn draw<R: Rng>(rng: &mut R) -> DragonGate {
        let first = rng.random_range(1..=13u8);
        let mut second = rng.random_range(1..=13u8);
        while second == first {
            second = rng.random_range(1..=13u8);
        }
        DragonGate {
            low: first.min(second),
            high: first.max(second),
        }
    }

    /// Draw the third card.
    pub fn third<R: Rng>(rng: &mut R) -> u8 {
        rng.random_range(1..=13)
    }

    /// Strictly between the gate posts is safe; hitting a post or landing
    /// outside means a drink.
    pub fn passes(self, card: u8) -> bool {
        card > self.low && card < self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn every_sum_has_exactly_one_event_in_both_modes() {
        for mode in [GameMode::Family, GameMode::Drunk] {
            for sum in 2..=12u8 {
                for is_double in [false, true] {
                    // The match itself guarantees exactly one arm; this
                    // guards the sum range staying fully covered.
                    let _ = dice_event(mode, sum, is_double);
                }
            }
        }
    }

    #[test]
    fn family_table_contents() {
        assert_eq!(dice_event(GameMode::Family, 9, false), DiceEvent::ForcedDrink);
        assert_eq!(dice_event(GameMode::Family, 6, true), DiceEvent::ForcedDrink);
        assert_eq!(dice_event(GameMode::Family, 3, false), DiceEvent::Quiz);
        assert_eq!(dice_event(GameMode::Family, 5, false), DiceEvent::Quiz);
        assert_eq!(dice_event(GameMode::Family, 4, false), DiceEvent::RandomWine);
        assert_eq!(dice_event(GameMode::Family, 8, false), DiceEvent::RandomWine);
        assert_eq!(
            dice_event(GameMode::Family, 6, false),
            DiceEvent::Duel(DuelKind::BlackWhite)
        );
        assert_eq!(dice_event(GameMode::Family, 7, false), DiceEvent::PickWine);
        assert_eq!(dice_event(GameMode::Family, 10, false), DiceEvent::TruthOrDare);
        assert_eq!(dice_event(GameMode::Family, 11, false), DiceEvent::TruthOrDare);
        assert_eq!(dice_event(GameMode::Family, 2, true), DiceEvent::ForcedDrink);
        assert_eq!(dice_event(GameMode::Family, 12, true), DiceEvent::ForcedDrink);
    }

    #[test]
    fn drunk_table_contents() {
        assert_eq!(dice_event(GameMode::Drunk, 4, true), DiceEvent::ForcedDrink);
        assert_eq!(
            dice_event(GameMode::Drunk, 3, false),
            DiceEvent::Duel(DuelKind::NeverHaveIEver)
        );
        assert_eq!(
            dice_event(GameMode::Drunk, 5, false),
            DiceEvent::Duel(DuelKind::ArmWrestling)
        );
        assert_eq!(
            dice_event(GameMode::Drunk, 6, false),
            DiceEvent::Duel(DuelKind::BlackWhite)
        );
        assert_eq!(dice_event(GameMode::Drunk, 9, false), DiceEvent::DragonGate);
        assert_eq!(dice_event(GameMode::Drunk, 2, false), DiceEvent::Nothing);
        assert_eq!(dice_event(GameMode::Drunk, 12, false), DiceEvent::Nothing);
    }

    #[test]
    fn sums_two_and_twelve_without_double_do_nothing() {
        // 2 and 12 can only come from doubles on real dice, but the table
        // still answers for the non-double case.
        for mode in [GameMode::Family, GameMode::Drunk] {
            assert_eq!(dice_event(mode, 2, false), DiceEvent::Nothing);
            assert_eq!(dice_event(mode, 12, false), DiceEvent::Nothing);
        }
    }

    #[test]
    fn pump_durations_match_the_machine_table() {
        assert_eq!(pump_duration(GameMode::Family, PumpTrigger::GameStart, None), 0.5);
        assert_eq!(pump_duration(GameMode::Drunk, PumpTrigger::AfterDrink, None), 0.7);
        assert_eq!(pump_duration(GameMode::Family, PumpTrigger::Score, Some(4)), 0.4);
        assert_eq!(pump_duration(GameMode::Family, PumpTrigger::Score, Some(7)), 0.6);
        assert_eq!(pump_duration(GameMode::Drunk, PumpTrigger::Score, Some(8)), 0.6);
        assert_eq!(pump_duration(GameMode::Drunk, PumpTrigger::Score, Some(7)), 0.7);
    }

    #[test]
    fn cups_left_tracks_the_worst_score() {
        let mut scores = HashMap::new();
        assert_eq!(drunk_cups_left(&scores), 3);
        scores.insert("a".to_string(), 1);
        scores.insert("b".to_string(), 2);
        assert_eq!(drunk_cups_left(&scores), 1);
        scores.insert("b".to_string(), 5);
        assert_eq!(drunk_cups_left(&scores), 0);
    }

    #[test]
    fn drunk_local_loser_fires_at_the_limit() {
        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 2);
        assert!(drunk_local_loser(&scores).is_none());
        scores.insert("b".to_string(), 3);
        assert_eq!(drunk_local_loser(&scores), Some(("b", 3)));
    }

    #[test]
    fn family_standings_split_max_and_min() {
        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 3);
        scores.insert("b".to_string(), -1);
        scores.insert("c".to_string(), 0);
        let (winners, losers) = family_standings(&scores);
        assert_eq!(winners, vec!["a"]);
        assert_eq!(losers, vec!["b"]);
    }

    #[test]
    fn family_standings_all_equal_is_a_draw() {
        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 0);
        scores.insert("b".to_string(), 0);
        let (winners, losers) = family_standings(&scores);
        assert_eq!(winners.len(), 2);
        assert_eq!(losers.len(), 2);
    }

    #[test]
    fn dragon_gate_draws_distinct_ordered_posts() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let gate = DragonGate::draw(&mut rng);
            assert!(gate.low < gate.high);
            assert!((1..=13).contains(&gate.low));
            assert!((1..=13).contains(&gate.high));
        }
    }

    #[test]
    fn dragon_gate_verdicts() {
        let gate = DragonGate { low: 3, high: 9 };
        assert!(gate.passes(4));
        assert!(gate.passes(8));
        assert!(!gate.passes(3));
        assert!(!gate.passes(9));
        assert!(!gate.passes(1));
        assert!(!gate.passes(13));
    }

    #[test]
    fn random_color_is_always_one_of_four() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert!(WineColor::ALL.contains(&WineColor::random(&mut rng)));
        }
    }

    #[test]
    fn modes_and_colors_serialize_snake_case() {
        assert_eq!(serde_json::to_string(&GameMode::Family).unwrap(), r#""family""#);
        assert_eq!(serde_json::to_string(&WineColor::Red).unwrap(), r#""red""#);
        assert_eq!(
            serde_json::to_string(&PumpTrigger::AfterDrink).unwrap(),
            r#""after_drink""#
        );
    }
}
