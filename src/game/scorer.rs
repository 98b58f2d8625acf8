use std::time::Duration;

/// Guess-speed tiers: (inclusive upper bound in seconds, points)
const GUESS_TIERS: [(u64, i64); 3] = [(15, 20), (30, 15), (45, 10)];
const SLOW_GUESS_POINTS: i64 = 5;

const SOLO_BASE_POINTS: i64 = 100;
const SOLO_HINT_PENALTY: i64 = 10;
const SOLO_MIN_POINTS: i64 = 10;

pub struct Scorer;

impl Scorer {
    /// Points for a correct guess given the time since the clue was accepted.
    ///
    /// Scoring rules:
    /// - up to 15s: 20 points
    /// - up to 30s: 15 points
    /// - up to 45s: 10 points
    /// - slower: 5 points
    ///
    /// Only the guesser is rewarded; the clue giver earns nothing.
    pub fn guess_points(elapsed: Duration) -> i64 {
        GUESS_TIERS
            .iter()
            .find(|(limit, _)| elapsed <= Duration::from_secs(*limit))
            .map(|(_, points)| *points)
            .unwrap_or(SLOW_GUESS_POINTS)
    }

    /// Points for solving a solo word after `hints_given` hints
    pub fn solo_points(hints_given: usize) -> i64 {
        let penalty = (hints_given.saturating_sub(1) as i64) * SOLO_HINT_PENALTY;
        (SOLO_BASE_POINTS - penalty).max(SOLO_MIN_POINTS)
    }
}
