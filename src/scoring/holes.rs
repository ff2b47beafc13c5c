use crate::domain::models::{FIRST_HOLE, HOLES_PER_MATCH, HoleNumber, HoleOutcome, HoleResults, Match};

use super::match_play::calculate_match_play_result;

pub fn is_valid_hole(hole: HoleNumber) -> bool {
    (FIRST_HOLE..=HOLES_PER_MATCH).contains(&hole)
}

/// Records (or with `None`, erases) one hole, then marks every earlier
/// unrecorded hole as halved.
///
/// Entry is expected to run in hole order, so skipping ahead asserts that the
/// skipped holes were halved.
pub fn record_hole(holes: &mut HoleResults, hole: HoleNumber, outcome: Option<HoleOutcome>) {
    match outcome {
        Some(outcome) => holes.set(hole, outcome),
        None => holes.clear(hole),
    }

    for earlier in FIRST_HOLE..hole {
        if !holes.is_played(earlier) {
            holes.set(earlier, HoleOutcome::Halved);
        }
    }
}

impl Match {
    /// Recomputes `result` and `score` from the current hole record
    pub fn refresh_result(&mut self, team1_name: &str, team2_name: &str) {
        let (result, score) = calculate_match_play_result(&self.hole_results, team1_name, team2_name);
        self.result = result;
        self.score = score;
    }

    /// Applies one hole edit and re-derives the match result
    pub fn record_hole(
        &mut self,
        hole: HoleNumber,
        outcome: Option<HoleOutcome>,
        team1_name: &str,
        team2_name: &str,
    ) {
        record_hole(&mut self.hole_results, hole, outcome);
        self.refresh_result(team1_name, team2_name);
    }
}
