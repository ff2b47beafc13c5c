use crate::domain::models::{FIRST_HOLE, HOLES_PER_MATCH, HoleOutcome, HoleResults, MatchResult};

/// Tally of the recorded holes of one match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoleTally {
    pub team1_wins: u32,
    pub team2_wins: u32,
    pub played: u32,
}

impl HoleTally {
    pub fn from_holes(holes: &HoleResults) -> Self {
        let mut tally = Self::default();
        for hole in FIRST_HOLE..=HOLES_PER_MATCH {
            match holes.get(hole) {
                Some(HoleOutcome::Team1) => tally.team1_wins += 1,
                Some(HoleOutcome::Team2) => tally.team2_wins += 1,
                Some(HoleOutcome::Halved) => {}
                None => continue,
            }
            tally.played += 1;
        }
        tally
    }

    /// Positive when team 1 is ahead
    pub fn lead(&self) -> i32 {
        self.team1_wins as i32 - self.team2_wins as i32
    }

    pub fn remaining(&self) -> i32 {
        i32::from(HOLES_PER_MATCH) - self.played as i32
    }
}

/// Derives the match result and its display score from hole outcomes.
///
/// A side wins as soon as its lead exceeds the holes left to play. Until
/// then the result stays pending and the score describes the running state.
pub fn calculate_match_play_result(
    holes: &HoleResults,
    team1_name: &str,
    team2_name: &str,
) -> (MatchResult, String) {
    let tally = HoleTally::from_holes(holes);
    if tally.played == 0 {
        return (MatchResult::Pending, String::new());
    }

    let lead = tally.lead();
    let remaining = tally.remaining();

    if lead > 0 && lead > remaining {
        return (MatchResult::Team1, closing_score(lead, remaining));
    }
    if lead < 0 && -lead > remaining {
        return (MatchResult::Team2, closing_score(-lead, remaining));
    }
    if remaining == 0 && lead == 0 {
        return (MatchResult::Tie, "A/S".to_string());
    }

    let running = match lead {
        0 => format!("A/S thru {}", tally.played),
        l if l > 0 => format!("{} {} UP thru {}", team1_name, l, tally.played),
        l => format!("{} {} UP thru {}", team2_name, -l, tally.played),
    };
    (MatchResult::Pending, running)
}

fn closing_score(margin: i32, remaining: i32) -> String {
    if remaining == 0 {
        format!("{} UP", margin)
    } else {
        format!("{} & {}", margin, remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use HoleOutcome::{Halved, Team1, Team2};

    fn holes(outcomes: &[(u8, HoleOutcome)]) -> HoleResults {
        outcomes.iter().copied().collect()
    }

    fn run(outcomes: &[HoleOutcome]) -> HoleResults {
        outcomes
            .iter()
            .enumerate()
            .map(|(idx, o)| (idx as u8 + 1, *o))
            .collect()
    }

    fn calc(h: &HoleResults) -> (MatchResult, String) {
        calculate_match_play_result(h, "Europe", "USA")
    }

    #[test]
    fn test_no_holes_is_pending_without_score() {
        assert_eq!(calc(&HoleResults::new()), (MatchResult::Pending, String::new()));
    }

    #[test]
    fn test_nine_up_with_nine_to_play_is_not_closed() {
        let h = run(&[Team1; 9]);
        assert_eq!(calc(&h), (MatchResult::Pending, "Europe 9 UP thru 9".to_string()));
    }

    #[test]
    fn test_ten_up_with_eight_to_play_closes() {
        let h = run(&[Team1; 10]);
        assert_eq!(calc(&h), (MatchResult::Team1, "10 & 8".to_string()));
    }

    #[test]
    fn test_all_eighteen_won() {
        let h = run(&[Team1; 18]);
        assert_eq!(calc(&h), (MatchResult::Team1, "18 UP".to_string()));
    }

    #[test]
    fn test_last_hole_lost_still_wins() {
        let mut outcomes = vec![Team1; 17];
        outcomes.push(Team2);
        assert_eq!(calc(&run(&outcomes)), (MatchResult::Team1, "16 UP".to_string()));
    }

    #[test]
    fn test_level_after_eighteen_is_tie() {
        let mut outcomes = vec![Team1; 9];
        outcomes.extend([Team2; 9]);
        assert_eq!(calc(&run(&outcomes)), (MatchResult::Tie, "A/S".to_string()));
    }

    #[test]
    fn test_team2_closes_out() {
        let mut outcomes = vec![Halved; 14];
        outcomes.extend([Team2; 3]);
        // 3 down with 1 to play
        assert_eq!(calc(&run(&outcomes)), (MatchResult::Team2, "3 & 1".to_string()));
    }

    #[test]
    fn test_dormie_is_still_pending() {
        let mut outcomes = vec![Halved; 14];
        outcomes.extend([Team2; 2]);
        // 2 down with 2 to play
        assert_eq!(
            calc(&run(&outcomes)),
            (MatchResult::Pending, "USA 2 UP thru 16".to_string())
        );
    }

    #[test]
    fn test_level_in_progress() {
        let h = run(&[Team1, Team2, Halved]);
        assert_eq!(calc(&h), (MatchResult::Pending, "A/S thru 3".to_string()));
    }

    #[test]
    fn test_one_up_after_eighteen() {
        let mut outcomes = vec![Halved; 17];
        outcomes.push(Team2);
        assert_eq!(calc(&run(&outcomes)), (MatchResult::Team2, "1 UP".to_string()));
    }

    #[test]
    fn test_sparse_holes_count_only_recorded() {
        let h = holes(&[(3, Team1), (5, Team1), (11, Halved)]);
        assert_eq!(calc(&h), (MatchResult::Pending, "Europe 2 UP thru 3".to_string()));
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let forward = holes(&[(1, Team1), (2, Team2), (3, Team1)]);
        let backward = holes(&[(3, Team1), (2, Team2), (1, Team1)]);
        assert_eq!(calc(&forward), calc(&backward));
    }

    #[test]
    fn test_tally_counts() {
        let tally = HoleTally::from_holes(&run(&[Team1, Halved, Team2, Team2]));
        assert_eq!(
            tally,
            HoleTally {
                team1_wins: 1,
                team2_wins: 2,
                played: 4
            }
        );
        assert_eq!(tally.lead(), -1);
        assert_eq!(tally.remaining(), 14);
    }
}
