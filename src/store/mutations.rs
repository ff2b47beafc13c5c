//! Storage-independent tournament edits.
//!
//! Backends run these between loading and storing the aggregate, under
//! their exclusive lock. A failed edit leaves the loaded copy to be dropped,
//! so nothing partial is ever stored.

use chrono::Utc;

use super::error::{StoreError, StoreResult};
use crate::domain::models::{HoleNumber, HoleOutcome, Match, MatchResult, Tournament};
use crate::domain::tournament::Pairing;
use crate::scoring::is_valid_hole;

/// Ids name files and URL path segments in the persistent backends, so
/// empty ids, path separators and leading `.` or `_` are refused everywhere
pub fn validate_tournament_id(id: &str) -> StoreResult<()> {
    let unsafe_id = id.trim().is_empty()
        || id.contains('/')
        || id.contains('\\')
        || id.starts_with('.')
        || id.starts_with('_');
    if unsafe_id {
        return Err(StoreError::Invalid(format!("tournament id {:?}", id)));
    }
    Ok(())
}

pub fn locate_match<'a>(
    tournament: &'a mut Tournament,
    round_number: u32,
    match_id: &str,
) -> StoreResult<&'a mut Match> {
    tournament
        .round_mut(round_number)
        .ok_or_else(|| StoreError::round_not_found(round_number))?
        .find_match_mut(match_id)
        .ok_or_else(|| StoreError::match_not_found(match_id, round_number))
}

/// Records one hole and re-derives the match result from the team names
/// as they are now
pub fn apply_hole_result(
    tournament: &mut Tournament,
    round_number: u32,
    match_id: &str,
    hole: HoleNumber,
    outcome: Option<HoleOutcome>,
) -> StoreResult<()> {
    if !is_valid_hole(hole) {
        return Err(StoreError::Invalid(format!("hole number {} (expected 1-18)", hole)));
    }

    let (team1_name, team2_name) = {
        let (a, b) = tournament.team_names();
        (a.to_string(), b.to_string())
    };
    let m = locate_match(tournament, round_number, match_id)?;
    m.record_hole(hole, outcome, &team1_name, &team2_name);
    Ok(())
}

/// Manual override; the hole record is left as it is
pub fn apply_match_result(
    tournament: &mut Tournament,
    round_number: u32,
    match_id: &str,
    result: MatchResult,
    score: &str,
) -> StoreResult<()> {
    let m = locate_match(tournament, round_number, match_id)?;
    m.result = result;
    m.score = score.to_string();
    Ok(())
}

/// Replaces the round's matches with fresh pending ones
pub fn apply_round_pairings(
    tournament: &mut Tournament,
    round_number: u32,
    pairings: Vec<Pairing>,
) -> StoreResult<()> {
    let round = tournament
        .round_mut(round_number)
        .ok_or_else(|| StoreError::round_not_found(round_number))?;
    round.matches = pairings
        .into_iter()
        .map(|p| p.into_match(round_number))
        .collect();
    Ok(())
}

pub fn apply_player_link(tournament: &mut Tournament, player_id: &str, email: &str) -> StoreResult<()> {
    let player = tournament
        .find_player_mut(player_id)
        .ok_or_else(|| StoreError::NotFound(format!("player {}", player_id)))?;
    player.user_email = Some(email.to_string()).filter(|e| !e.is_empty());
    Ok(())
}

pub fn touch(tournament: &mut Tournament) {
    tournament.updated_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tournament_with_singles() -> (Tournament, String) {
        let mut t = Tournament::new("Cup", "Europe", "USA");
        apply_round_pairings(
            &mut t,
            5,
            vec![Pairing::new(vec!["e1".into()], vec!["u1".into()])],
        )
        .unwrap();
        let match_id = t.round(5).unwrap().matches[0].id.clone();
        (t, match_id)
    }

    #[test]
    fn test_tournament_id_validation() {
        assert!(validate_tournament_id("3f2a9c1e-0000-4000-8000-000000000001").is_ok());
        assert!(validate_tournament_id("ryder-2025").is_ok());
        for bad in ["", "  ", "a/b", "a\\b", ".hidden", "_users", ".."] {
            assert!(validate_tournament_id(bad).unwrap_err().is_invalid(), "{:?}", bad);
        }
    }

    #[test]
    fn test_hole_result_updates_score() {
        let (mut t, match_id) = tournament_with_singles();
        apply_hole_result(&mut t, 5, &match_id, 1, Some(HoleOutcome::Team2)).unwrap();

        let m = &t.round(5).unwrap().matches[0];
        assert_eq!(m.score, "USA 1 UP thru 1");
    }

    #[test]
    fn test_hole_result_uses_current_team_names() {
        let (mut t, match_id) = tournament_with_singles();
        t.teams[0].name = "Team Europe".to_string();
        apply_hole_result(&mut t, 5, &match_id, 1, Some(HoleOutcome::Team1)).unwrap();

        assert_eq!(t.round(5).unwrap().matches[0].score, "Team Europe 1 UP thru 1");
    }

    #[test]
    fn test_unknown_round_and_match() {
        let (mut t, match_id) = tournament_with_singles();

        let err = apply_hole_result(&mut t, 9, &match_id, 1, None).unwrap_err();
        assert!(err.is_not_found());

        let err = apply_hole_result(&mut t, 4, &match_id, 1, None).unwrap_err();
        assert_eq!(err.to_string(), format!("match {} in round 4 not found", match_id));
    }

    #[test]
    fn test_hole_out_of_range_is_invalid() {
        let (mut t, match_id) = tournament_with_singles();
        assert!(apply_hole_result(&mut t, 5, &match_id, 0, None).unwrap_err().is_invalid());
        assert!(apply_hole_result(&mut t, 5, &match_id, 19, None).unwrap_err().is_invalid());
    }

    #[test]
    fn test_pairings_reset_previous_matches() {
        let (mut t, match_id) = tournament_with_singles();
        apply_hole_result(&mut t, 5, &match_id, 3, Some(HoleOutcome::Team1)).unwrap();

        apply_round_pairings(
            &mut t,
            5,
            vec![
                Pairing::new(vec!["e1".into()], vec!["u1".into()]),
                Pairing::new(vec!["e2".into()], vec!["u2".into()]),
            ],
        )
        .unwrap();

        let round = t.round(5).unwrap();
        assert_eq!(round.matches.len(), 2);
        assert!(round.matches.iter().all(|m| m.id != match_id));
        assert!(round.matches.iter().all(|m| m.hole_results.is_empty()));
        assert!(round.matches.iter().all(|m| m.round_number == 5));
    }

    #[test]
    fn test_pairings_for_unknown_round() {
        let mut t = Tournament::new("Cup", "Europe", "USA");
        assert!(apply_round_pairings(&mut t, 6, Vec::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_manual_override_keeps_holes() {
        let (mut t, match_id) = tournament_with_singles();
        apply_hole_result(&mut t, 5, &match_id, 2, Some(HoleOutcome::Team1)).unwrap();
        apply_match_result(&mut t, 5, &match_id, MatchResult::Team2, "3 & 2").unwrap();

        let m = &t.round(5).unwrap().matches[0];
        assert_eq!(m.result, MatchResult::Team2);
        assert_eq!(m.score, "3 & 2");
        assert_eq!(m.hole_results.len(), 2);
    }

    #[test]
    fn test_player_link() {
        let mut t = Tournament::new("Cup", "Europe", "USA");
        t.teams[1].set_roster("USA", &["Scottie".to_string()]);
        let pid = t.teams[1].players[0].id.clone();

        apply_player_link(&mut t, &pid, "scottie@example.com").unwrap();
        assert_eq!(t.find_player(&pid).unwrap().user_email.as_deref(), Some("scottie@example.com"));

        assert!(apply_player_link(&mut t, "nobody", "x@y.z").unwrap_err().is_not_found());
    }
}
