use chrono::Utc;
use uuid::Uuid;

use super::models::{Match, MatchResult, Player, Round, Team, Tournament};
use crate::config::rounds::default_rounds;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Caller-supplied sides for one match of a round
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pairing {
    pub team1_players: Vec<String>,
    pub team2_players: Vec<String>,
}

impl Pairing {
    pub fn new(team1_players: Vec<String>, team2_players: Vec<String>) -> Self {
        Self {
            team1_players,
            team2_players,
        }
    }

    /// Fresh, unplayed match for `round_number`
    pub fn into_match(self, round_number: u32) -> Match {
        Match {
            id: new_id(),
            round_number,
            team1_players: self.team1_players,
            team2_players: self.team2_players,
            result: MatchResult::Pending,
            score: String::new(),
            hole_results: Default::default(),
        }
    }
}

impl Team {
    pub fn new(name: &str) -> Self {
        Self {
            id: new_id(),
            name: name.to_string(),
            players: Vec::new(),
        }
    }

    /// Renames the team and replaces its players.
    ///
    /// The player at each position keeps its id and linked account from the
    /// previous roster; positions past the old roster get new ids.
    pub fn set_roster(&mut self, name: &str, player_names: &[String]) {
        let players = player_names
            .iter()
            .enumerate()
            .map(|(idx, player_name)| {
                let previous = self.players.get(idx);
                Player {
                    id: previous.map(|p| p.id.clone()).unwrap_or_else(new_id),
                    name: player_name.clone(),
                    team_id: self.id.clone(),
                    user_email: previous.and_then(|p| p.user_email.clone()),
                }
            })
            .collect();

        self.name = name.to_string();
        self.players = players;
    }
}

impl Tournament {
    /// New tournament with two empty teams and the standard five rounds
    pub fn new(name: &str, team1_name: &str, team2_name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.to_string(),
            teams: [Team::new(team1_name), Team::new(team2_name)],
            rounds: default_rounds(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn team_names(&self) -> (&str, &str) {
        (self.teams[0].name.as_str(), self.teams[1].name.as_str())
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn round_mut(&mut self, number: u32) -> Option<&mut Round> {
        self.rounds.iter_mut().find(|r| r.number == number)
    }

    pub fn find_player(&self, player_id: &str) -> Option<&Player> {
        self.teams
            .iter()
            .flat_map(|t| t.players.iter())
            .find(|p| p.id == player_id)
    }

    pub fn find_player_mut(&mut self, player_id: &str) -> Option<&mut Player> {
        self.teams
            .iter_mut()
            .flat_map(|t| t.players.iter_mut())
            .find(|p| p.id == player_id)
    }

    pub fn match_count(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }

    /// Whether the account `email` is linked to a player on either side of
    /// the given match. Emails compare case-insensitively.
    pub fn player_in_match(&self, round_number: u32, match_id: &str, email: &str) -> bool {
        let Some(m) = self.round(round_number).and_then(|r| r.find_match(match_id)) else {
            return false;
        };

        m.team1_players
            .iter()
            .chain(m.team2_players.iter())
            .filter_map(|pid| self.find_player(pid))
            .filter_map(|p| p.user_email.as_deref())
            .any(|linked| linked.eq_ignore_ascii_case(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_tournament_shape() {
        let t = Tournament::new("Cup", "Europe", "USA");

        assert_eq!(t.team_names(), ("Europe", "USA"));
        assert_ne!(t.teams[0].id, t.teams[1].id);
        assert_eq!(t.rounds.len(), 5);
        assert_eq!(t.match_count(), 0);
        assert_eq!(t.created_at, t.updated_at);
    }

    #[test]
    fn test_set_roster_keeps_ids_by_position() {
        let mut team = Team::new("Europe");
        team.set_roster("Europe", &names(&["Rory", "Jon"]));
        let first_id = team.players[0].id.clone();
        team.players[0].user_email = Some("rory@example.com".to_string());

        team.set_roster("Team Europe", &names(&["Rory M", "Jon", "Viktor"]));

        assert_eq!(team.name, "Team Europe");
        assert_eq!(team.players.len(), 3);
        assert_eq!(team.players[0].id, first_id);
        assert_eq!(team.players[0].name, "Rory M");
        assert_eq!(team.players[0].user_email.as_deref(), Some("rory@example.com"));
        assert!(team.players[2].user_email.is_none());
        assert!(team.players.iter().all(|p| p.team_id == team.id));
    }

    #[test]
    fn test_set_roster_can_shrink() {
        let mut team = Team::new("USA");
        team.set_roster("USA", &names(&["Scottie", "Xander", "Collin"]));
        team.set_roster("USA", &names(&["Scottie"]));
        assert_eq!(team.players.len(), 1);
    }

    #[test]
    fn test_player_in_match() {
        let mut t = Tournament::new("Cup", "Europe", "USA");
        t.teams[0].set_roster("Europe", &names(&["Rory"]));
        t.teams[1].set_roster("USA", &names(&["Scottie"]));
        t.teams[1].players[0].user_email = Some("Scottie@Example.com".to_string());

        let m = Pairing::new(
            vec![t.teams[0].players[0].id.clone()],
            vec![t.teams[1].players[0].id.clone()],
        )
        .into_match(5);
        let match_id = m.id.clone();
        t.round_mut(5).unwrap().matches.push(m);

        assert!(t.player_in_match(5, &match_id, "scottie@example.com"));
        assert!(!t.player_in_match(5, &match_id, "rory@example.com"));
        assert!(!t.player_in_match(4, &match_id, "scottie@example.com"));
    }

    #[test]
    fn test_pairing_builds_pending_match() {
        let m = Pairing::new(names(&["a", "b"]), names(&["c", "d"])).into_match(2);
        assert_eq!(m.round_number, 2);
        assert_eq!(m.result, MatchResult::Pending);
        assert!(m.score.is_empty());
        assert!(m.hole_results.is_empty());
    }
}
