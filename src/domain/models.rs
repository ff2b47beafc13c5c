use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::store::codec::{empty_string_as_none, null_as_default};

pub type HoleNumber = u8;

pub const FIRST_HOLE: HoleNumber = 1;
pub const HOLES_PER_MATCH: HoleNumber = 18;

/// Format played in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundType {
    Lauderdale,
    Foursome,
    FourBall,
    Singles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    #[default]
    Pending,
    Team1,
    Team2,
    Tie,
}

impl MatchResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchResult::Pending => "pending",
            MatchResult::Team1 => "team1",
            MatchResult::Team2 => "team2",
            MatchResult::Tie => "tie",
        }
    }
}

impl FromStr for MatchResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MatchResult::Pending),
            "team1" => Ok(MatchResult::Team1),
            "team2" => Ok(MatchResult::Team2),
            "tie" => Ok(MatchResult::Tie),
            other => Err(format!("unknown match result: {other:?}")),
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single played hole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HoleOutcome {
    Team1,
    Team2,
    Halved,
}

impl HoleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            HoleOutcome::Team1 => "team1",
            HoleOutcome::Team2 => "team2",
            HoleOutcome::Halved => "halved",
        }
    }

    /// Parses a hole entry where the empty string means "not played".
    pub fn parse_entry(s: &str) -> Result<Option<Self>, String> {
        if s.is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }
}

impl FromStr for HoleOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team1" => Ok(HoleOutcome::Team1),
            "team2" => Ok(HoleOutcome::Team2),
            "halved" => Ok(HoleOutcome::Halved),
            other => Err(format!("unknown hole outcome: {other:?}")),
        }
    }
}

impl fmt::Display for HoleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse hole-by-hole record of a match. A missing key means the hole has
/// not been played yet.
///
/// Deserialization also accepts the older dense 18-entry list layout, see
/// `store::codec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HoleResults(BTreeMap<HoleNumber, HoleOutcome>);

impl HoleResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hole: HoleNumber) -> Option<HoleOutcome> {
        self.0.get(&hole).copied()
    }

    pub fn set(&mut self, hole: HoleNumber, outcome: HoleOutcome) {
        self.0.insert(hole, outcome);
    }

    pub fn clear(&mut self, hole: HoleNumber) {
        self.0.remove(&hole);
    }

    pub fn is_played(&self, hole: HoleNumber) -> bool {
        self.0.contains_key(&hole)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recorded holes in ascending hole order
    pub fn iter(&self) -> impl Iterator<Item = (HoleNumber, HoleOutcome)> + '_ {
        self.0.iter().map(|(hole, outcome)| (*hole, *outcome))
    }
}

impl FromIterator<(HoleNumber, HoleOutcome)> for HoleResults {
    fn from_iter<I: IntoIterator<Item = (HoleNumber, HoleOutcome)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team_id: String,
    /// Linked account, set by the account-linking flow
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub round_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team1_players: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team2_players: Vec<String>,
    #[serde(default)]
    pub result: MatchResult,
    /// Display score derived from `hole_results`, e.g. "2 & 1", "1 UP", "A/S"
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hole_results: HoleResults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub round_type: RoundType,
    pub points_per_match: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matches: Vec<Match>,
}

impl Round {
    pub fn find_match(&self, match_id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn find_match_mut(&mut self, match_id: &str) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == match_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub name: String,
    pub teams: [Team; 2],
    #[serde(default, deserialize_with = "null_as_default")]
    pub rounds: Vec<Round>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-round slice of the scoreboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundScore {
    pub round_number: u32,
    pub round_name: String,
    pub team1_points: f64,
    pub team2_points: f64,
    pub points_per_match: f64,
    pub matches_played: usize,
    pub total_matches: usize,
}

/// Live standings derived from a tournament; never persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scoreboard {
    pub team1_name: String,
    pub team2_name: String,
    pub team1_total: f64,
    pub team2_total: f64,
    pub round_scores: Vec<RoundScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hole_outcome_entry_parsing() {
        assert_eq!(HoleOutcome::parse_entry(""), Ok(None));
        assert_eq!(HoleOutcome::parse_entry("halved"), Ok(Some(HoleOutcome::Halved)));
        assert!(HoleOutcome::parse_entry("birdie").is_err());
    }

    #[test]
    fn test_match_result_tags() {
        for result in [
            MatchResult::Pending,
            MatchResult::Team1,
            MatchResult::Team2,
            MatchResult::Tie,
        ] {
            assert_eq!(result.as_str().parse::<MatchResult>(), Ok(result));
        }
        assert!("won".parse::<MatchResult>().is_err());
    }

    #[test]
    fn test_hole_results_iterate_in_hole_order() {
        let holes: HoleResults = [
            (12, HoleOutcome::Team2),
            (3, HoleOutcome::Team1),
            (7, HoleOutcome::Halved),
        ]
        .into_iter()
        .collect();

        let order: Vec<HoleNumber> = holes.iter().map(|(hole, _)| hole).collect();
        assert_eq!(order, vec![3, 7, 12]);
    }

    #[test]
    fn test_round_type_wire_names() {
        let json = serde_json::to_string(&RoundType::FourBall).unwrap();
        assert_eq!(json, "\"fourball\"");
        let parsed: RoundType = serde_json::from_str("\"foursome\"").unwrap();
        assert_eq!(parsed, RoundType::Foursome);
    }
}
