//! Decoding of stored documents.
//!
//! Records written by older releases keep hole results as a dense list of 18
//! strings (index 0 is hole 1, "" is unplayed) and may carry `null` where a
//! list or map was never initialised. Every backend decodes through this
//! module, which upgrades both to the current shape on read.

use anyhow::{Context, Result, bail};
use log::warn;
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::models::{HOLES_PER_MATCH, HoleNumber, HoleOutcome, HoleResults, Tournament};

/// Treats an explicit `null` like an absent field
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Maps `null` and `""` to `None`
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Both layouts `holeResults` has been stored in
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHoleResults {
    Keyed(BTreeMap<String, String>),
    Legacy(Vec<String>),
}

impl StoredHoleResults {
    /// Keeps every well-formed entry. Unplayed entries are dropped silently,
    /// malformed ones with a warning.
    fn into_hole_results(self) -> HoleResults {
        let entries: Vec<(String, String)> = match self {
            StoredHoleResults::Keyed(map) => map.into_iter().collect(),
            StoredHoleResults::Legacy(list) => list
                .into_iter()
                .enumerate()
                .map(|(idx, value)| ((idx + 1).to_string(), value))
                .collect(),
        };

        entries
            .iter()
            .filter_map(|(key, value)| match parse_entry(key, value) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Dropping stored hole entry {:?}: {}", key, e);
                    None
                }
            })
            .collect()
    }
}

fn parse_entry(key: &str, value: &str) -> Result<Option<(HoleNumber, HoleOutcome)>, String> {
    let hole: HoleNumber = key
        .parse()
        .map_err(|_| format!("hole key {key:?} is not a number"))?;
    if !(1..=HOLES_PER_MATCH).contains(&hole) {
        return Err(format!("hole {hole} is outside 1-18"));
    }
    Ok(HoleOutcome::parse_entry(value)?.map(|outcome| (hole, outcome)))
}

impl<'de> Deserialize<'de> for HoleResults {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(StoredHoleResults::deserialize(deserializer)?.into_hole_results())
    }
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8], what: &str) -> Result<T> {
    serde_json::from_slice(bytes).with_context(|| {
        let preview = String::from_utf8_lossy(&bytes[..bytes.len().min(200)]);
        format!("Failed to parse {}. First 200 bytes: {}", what, preview)
    })
}

pub fn decode_value<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T> {
    serde_json::from_value(value).with_context(|| format!("Failed to parse {}", what))
}

pub fn encode<T: Serialize>(data: &T, what: &str) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(data).with_context(|| format!("Failed to serialize {}", what))
}

/// Decodes one tournament document, upgrading older layouts
pub fn decode_tournament(bytes: &[u8]) -> Result<Tournament> {
    let tournament: Tournament = decode(bytes, "tournament")?;
    check_tournament(&tournament)?;
    Ok(tournament)
}

pub fn decode_tournament_value(value: serde_json::Value) -> Result<Tournament> {
    let tournament: Tournament = decode_value(value, "tournament")?;
    check_tournament(&tournament)?;
    Ok(tournament)
}

fn check_tournament(tournament: &Tournament) -> Result<()> {
    if tournament.id.is_empty() {
        bail!("tournament document has an empty id");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MatchResult;

    const LEGACY_DOC: &str = r#"{
        "id": "t-legacy",
        "name": "Old Cup",
        "teams": [
            {"id": "a", "name": "Europe", "players": null},
            {"id": "b", "name": "USA", "players": [
                {"id": "p1", "name": "Scottie", "teamId": "b", "userEmail": ""}
            ]}
        ],
        "rounds": [
            {"number": 1, "name": "Lauderdale", "type": "lauderdale", "pointsPerMatch": 1,
             "matches": null},
            {"number": 5, "name": "Singles", "type": "singles", "pointsPerMatch": 1,
             "matches": [
                {"id": "m1", "roundNumber": 5, "team1Players": ["x"], "team2Players": ["p1"],
                 "result": "pending", "score": "Europe 1 UP thru 3",
                 "holeResults": ["team1", "", "halved", "team2", "", "", "", "", "",
                                 "", "", "", "", "", "", "", "", ""]},
                {"id": "m2", "roundNumber": 5, "team1Players": null, "team2Players": null,
                 "result": "pending", "score": "", "holeResults": null}
             ]}
        ],
        "createdAt": "2025-03-01T10:00:00Z",
        "updatedAt": "2025-03-02T10:00:00Z"
    }"#;

    #[test]
    fn test_legacy_list_becomes_sparse_map() {
        let t = decode_tournament(LEGACY_DOC.as_bytes()).unwrap();
        let holes = &t.rounds[1].matches[0].hole_results;

        let recorded: Vec<(HoleNumber, HoleOutcome)> = holes.iter().collect();
        assert_eq!(
            recorded,
            vec![
                (1, HoleOutcome::Team1),
                (3, HoleOutcome::Halved),
                (4, HoleOutcome::Team2)
            ]
        );
    }

    #[test]
    fn test_missing_collections_become_empty() {
        let t = decode_tournament(LEGACY_DOC.as_bytes()).unwrap();

        assert!(t.teams[0].players.is_empty());
        assert!(t.rounds[0].matches.is_empty());
        let m2 = &t.rounds[1].matches[1];
        assert!(m2.team1_players.is_empty());
        assert!(m2.hole_results.is_empty());
        assert_eq!(m2.result, MatchResult::Pending);
        assert!(t.teams[1].players[0].user_email.is_none());
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let first = decode_tournament(LEGACY_DOC.as_bytes()).unwrap();
        let bytes = encode(&first, "tournament").unwrap();
        let second = decode_tournament(&bytes).unwrap();

        assert_eq!(first, second);
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            json["rounds"][1]["matches"][0]["holeResults"],
            serde_json::json!({"1": "team1", "3": "halved", "4": "team2"})
        );
    }

    #[test]
    fn test_keyed_map_skips_empty_entries() {
        let holes: HoleResults =
            serde_json::from_str(r#"{"2": "team2", "7": "", "18": "halved"}"#).unwrap();
        assert_eq!(holes.len(), 2);
        assert_eq!(holes.get(18), Some(HoleOutcome::Halved));
    }

    #[test]
    fn test_bad_hole_entries_are_dropped() {
        let holes: HoleResults =
            serde_json::from_str(r#"{"19": "team1", "one": "team2", "4": "eagle", "5": "team2"}"#)
                .unwrap();
        let recorded: Vec<(HoleNumber, HoleOutcome)> = holes.iter().collect();
        assert_eq!(recorded, vec![(5, HoleOutcome::Team2)]);

        let mut long = vec![""; 19];
        long[0] = "team1";
        long[18] = "team2";
        let holes: HoleResults = serde_json::from_str(&serde_json::to_string(&long).unwrap()).unwrap();
        assert_eq!(holes.len(), 1);
        assert_eq!(holes.get(1), Some(HoleOutcome::Team1));
    }

    #[test]
    fn test_tournament_with_bad_hole_entry_still_decodes() {
        let doc = LEGACY_DOC.replacen(r#"["team1", "","#, r#"["team1", "bogey","#, 1);
        let t = decode_tournament(doc.as_bytes()).unwrap();
        assert_eq!(t.rounds[1].matches[0].hole_results.len(), 3);
    }

    #[test]
    fn test_rejects_hole_results_of_wrong_shape() {
        assert!(serde_json::from_str::<HoleResults>("42").is_err());
        assert!(serde_json::from_str::<HoleResults>("[1, 2]").is_err());
    }

    #[test]
    fn test_round_trip_of_fresh_tournament() {
        let t = Tournament::new("Cup", "Europe", "USA");
        let decoded = decode_tournament(&encode(&t, "tournament").unwrap()).unwrap();
        assert_eq!(t, decoded);
    }

    #[test]
    fn test_rejects_documents_without_two_teams() {
        let doc = r#"{"id":"t","name":"n","teams":[{"id":"a","name":"A"}],"rounds":[],
            "createdAt":"2025-03-01T10:00:00Z","updatedAt":"2025-03-01T10:00:00Z"}"#;
        assert!(decode_tournament(doc.as_bytes()).is_err());
    }
}
