use crate::domain::models::{MatchResult, Round, RoundScore, Scoreboard, Tournament};

pub fn calculate_round_score(round: &Round) -> RoundScore {
    let mut score = RoundScore {
        round_number: round.number,
        round_name: round.name.clone(),
        team1_points: 0.0,
        team2_points: 0.0,
        points_per_match: round.points_per_match,
        matches_played: 0,
        total_matches: round.matches.len(),
    };

    for m in &round.matches {
        match m.result {
            MatchResult::Team1 => score.team1_points += round.points_per_match,
            MatchResult::Team2 => score.team2_points += round.points_per_match,
            MatchResult::Tie => {
                score.team1_points += round.points_per_match / 2.0;
                score.team2_points += round.points_per_match / 2.0;
            }
            MatchResult::Pending => continue,
        }
        score.matches_played += 1;
    }

    score
}

/// Live standings; rounds appear in tournament order
pub fn calculate_scoreboard(tournament: &Tournament) -> Scoreboard {
    let round_scores: Vec<RoundScore> = tournament.rounds.iter().map(calculate_round_score).collect();
    let (team1_name, team2_name) = tournament.team_names();

    Scoreboard {
        team1_name: team1_name.to_string(),
        team2_name: team2_name.to_string(),
        team1_total: round_scores.iter().map(|r| r.team1_points).sum(),
        team2_total: round_scores.iter().map(|r| r.team2_points).sum(),
        round_scores,
    }
}

impl Tournament {
    pub fn scoreboard(&self) -> Scoreboard {
        calculate_scoreboard(self)
    }
}
