//! Terminal rendering for the `list` and `scoreboard` commands.
//!
//! Pure formatting; the handlers in `lib.rs` load the data.

use colored::Colorize;

use crate::domain::models::{Scoreboard, Tournament};

/// "2" for whole points, "2.5" otherwise
pub fn format_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{:.0}", points)
    } else {
        format!("{:.1}", points)
    }
}

pub fn render_scoreboard(scoreboard: &Scoreboard) -> String {
    let team1 = &scoreboard.team1_name;
    let team2 = &scoreboard.team2_name;
    let (team1_label, team2_label) = if scoreboard.team1_total > scoreboard.team2_total {
        (team1.bold().green(), team2.normal())
    } else if scoreboard.team2_total > scoreboard.team1_total {
        (team1.normal(), team2.bold().green())
    } else {
        (team1.bold(), team2.bold())
    };

    let mut out = String::new();
    out.push_str(&format!(
        "{} {} - {} {}\n",
        team1_label,
        format_points(scoreboard.team1_total),
        format_points(scoreboard.team2_total),
        team2_label
    ));

    for round in &scoreboard.round_scores {
        let progress = format!("{}/{} played", round.matches_played, round.total_matches);
        out.push_str(&format!(
            "  {:>2}. {:<42} {:>4} - {:<4} {}\n",
            round.round_number,
            round.round_name,
            format_points(round.team1_points),
            format_points(round.team2_points),
            progress.dimmed()
        ));
    }
    out
}

pub fn render_tournament_list(tournaments: &[Tournament]) -> String {
    if tournaments.is_empty() {
        return "No tournaments found\n".to_string();
    }

    let mut out = String::new();
    for t in tournaments {
        let (team1, team2) = t.team_names();
        out.push_str(&format!(
            "{}  {} ({} vs {}, {} matches, updated {})\n",
            t.id.cyan(),
            t.name.bold(),
            team1,
            team2,
            t.match_count(),
            t.updated_at.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_points() {
        assert_eq!(format_points(0.0), "0");
        assert_eq!(format_points(2.0), "2");
        assert_eq!(format_points(2.5), "2.5");
    }

    #[test]
    fn test_render_scoreboard() {
        plain();
        let t = Tournament::new("Cup", "Europe", "USA");
        let out = render_scoreboard(&t.scoreboard());

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Europe 0 - 0 USA");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("Lauderdale"));
        assert!(lines[1].ends_with("0/0 played"));
    }

    #[test]
    fn test_render_empty_list() {
        plain();
        assert_eq!(render_tournament_list(&[]), "No tournaments found\n");
    }

    #[test]
    fn test_render_list_line() {
        plain();
        let t = Tournament::new("Cup", "Europe", "USA");
        let out = render_tournament_list(std::slice::from_ref(&t));
        assert!(out.starts_with(&t.id));
        assert!(out.contains("Cup (Europe vs USA, 0 matches"));
    }
}
