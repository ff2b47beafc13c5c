use crate::domain::models::{Round, RoundType};

/// Round template for the competition
///
/// Every tournament is created with these five rounds in this order, each
/// without matches. Pairings are assigned later per round.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub number: u32,
    pub name: &'static str,
    pub round_type: RoundType,
    pub points_per_match: f64,
}

impl RoundConfig {
    pub fn new(
        number: u32,
        name: &'static str,
        round_type: RoundType,
        points_per_match: f64,
    ) -> Self {
        Self {
            number,
            name,
            round_type,
            points_per_match,
        }
    }

    pub fn to_round(&self) -> Round {
        Round {
            number: self.number,
            name: self.name.to_string(),
            round_type: self.round_type,
            points_per_match: self.points_per_match,
            matches: Vec::new(),
        }
    }
}

/// Get the fixed list of rounds a tournament is played over
pub fn get_round_configs() -> Vec<RoundConfig> {
    vec![
        RoundConfig::new(1, "Lauderdale", RoundType::Lauderdale, 1.0),
        RoundConfig::new(2, "Foursome (Alternate Shot) - Friday PM", RoundType::Foursome, 0.5),
        RoundConfig::new(3, "Foursome (Alternate Shot) - Saturday AM", RoundType::Foursome, 0.5),
        RoundConfig::new(4, "Four-Ball", RoundType::FourBall, 1.0),
        RoundConfig::new(5, "Singles", RoundType::Singles, 1.0),
    ]
}

pub fn default_rounds() -> Vec<Round> {
    get_round_configs().iter().map(RoundConfig::to_round).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rounds_follow_template() {
        let rounds = default_rounds();

        let numbers: Vec<u32> = rounds.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);

        let points: Vec<f64> = rounds.iter().map(|r| r.points_per_match).collect();
        assert_eq!(points, vec![1.0, 0.5, 0.5, 1.0, 1.0]);

        assert!(rounds.iter().all(|r| r.matches.is_empty()));
        assert_eq!(rounds[3].round_type, RoundType::FourBall);
    }
}
