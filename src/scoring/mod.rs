pub mod holes;
pub mod match_play;
pub mod scoreboard;

pub use holes::{is_valid_hole, record_hole};
pub use match_play::{HoleTally, calculate_match_play_result};
pub use scoreboard::{calculate_round_score, calculate_scoreboard};
