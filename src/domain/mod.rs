pub mod models;
pub mod tournament;
pub mod users;

pub use models::*;
pub use tournament::{Pairing, new_id};
pub use users::{AccountStatus, LocalUser, RegisteredUser, email_key};
