pub mod rounds;
pub mod settings;

pub use rounds::{default_rounds, get_round_configs};
pub use settings::{AppConfig, BackendKind, DocServerSettings, RemoteSettings, StoreSettings};
