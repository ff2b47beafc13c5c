use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Memory,
    File,
    Remote,
}

impl BackendKind {
    pub fn as_str(&self) -> &str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Remote => "remote",
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            "remote" | "docstore" => Ok(BackendKind::Remote),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub user_agent: &'static str,
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8090".to_string(),
            user_agent: "MatchplayScoring/0.1",
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub remote: RemoteSettings,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            data_dir: PathBuf::from("./data"),
            remote: RemoteSettings::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocServerSettings {
    pub database_path: String,
    pub port: u16,
}

impl Default for DocServerSettings {
    fn default() -> Self {
        Self {
            database_path: "docstore.db".to_string(),
            port: 8090,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub store: StoreSettings,
    pub docserver: DocServerSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `STORE_BACKEND`, `DATA_DIR`, `DOCSTORE_URL`,
    /// `DOCSTORE_TIMEOUT_SECS` and `DATABASE_PATH`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(backend) = lookup("STORE_BACKEND") {
            config.store.backend = backend.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(dir) = lookup("DATA_DIR").filter(|d| !d.is_empty()) {
            config.store.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("DOCSTORE_URL").filter(|u| !u.is_empty()) {
            config.store.remote.base_url = url;
        }
        if let Some(secs) = lookup("DOCSTORE_TIMEOUT_SECS") {
            config.store.remote.timeout_secs = secs
                .parse()
                .map_err(|_| anyhow::anyhow!("DOCSTORE_TIMEOUT_SECS must be a number, got {:?}", secs))?;
        }
        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            config.docserver.database_path = path;
        }

        Ok(config)
    }
}
