use anyhow::{Context, Result};
use log::{error, info};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::TcpListener;

use crate::config::DocServerSettings;
use crate::docserver::{open_state, routes::create_app};

/// Runs the document server
pub struct ServerService {
    host: IpAddr,
    settings: DocServerSettings,
}

impl ServerService {
    pub fn new(settings: DocServerSettings) -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            settings,
        }
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    /// Serves until the process is stopped
    pub async fn run(&self) -> Result<()> {
        let (listener, app) = self.bind().await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Binds and serves on a background task. Port 0 picks a free port; the
    /// returned address is the one actually bound.
    pub async fn spawn(&self) -> Result<SocketAddr> {
        let (listener, app) = self.bind().await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Document server on {} stopped: {}", addr, e);
            }
        });

        Ok(addr)
    }

    async fn bind(&self) -> Result<(TcpListener, axum::Router)> {
        let state = open_state(&self.settings.database_path)?;
        info!("Document database: {}", self.settings.database_path);

        let addr = SocketAddr::new(self.host, self.settings.port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("Document server listening on {}", listener.local_addr()?);

        Ok((listener, create_app(state)))
    }
}
