pub mod wire;

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::JoydropConfig;

pub struct JoydropServiceApp {
    address: SocketAddr,
    router: Router,
}

impl JoydropServiceApp {
    pub async fn new() -> Result<Self> {
        let config = JoydropConfig::from_env();

        let address: SocketAddr = config
            .server_addr
            .parse()
            .context("invalid joydrop server address")?;

        let router = wire::initialize(&config).await?;

        Ok(Self { address, router })
    }

    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.address)
            .await
            .context("binding joydrop server address")?;

        info!(address = %self.address, "joydrop-core listening");
        axum::serve(listener, self.router)
            .await
            .context("serving HTTP")
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }
}
