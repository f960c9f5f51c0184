//! The raw-rcon transport
// (c) 2026 The rconsole authors

use async_trait::async_trait;

use super::{Transport, TransportError};
use crate::channel::ServerCommand;
use crate::config::{Configuration, Password};
use crate::protocol::{Session, SessionSettings};

/// Speaks RCON directly
#[derive(Debug)]
pub(crate) struct RawRcon {
    host: String,
    port: u16,
    password: Password,
    settings: SessionSettings,
}

impl RawRcon {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            password: config.password.clone(),
            settings: config.session_settings(),
        }
    }
}

#[async_trait]
impl Transport for RawRcon {
    fn name(&self) -> &'static str {
        "raw-rcon"
    }

    fn confirms_delivery(&self) -> bool {
        true
    }

    async fn available(&self) -> Result<(), TransportError> {
        if self.password.is_set() {
            Ok(())
        } else {
            Err(TransportError::Config("no RCON password"))
        }
    }

    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError> {
        self.available().await?;
        let session =
            Session::open(&self.host, self.port, self.password.expose(), self.settings).await?;
        Ok(session.execute(command.text()).await?)
    }
}
