//! The local-cli transport
// (c) 2026 The rconsole authors

use async_trait::async_trait;
use tokio::process::Command;

use super::container::check_output;
use super::{Transport, TransportError};
use crate::channel::ServerCommand;
use crate::config::{Configuration, Password};
use crate::util::process::{find_executable, run};

/// Environment variable through which the CLI receives the password
const PASSWORD_ENV: &str = "RCON_PASSWORD";

/// Runs a structured-protocol CLI installed on this host against the RCON port
#[derive(Debug)]
pub(crate) struct LocalCli {
    cli: String,
    host: String,
    port: u16,
    password: Password,
}

impl LocalCli {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            cli: config.cli.clone(),
            host: config.host.clone(),
            port: config.port,
            password: config.password.clone(),
        }
    }

    /// The password goes in the child's environment so it never shows up in `ps`.
    fn command(&self, command: &ServerCommand) -> Command {
        let mut cmd = Command::new(&self.cli);
        let _ = cmd
            .args(["--host", &self.host, "--port", &self.port.to_string()])
            .arg(command.text())
            .env(PASSWORD_ENV, self.password.expose());
        cmd
    }
}

#[async_trait]
impl Transport for LocalCli {
    fn name(&self) -> &'static str {
        "local-cli"
    }

    fn confirms_delivery(&self) -> bool {
        true
    }

    async fn available(&self) -> Result<(), TransportError> {
        if self.cli.is_empty() {
            return Err(TransportError::Config("no CLI"));
        }
        if !self.password.is_set() {
            return Err(TransportError::Config("no RCON password"));
        }
        if find_executable(&self.cli).is_none() {
            return Err(TransportError::Unavailable(format!(
                "{} is not installed",
                self.cli
            )));
        }
        Ok(())
    }

    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError> {
        let out = run(self.command(command)).await?;
        check_output(&self.cli, out)
    }
}
