//! The attach transport: types into the container's terminal
// (c) 2026 The rconsole authors

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::container::Container;
use super::{Transport, TransportError};
use crate::channel::ServerCommand;
use crate::config::Configuration;
use crate::util::process::run;
use crate::util::shell_quote;

/// Last resort. Pipes the line into `<engine> attach`, bounded by `timeout(1)`.
/// The outcome cannot be observed, so it is always reported as (unconfirmed) success.
#[derive(Debug)]
pub(crate) struct Attach {
    container: Option<Container>,
    timeout_secs: u64,
}

impl Attach {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            container: Container::from_config(config),
            timeout_secs: config.attach_timeout.max(1),
        }
    }

    fn script(&self, container: &Container, command: &ServerCommand) -> String {
        format!(
            "printf '%s\\r' {} | timeout {} {} attach --sig-proxy=false {}",
            command.shell_quoted(),
            self.timeout_secs,
            shell_quote(&container.engine),
            shell_quote(&container.name),
        )
    }
}

#[async_trait]
impl Transport for Attach {
    fn name(&self) -> &'static str {
        "attach"
    }

    fn confirms_delivery(&self) -> bool {
        false
    }

    async fn available(&self) -> Result<(), TransportError> {
        match &self.container {
            Some(c) => c.check_running().await,
            None => Err(TransportError::Config("no container")),
        }
    }

    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError> {
        let Some(container) = &self.container else {
            return Err(TransportError::Config("no container"));
        };
        let mut cmd = Command::new("sh");
        let _ = cmd.args(["-c", &self.script(container, command)]);
        // timeout(1) bounds the attach; this is a backstop in case it is missing
        let bound = Duration::from_secs(self.timeout_secs + 1);
        match tokio::time::timeout(bound, run(cmd)).await {
            Ok(Ok(out)) => debug!("attach finished: {}", out.status),
            Ok(Err(e)) => debug!("attach: {e:#}"),
            Err(_) => debug!("attach abandoned after {bound:?}"),
        }
        Ok(String::new())
    }
}
