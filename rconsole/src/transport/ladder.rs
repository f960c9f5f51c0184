//! The fallback ladder
// (c) 2026 The rconsole authors

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use super::attach::Attach;
use super::container::ContainerCli;
use super::local_cli::LocalCli;
use super::raw::RawRcon;
use super::stdin::StdinInjection;
use super::{Transport, TransportError};
use crate::channel::{Attempt, ChannelError, Delivery, ServerCommand};
use crate::config::Configuration;

/// How one rung of the ladder went wrong
enum Outcome {
    /// Not available, so never tried
    Skipped(TransportError),
    Failed(TransportError),
}

/// An ordered list of transports, tried best first until one works
pub struct Ladder {
    transports: Vec<Box<dyn Transport>>,
    deadline: Duration,
}

impl std::fmt::Debug for Ladder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ladder")
            .field("transports", &self.names())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Ladder {
    /// The standard five transports, in priority order
    #[must_use]
    pub fn standard(config: &Configuration) -> Self {
        Self::new(
            vec![
                Box::new(ContainerCli::new(config)),
                Box::new(LocalCli::new(config)),
                Box::new(RawRcon::new(config)),
                Box::new(StdinInjection::new(config)),
                Box::new(Attach::new(config)),
            ],
            config.attempt_deadline(),
        )
    }

    /// A custom ladder. `deadline` bounds each rung: its availability check and attempt together.
    #[must_use]
    pub fn new(transports: Vec<Box<dyn Transport>>, deadline: Duration) -> Self {
        Self {
            transports,
            deadline,
        }
    }

    /// Names of the transports, in the order they are tried
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    /// Tries each transport in turn.
    ///
    /// Availability is checked immediately before each attempt, so a transport
    /// further down the ladder costs nothing if an earlier one works.
    /// Failures are logged at debug level and collected for the final error.
    pub async fn deliver(&self, command: &ServerCommand) -> Result<Delivery, ChannelError> {
        let mut attempts = Vec::new();
        let mut any_tried = false;

        for transport in &self.transports {
            let name = transport.name();
            let mut reached_execute = false;
            let outcome = timeout(self.deadline, async {
                if let Err(e) = transport.available().await {
                    return Err(Outcome::Skipped(e));
                }
                reached_execute = true;
                debug!("trying {name}");
                transport.execute(command).await.map_err(Outcome::Failed)
            })
            .await;
            let error = match outcome {
                Ok(Ok(output)) => {
                    let confirmed = transport.confirms_delivery();
                    if confirmed {
                        debug!("delivered via {name}");
                    } else {
                        info!("sent via {name}; the server's response cannot be seen this way");
                    }
                    return Ok(Delivery {
                        transport: name,
                        output,
                        confirmed,
                    });
                }
                Ok(Err(Outcome::Skipped(error))) => {
                    debug!("{name}: {error}");
                    error
                }
                Ok(Err(Outcome::Failed(error))) => {
                    any_tried = true;
                    debug!("{name} failed: {error}");
                    error
                }
                Err(_) => {
                    any_tried |= reached_execute;
                    debug!("{name} timed out after {:?}", self.deadline);
                    TransportError::Timeout(self.deadline)
                }
            };
            attempts.push(Attempt {
                transport: name,
                error,
            });
        }

        if any_tried {
            Err(ChannelError::AllTransportsFailed { attempts })
        } else {
            Err(ChannelError::NoTransportsAvailable { attempts })
        }
    }
}
