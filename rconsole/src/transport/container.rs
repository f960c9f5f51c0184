//! Container plumbing, and the container-cli transport
// (c) 2026 The rconsole authors

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{Transport, TransportError};
use crate::channel::ServerCommand;
use crate::config::Configuration;
use crate::util::process::{ProcessOutput, find_executable, run};
use crate::util::shell_quote;

/// A named container managed by a container engine CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Container {
    pub(crate) engine: String,
    pub(crate) name: String,
}

impl Container {
    /// Returns None if container support is switched off
    pub(crate) fn from_config(config: &Configuration) -> Option<Self> {
        if config.container.is_empty() || config.container_engine.is_empty() {
            return None;
        }
        Some(Self {
            engine: config.container_engine.clone(),
            name: config.container.clone(),
        })
    }

    /// `<engine> inspect` arguments that print `true` for a running container
    pub(crate) fn inspect_args(&self) -> Vec<String> {
        vec![
            "inspect".into(),
            "-f".into(),
            "{{.State.Running}}".into(),
            self.name.clone(),
        ]
    }

    /// `<engine> exec` arguments running `args` inside the container
    pub(crate) fn exec_args<S: AsRef<str>>(&self, args: &[S]) -> Vec<String> {
        let mut v = vec!["exec".to_string(), self.name.clone()];
        v.extend(args.iter().map(|s| s.as_ref().to_string()));
        v
    }

    pub(crate) fn command(&self, args: Vec<String>) -> Command {
        let mut cmd = Command::new(&self.engine);
        let _ = cmd.args(args);
        cmd
    }

    /// Is the engine installed and the container running?
    pub(crate) async fn check_running(&self) -> Result<(), TransportError> {
        if find_executable(&self.engine).is_none() {
            return Err(TransportError::Unavailable(format!(
                "{} is not installed",
                self.engine
            )));
        }
        let out = run(self.command(self.inspect_args())).await?;
        if out.success() && out.stdout.trim() == "true" {
            Ok(())
        } else {
            trace!("inspect {}: {}", self.name, out.failure_summary());
            Err(TransportError::Unavailable(format!(
                "container {} is not running",
                self.name
            )))
        }
    }

    /// Runs a command inside the container
    pub(crate) async fn exec<S: AsRef<str>>(&self, args: &[S]) -> anyhow::Result<ProcessOutput> {
        run(self.command(self.exec_args(args))).await
    }
}

/// Converts an unsuccessful process result into an error
pub(crate) fn check_output(program: &str, out: ProcessOutput) -> Result<String, TransportError> {
    if out.success() {
        Ok(out.stdout)
    } else {
        Err(TransportError::CommandFailed {
            program: program.to_string(),
            status: out.status.to_string(),
            stderr: out.stderr.trim().to_string(),
        })
    }
}

/// Runs the structured-protocol CLI that ships inside the server container
#[derive(Debug)]
pub(crate) struct ContainerCli {
    container: Option<Container>,
    cli: String,
}

impl ContainerCli {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            container: Container::from_config(config),
            cli: config.cli.clone(),
        }
    }

    fn container(&self) -> Result<&Container, TransportError> {
        self.container
            .as_ref()
            .ok_or(TransportError::Config("no container"))
    }
}

#[async_trait]
impl Transport for ContainerCli {
    fn name(&self) -> &'static str {
        "container-cli"
    }

    fn confirms_delivery(&self) -> bool {
        true
    }

    async fn available(&self) -> Result<(), TransportError> {
        let container = self.container()?;
        if self.cli.is_empty() {
            return Err(TransportError::Config("no CLI"));
        }
        container.check_running().await?;
        let lookup = format!("command -v {}", shell_quote(&self.cli));
        let out = container.exec(&["sh", "-c", lookup.as_str()]).await?;
        if out.success() {
            debug!("found {} in {}: {}", self.cli, container.name, out.stdout.trim());
            Ok(())
        } else {
            Err(TransportError::Unavailable(format!(
                "{} not found in container {}",
                self.cli, container.name
            )))
        }
    }

    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError> {
        let container = self.container()?;
        let out = container.exec(&[self.cli.as_str(), command.text()]).await?;
        check_output(&self.cli, out)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use std::path::{Path, PathBuf};

    use super::{Container, ContainerCli, check_output};
    use crate::channel::ServerCommand;
    use crate::config::Configuration;
    use crate::transport::{Transport as _, TransportError};
    use crate::util::process::ProcessOutput;
    use pretty_assertions::assert_eq;

    pub(crate) fn vec_contains<T: PartialEq>(vec: &[T], target: &[T]) -> bool {
        vec.windows(target.len()).any(|w| w == target)
    }

    pub(crate) fn test_container() -> Container {
        Container {
            engine: "docker".into(),
            name: "mc".into(),
        }
    }

    /// Stands in for `docker`. `inspect` reports the container running; `exec`
    /// and `attach` append what they were given to the returned log file.
    /// `exec ... sh -c` succeeds as if the script ran; any other `exec` echoes
    /// its argc and argv, `|`-separated.
    #[cfg(unix)]
    pub(crate) fn fake_engine(dir: &Path) -> (Configuration, PathBuf) {
        use std::os::unix::fs::PermissionsExt as _;
        let script = dir.join("fake-engine");
        std::fs::write(
            &script,
            r##"#!/bin/sh
log="$0.log"
case "$1" in
inspect) echo true ;;
exec)
    shift 2
    printf '%s\n' "$@" >> "$log"
    if [ "$1" = sh ]; then
        echo /usr/local/bin/rcon-cli
    else
        printf '%s' "$#"
        for a in "$@"; do printf '|%s' "$a"; done
    fi ;;
attach)
    printf '%s\n' "$*" >> "$log"
    cat >> "$log" ;;
*) exit 2 ;;
esac
"##,
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let config = Configuration {
            container_engine: script.to_string_lossy().into_owned(),
            container: "mc".into(),
            cli: "rcon-cli".into(),
            ..Configuration::system_default().clone()
        };
        (config, dir.join("fake-engine.log"))
    }

    #[test]
    fn disabled_by_config() {
        let cfg = Configuration {
            container: String::new(),
            ..Configuration::system_default().clone()
        };
        assert_eq!(Container::from_config(&cfg), None);
        let c = Container::from_config(Configuration::system_default()).unwrap();
        assert_eq!(c.name, "minecraft-server");
        assert_eq!(c.engine, "docker");
    }

    #[test]
    fn args() {
        let c = test_container();
        assert_eq!(
            c.inspect_args(),
            vec!["inspect", "-f", "{{.State.Running}}", "mc"]
        );
        let cmd = r#"say "hello world""#;
        let args = c.exec_args(&["rcon-cli", cmd]);
        // The command is one argv element, untouched
        assert_eq!(args, vec!["exec", "mc", "rcon-cli", cmd]);
        assert!(vec_contains(args.as_slice(), &["mc".to_string(), "rcon-cli".to_string()]));
    }

    #[tokio::test]
    async fn unavailable_without_container() {
        let cfg = Configuration {
            container: String::new(),
            ..Configuration::system_default().clone()
        };
        let t = ContainerCli::new(&cfg);
        assert_eq!(t.name(), "container-cli");
        assert!(matches!(
            t.available().await,
            Err(TransportError::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_engine() {
        let c = Container {
            engine: "surely-no-such-container-engine".into(),
            name: "mc".into(),
        };
        let e = c.check_running().await.unwrap_err();
        assert!(e.to_string().contains("not installed"));
    }

    #[cfg(unix)]
    #[test]
    fn failure_carries_stderr() {
        use std::os::unix::process::ExitStatusExt as _;
        let out = ProcessOutput {
            status: std::process::ExitStatus::from_raw(1 << 8),
            stdout: String::new(),
            stderr: "Error: No such container: mc\n".into(),
        };
        let e = check_output("rcon-cli", out).unwrap_err();
        assert!(matches!(e, TransportError::CommandFailed { .. }));
        assert!(e.to_string().ends_with(": Error: No such container: mc"));

        let ok = ProcessOutput {
            status: std::process::ExitStatus::from_raw(0),
            stdout: "There are 0 of a max of 20 players online:\n".into(),
            stderr: String::new(),
        };
        assert_eq!(
            check_output("rcon-cli", ok).unwrap(),
            "There are 0 of a max of 20 players online:\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_cli_in_container() {
        let dir = tempfile::tempdir().unwrap();
        let (config, log) = fake_engine(dir.path());
        let t = ContainerCli::new(&config);
        t.available().await.unwrap();
        let out = t
            .execute(&ServerCommand::new(r#"say "hello""#).unwrap())
            .await
            .unwrap();
        // one argv element, quotes intact
        assert_eq!(out, r#"2|rcon-cli|say "hello""#);
        assert_eq!(
            std::fs::read_to_string(log).unwrap(),
            "sh\n-c\ncommand -v 'rcon-cli'\nrcon-cli\nsay \"hello\"\n"
        );
    }
}
