//! The stdin transport: writes a line to the server console
// (c) 2026 The rconsole authors

use async_trait::async_trait;
use tokio::io::AsyncWriteExt as _;
use tokio::process::Command;
use tracing::debug;

use super::container::{Container, check_output};
use super::{Transport, TransportError};
use crate::channel::ServerCommand;
use crate::config::Configuration;
use crate::util::process::{find_executable, run};

/// Where the line goes
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    /// PID 1 inside the container, which is the server in the usual images
    Container,
    /// A process on this host
    Host(u32),
}

/// Injects command lines into the server's standard input.
/// There is no way to read a reply.
#[derive(Debug)]
pub(crate) struct StdinInjection {
    container: Option<Container>,
    server_process: String,
}

/// Shell snippet, run inside the container, that writes one line to PID 1's stdin
fn container_script(command: &ServerCommand) -> String {
    format!(
        "printf '%s\\n' {} > /proc/1/fd/0",
        command.shell_quoted()
    )
}

/// First PID from `pgrep` output that isn't us
fn first_pid(pgrep_output: &str, own_pid: u32) -> Option<u32> {
    pgrep_output
        .lines()
        .filter_map(|l| l.trim().parse::<u32>().ok())
        .find(|pid| *pid != own_pid)
}

impl StdinInjection {
    pub(crate) fn new(config: &Configuration) -> Self {
        Self {
            container: Container::from_config(config),
            server_process: config.server_process.clone(),
        }
    }

    async fn find_host_process(&self) -> Result<u32, TransportError> {
        if self.server_process.is_empty() {
            return Err(TransportError::Config("no server process pattern"));
        }
        if find_executable("pgrep").is_none() {
            return Err(TransportError::Unavailable("pgrep is not installed".into()));
        }
        let mut cmd = Command::new("pgrep");
        let _ = cmd.args(["-f", &self.server_process]);
        let out = run(cmd).await?;
        first_pid(&out.stdout, std::process::id()).ok_or_else(|| {
            TransportError::Unavailable(format!(
                "no process matching {:?}",
                self.server_process
            ))
        })
    }

    /// Works out where to write, preferring the container
    async fn target(&self) -> Result<Target, TransportError> {
        let container_result = match &self.container {
            Some(c) => match c.check_running().await {
                Ok(()) => return Ok(Target::Container),
                Err(e) => Some(e),
            },
            None => None,
        };
        match self.find_host_process().await {
            Ok(pid) => Ok(Target::Host(pid)),
            Err(host_err) => match container_result {
                Some(e) => Err(TransportError::Unavailable(format!("{e}; {host_err}"))),
                None => Err(host_err),
            },
        }
    }
}

#[async_trait]
impl Transport for StdinInjection {
    fn name(&self) -> &'static str {
        "stdin"
    }

    fn confirms_delivery(&self) -> bool {
        false
    }

    async fn available(&self) -> Result<(), TransportError> {
        self.target().await.map(|_| ())
    }

    async fn execute(&self, command: &ServerCommand) -> Result<String, TransportError> {
        match self.target().await? {
            Target::Container => {
                let Some(container) = &self.container else {
                    return Err(TransportError::Config("no container"));
                };
                let script = container_script(command);
                let out = container.exec(&["sh", "-c", script.as_str()]).await?;
                let _ = check_output(&container.engine, out)?;
            }
            Target::Host(pid) => {
                let path = format!("/proc/{pid}/fd/0");
                debug!("writing to {path}");
                let mut f = tokio::fs::OpenOptions::new()
                    .write(true)
                    .open(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("opening {path}: {e}"))?;
                let line = format!("{}\n", command.text());
                f.write_all(line.as_bytes())
                    .await
                    .map_err(|e| anyhow::anyhow!("writing to {path}: {e}"))?;
                f.flush()
                    .await
                    .map_err(|e| anyhow::anyhow!("writing to {path}: {e}"))?;
            }
        }
        Ok(String::new())
    }
}

#[cfg(test)]
mod test {
    use super::{StdinInjection, container_script, first_pid};
    use crate::channel::ServerCommand;
    use crate::config::Configuration;
    #[cfg(unix)]
    use crate::transport::container::test::fake_engine;
    use crate::transport::{Transport as _, TransportError};
    use pretty_assertions::assert_eq;

    #[test]
    fn script_quotes_the_command() {
        let cmd = ServerCommand::new(r#"say "hello" it's"#).unwrap();
        assert_eq!(
            container_script(&cmd),
            r#"printf '%s\n' 'say "hello" it'\''s' > /proc/1/fd/0"#
        );
    }

    #[cfg(unix)]
    #[test]
    fn script_output_is_exact() {
        // Run the script with the redirect swapped for stdout
        let cmd = ServerCommand::new(r#"say "hi" $HOME `x` it's"#).unwrap();
        let script = container_script(&cmd).replace(" > /proc/1/fd/0", "");
        let out = std::process::Command::new("sh")
            .args(["-c", &script])
            .output()
            .unwrap();
        assert_eq!(
            String::from_utf8(out.stdout).unwrap(),
            "say \"hi\" $HOME `x` it's\n"
        );
    }

    #[test]
    fn pid_selection() {
        assert_eq!(first_pid("123\n456\n", 999), Some(123));
        assert_eq!(first_pid("123\n456\n", 123), Some(456));
        assert_eq!(first_pid("123\n", 123), None);
        assert_eq!(first_pid("", 1), None);
        assert_eq!(first_pid("junk\n77\n", 1), Some(77));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn container_injection_writes_to_pid_1() {
        let dir = tempfile::tempdir().unwrap();
        let (config, log) = fake_engine(dir.path());
        let t = StdinInjection::new(&config);
        t.available().await.unwrap();
        let cmd = ServerCommand::new(r#"say "hello""#).unwrap();
        assert_eq!(t.execute(&cmd).await.unwrap(), "");
        assert_eq!(
            std::fs::read_to_string(log).unwrap(),
            "sh\n-c\nprintf '%s\\n' 'say \"hello\"' > /proc/1/fd/0\n"
        );
    }

    #[tokio::test]
    async fn nothing_addressable() {
        let cfg = Configuration {
            container: String::new(),
            server_process: String::new(),
            ..Configuration::system_default().clone()
        };
        let t = StdinInjection::new(&cfg);
        assert!(!t.confirms_delivery());
        assert!(matches!(t.available().await, Err(TransportError::Config(_))));
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn host_injection_reaches_process_stdin() {
        use std::process::Stdio;
        use tokio::io::AsyncReadExt as _;

        let dir = tempfile::tempdir().unwrap();
        let fifo = dir.path().join("console");
        assert!(
            std::process::Command::new("mkfifo")
                .arg(&fifo)
                .status()
                .unwrap()
                .success()
        );
        let marker = format!("rconsole-stdin-test-{}", std::process::id());
        // A stand-in server whose stdin is the fifo; it copies one line to stdout.
        let script = format!("exec 0<'{}'; read -r line; echo \"$line\" # {marker}", fifo.display());
        let mut child = tokio::process::Command::new("sh")
            .args(["-c", &script])
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();
        // Hold the write end open so the reader's open completes
        let _writer = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&fifo)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;

        let cfg = Configuration {
            container: String::new(),
            server_process: marker,
            ..Configuration::system_default().clone()
        };
        let t = StdinInjection::new(&cfg);
        let cmd = ServerCommand::new("say injected").unwrap();
        let out = t.execute(&cmd).await.unwrap();
        assert_eq!(out, "");

        let mut stdout = child.stdout.take().unwrap();
        let mut got = String::new();
        let _ = stdout.read_to_string(&mut got).await.unwrap();
        assert_eq!(got, "say injected\n");
        let _ = child.wait().await;
    }
}
