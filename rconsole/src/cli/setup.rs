//! `setup`: writes the configuration file
// (c) 2026 The rconsole authors

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use console::Term;
use tracing::info;

use crate::config::{Configuration, Manager, quote_value};

/// Rewrites configuration text, replacing or appending the given keys.
///
/// Comments and unrelated settings are kept.
pub(crate) fn update_config_text(existing: &str, updates: &[(&str, String)]) -> String {
    use crate::config::field_name;

    let mut done = vec![false; updates.len()];
    let mut out = String::with_capacity(existing.len() + 64);
    for line in existing.lines() {
        let trimmed = line.trim_start();
        let assignment = trimmed.strip_prefix("export ").unwrap_or(trimmed);
        let key = (!trimmed.starts_with('#'))
            .then(|| assignment.split_once('='))
            .flatten()
            .map(|(k, _)| field_name(k));
        match key.and_then(|k| updates.iter().position(|(f, _)| *f == k)) {
            Some(i) if !done[i] => {
                out.push_str(&render(updates[i].0, &updates[i].1));
                done[i] = true;
            }
            // a duplicate of a key we have already written
            Some(_) => continue,
            None => out.push_str(line),
        }
        out.push('\n');
    }
    for (i, (field, value)) in updates.iter().enumerate() {
        if !done[i] {
            out.push_str(&render(field, value));
            out.push('\n');
        }
    }
    out
}

fn render(field: &str, value: &str) -> String {
    format!(
        "{}={}",
        crate::config::key_name(field),
        quote_value(value)
    )
}

/// Writes the file, readable only by its owner.
///
/// An existing file is restricted before its old contents are replaced.
pub(crate) fn write_private(path: &Path, contents: &str) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let mut options = std::fs::OpenOptions::new();
    let _ = options.write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt as _;
        let _ = options.mode(0o600);
    }
    let mut f = options
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    // mode() only applies at creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        f.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting {}", path.display()))?;
    }
    f.set_len(0)
        .with_context(|| format!("truncating {}", path.display()))?;
    f.write_all(contents.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// The password held in the configuration files, ignoring the environment
/// and command line
fn stored_password(files: &[PathBuf]) -> String {
    Manager::with_files(files)
        .get::<Configuration>()
        .map(|c| c.password.expose().to_string())
        .unwrap_or_default()
}

fn prompt(term: &Term, question: &str, default: &str) -> Result<String> {
    term.write_str(&format!("{question} [{default}]: "))?;
    let answer = term.read_line()?;
    let answer = answer.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Interactive setup
pub(crate) fn run(manager: &Manager, explicit: Option<&Path>) -> Result<bool> {
    let current = manager
        .configuration()
        .unwrap_or_else(|_| Configuration::system_default().clone());
    let path = explicit.map_or_else(Manager::project_config_file, Path::to_path_buf);
    let term = Term::stderr();

    term.write_line(&format!("Writing RCON settings to {}", path.display()))?;
    let host = prompt(&term, "RCON host", &current.host)?;
    let port = loop {
        let p = prompt(&term, "RCON port", &current.port.to_string())?;
        match p.parse::<u16>() {
            Ok(n) if n != 0 => break n,
            _ => term.write_line("The port must be a number from 1 to 65535.")?,
        }
    };
    term.write_str("RCON password (input hidden; empty keeps the current one): ")?;
    let password = term.read_secure_line()?;
    let password = if password.is_empty() {
        stored_password(&Manager::config_files(explicit))
    } else {
        password
    };

    let existing = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            "# rconsole configuration\n".to_string()
        }
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let text = update_config_text(
        &existing,
        &[
            ("host", host),
            ("port", port.to_string()),
            ("password", password),
        ],
    );
    write_private(&path, &text)?;
    info!("wrote {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::{stored_password, update_config_text, write_private};
    use crate::config::Manager;
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_file() {
        let text = update_config_text(
            "",
            &[
                ("host", "mc.local".into()),
                ("port", "25575".into()),
                ("password", "p@ss word\"$".into()),
            ],
        );
        assert_eq!(
            text,
            "RCON_HOST=mc.local\nRCON_PORT=25575\nRCON_PASSWORD=\"p@ss word\\\"\\$\"\n"
        );
    }

    #[test]
    fn keeps_other_lines() {
        let existing = "# my server\nRCON_CONTAINER=survival\nexport rcon_host=old\nRCON_HOST=dup\n";
        let text = update_config_text(existing, &[("host", "new".into()), ("port", "1".into())]);
        assert_eq!(
            text,
            "# my server\nRCON_CONTAINER=survival\nRCON_HOST=new\nRCON_PORT=1\n"
        );
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("rcon.conf");
        let text = update_config_text(
            "",
            &[
                ("host", "mc.local".into()),
                ("password", "it's a \"secret\" #1".into()),
            ],
        );
        write_private(&path, &text).unwrap();
        let mgr = Manager::with_files(&[path.clone()]);
        assert!(mgr.warnings().is_empty());
        let cfg = mgr.configuration().unwrap();
        assert_eq!(cfg.host, "mc.local");
        assert_eq!(cfg.password.expose(), "it's a \"secret\" #1");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[cfg(unix)]
    #[test]
    fn rewrite_restricts_existing_file() {
        use std::os::unix::fs::PermissionsExt as _;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcon.conf");
        std::fs::write(&path, "RCON_HOST=a.very.long.old.host.name\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();
        write_private(&path, "RCON_PASSWORD=pw\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "RCON_PASSWORD=pw\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn kept_password_comes_from_files_only() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("RCON_PASSWORD", "from-environment");
            let dir = jail.directory().to_path_buf();
            let user = dir.join("user.conf");
            let project = dir.join("project.conf");
            let _ = jail.create_file(&user, "RCON_PASSWORD=from-file\n")?;
            let _ = jail.create_file(&project, "RCON_HOST=mc.local\n")?;
            assert_eq!(stored_password(&[user, project.clone()]), "from-file");
            assert_eq!(stored_password(&[project]), "");
            assert_eq!(stored_password(&[dir.join("missing.conf")]), "");
            Ok(())
        });
    }
}
