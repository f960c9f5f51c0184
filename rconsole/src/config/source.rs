//! `KEY=value` configuration files as a figment provider
// (c) 2026 The rconsole authors

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use figment::{Error, Metadata, Profile, Provider, value::Dict, value::Map, value::Value};
use thiserror::Error as ThisError;

/// Prefix on configuration keys. It is optional in files.
pub(crate) const KEY_PREFIX: &str = "RCON_";

/// A syntax error in a configuration file
#[derive(Debug, ThisError, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub(crate) struct SyntaxError {
    line: usize,
    message: &'static str,
}

/// Maps a file or environment key to a [`Configuration`](super::Configuration) field name.
///
/// Keys are case insensitive, the `RCON_` prefix is optional and hyphens count as underscores.
pub(crate) fn field_name(key: &str) -> String {
    let upper = key.trim().to_ascii_uppercase().replace('-', "_");
    upper
        .strip_prefix(KEY_PREFIX)
        .unwrap_or(&upper)
        .to_ascii_lowercase()
}

/// Inverse of [`field_name`], for messages
pub(crate) fn key_name(field: &str) -> String {
    format!("{KEY_PREFIX}{}", field.to_ascii_uppercase())
}

/// Parses a value, stripping and unescaping quotes
fn parse_value(raw: &str, line: usize) -> Result<String, SyntaxError> {
    let raw = raw.trim();
    let err = |message| SyntaxError { line, message };
    if let Some(inner) = raw.strip_prefix('\'') {
        // single quotes: literal, as in sh
        return inner
            .strip_suffix('\'')
            .map(String::from)
            .ok_or_else(|| err("unterminated single quote"));
    }
    if let Some(inner) = raw.strip_prefix('"') {
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(e @ ('"' | '\\' | '$' | '`')) => out.push(e),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(err("unterminated double quote")),
                },
                '"' => {
                    return if chars.as_str().trim().is_empty() {
                        Ok(out)
                    } else {
                        Err(err("unexpected text after closing quote"))
                    };
                }
                c => out.push(c),
            }
        }
        return Err(err("unterminated double quote"));
    }
    Ok(raw.to_owned())
}

/// Renders a value so that [`parse_value`] reads it back unchanged
pub(crate) fn quote_value(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.:/@+,%".contains(c));
    if plain {
        return value.to_owned();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// The parsed contents of one configuration file
#[derive(Debug, Clone)]
pub(crate) struct KeyValueFile {
    path: Option<PathBuf>,
    data: Dict,
}

impl KeyValueFile {
    /// Parses file contents.
    ///
    /// * Blank lines and lines starting with `#` are ignored.
    /// * `export KEY=value` is accepted, so the file can also be sourced by a shell.
    /// * Unquoted values run to the end of the line; there are no trailing comments
    ///   (passwords may contain `#`).
    pub(crate) fn parse(text: &str) -> Result<Self, SyntaxError> {
        let mut data = Dict::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line.strip_prefix("export ").unwrap_or(line);
            let Some((key, value)) = line.split_once('=') else {
                return Err(SyntaxError {
                    line: line_no,
                    message: "expected KEY=value",
                });
            };
            let key = field_name(key);
            if key.is_empty() || key.contains(char::is_whitespace) {
                return Err(SyntaxError {
                    line: line_no,
                    message: "invalid key",
                });
            }
            let value = parse_value(value, line_no)?;
            let _ = data.insert(key, Value::from(value));
        }
        Ok(Self { path: None, data })
    }

    /// Reads and parses a file
    pub(crate) fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let mut parsed = Self::parse(&text).with_context(|| format!("in {}", path.display()))?;
        parsed.path = Some(path.to_path_buf());
        Ok(parsed)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }
}

impl Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        let md = Metadata::named("config file");
        match &self.path {
            Some(p) => md.source(figment::Source::File(p.clone())),
            None => md,
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut profile_map = Map::new();
        let _ = profile_map.insert(Profile::Default, self.data.clone());
        Ok(profile_map)
    }
}

#[cfg(test)]
mod test {
    use super::{KeyValueFile, SyntaxError, field_name, key_name, parse_value, quote_value};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn string_of(f: &KeyValueFile, key: &str) -> Option<String> {
        f.get(key).and_then(|v| v.as_str()).map(String::from)
    }

    #[rstest]
    #[case("RCON_HOST", "host")]
    #[case("rcon_host", "host")]
    #[case("host", "host")]
    #[case("RCON_CONNECT_TIMEOUT", "connect_timeout")]
    #[case("connect-timeout", "connect_timeout")]
    #[case("  RCON_PORT ", "port")]
    fn key_mapping(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(field_name(key), expected);
    }

    #[test]
    fn key_names_for_messages() {
        assert_eq!(key_name("read_timeout"), "RCON_READ_TIMEOUT");
    }

    #[test]
    fn typical_file() {
        let f = KeyValueFile::parse(
            r#"
# RCON settings
RCON_HOST=mc.example.com
export RCON_PORT=25576
RCON_PASSWORD="p@ss word#1"
rcon_container = 'my server'
"#,
        )
        .unwrap();
        assert_eq!(string_of(&f, "host").unwrap(), "mc.example.com");
        assert_eq!(string_of(&f, "port").unwrap(), "25576");
        assert_eq!(string_of(&f, "password").unwrap(), "p@ss word#1");
        assert_eq!(string_of(&f, "container").unwrap(), "my server");
    }

    #[test]
    fn empty_value() {
        let f = KeyValueFile::parse("RCON_PASSWORD=\n").unwrap();
        assert_eq!(string_of(&f, "password").unwrap(), "");
    }

    #[rstest]
    #[case(r#""a \"quoted\" \\ value""#, r#"a "quoted" \ value"#)]
    #[case("'no $escapes\\ here'", "no $escapes\\ here")]
    #[case("  plain#hash  ", "plain#hash")]
    #[case(r#""\$HOME""#, "$HOME")]
    fn values(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(parse_value(raw, 1).unwrap(), expected);
    }

    #[rstest]
    #[case("\"unterminated")]
    #[case("'unterminated")]
    #[case("\"closed\" trailing")]
    fn bad_values(#[case] raw: &str) {
        assert!(parse_value(raw, 1).is_err());
    }

    #[test]
    fn syntax_error_line_number() {
        let e = KeyValueFile::parse("RCON_HOST=a\n\nthis is not valid\n").unwrap_err();
        assert_eq!(
            e,
            SyntaxError {
                line: 3,
                message: "expected KEY=value"
            }
        );
        assert_eq!(e.to_string(), "line 3: expected KEY=value");
    }

    #[rstest]
    #[case("simple")]
    #[case("")]
    #[case("with space")]
    #[case(r#"quote " and \ backslash"#)]
    #[case("dollar $HOME and `tick`")]
    #[case("hash#at#end#")]
    fn quoting_is_reversible(#[case] value: &str) {
        let line = format!("RCON_PASSWORD={}", quote_value(value));
        let f = KeyValueFile::parse(&line).unwrap();
        assert_eq!(string_of(&f, "password").unwrap(), value);
    }
}
