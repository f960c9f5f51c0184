//! POSIX shell quoting
// (c) 2026 The rconsole authors

/// Quotes a string so that `sh` reads it back as a single word with the
/// same contents.
///
/// The whole string goes in single quotes; embedded single quotes become `'\''`.
pub(crate) fn shell_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod test {
    use super::shell_quote;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn simple() {
        assert_eq!(shell_quote("list"), "'list'");
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[cfg(unix)]
    #[rstest]
    #[case("list")]
    #[case(r#"say "hello""#)]
    #[case("say it's $HOME `whoami` \\ done")]
    #[case("tellraw @a {\"text\":\"hi; rm -rf /\"}")]
    #[case("'''")]
    #[case("")]
    fn shell_reads_it_back(#[case] input: &str) {
        let script = format!("printf '%s' {}", shell_quote(input));
        let out = std::process::Command::new("sh")
            .args(["-c", &script])
            .output()
            .unwrap();
        assert!(out.status.success());
        assert_eq!(String::from_utf8(out.stdout).unwrap(), input);
    }
}
