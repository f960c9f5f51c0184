//! CLI based tests
// (c) 2026 The rconsole authors
use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rconsole::main as rconsole_main;

use rusty_fork::rusty_fork_test;

fn packet(id: i32, kind: i32, body: &str) -> Vec<u8> {
    let size = i32::try_from(body.len() + 10).unwrap();
    let mut v = Vec::new();
    v.extend_from_slice(&size.to_le_bytes());
    v.extend_from_slice(&id.to_le_bytes());
    v.extend_from_slice(&kind.to_le_bytes());
    v.extend_from_slice(body.as_bytes());
    v.extend_from_slice(&[0, 0]);
    v
}

fn read_packet(s: &mut impl std::io::Read) -> (i32, i32, String) {
    let mut size = [0u8; 4];
    s.read_exact(&mut size).unwrap();
    let mut rest = vec![0u8; usize::try_from(i32::from_le_bytes(size)).unwrap()];
    s.read_exact(&mut rest).unwrap();
    let id = i32::from_le_bytes(rest[0..4].try_into().unwrap());
    let kind = i32::from_le_bytes(rest[4..8].try_into().unwrap());
    let body = String::from_utf8_lossy(&rest[8..rest.len() - 2]).into_owned();
    (id, kind, body)
}

/// A one-shot RCON server that accepts `password` and answers one command.
/// The thread returns the command it received.
fn fake_server(password: &'static str) -> (u16, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = std::thread::spawn(move || {
        let (mut s, _) = listener.accept().unwrap();
        let (id, kind, body) = read_packet(&mut s);
        assert_eq!(kind, 3);
        assert_eq!(body, password);
        s.write_all(&packet(id, 2, "")).unwrap();
        let (id, kind, command) = read_packet(&mut s);
        assert_eq!(kind, 2);
        s.write_all(&packet(id, 0, "There are 0 of a max of 20 players online:"))
            .unwrap();
        // Hold the connection until the client is done
        let mut sink = Vec::new();
        let _ = s.read_to_end(&mut sink);
        command
    });
    (port, handle)
}

/// Writes a configuration that disables every transport except direct RCON
fn rcon_only_config(dir: &Path, port: u16) -> PathBuf {
    let path = dir.join("rcon.conf");
    std::fs::write(
        &path,
        format!(
            "RCON_HOST=127.0.0.1\nRCON_PORT={port}\nRCON_PASSWORD='s3cret'\n\
             RCON_CONTAINER=\nRCON_CLI=\nRCON_SERVER_PROCESS=\n\
             RCON_CONNECT_TIMEOUT=2\nRCON_READ_TIMEOUT=2\n"
        ),
    )
    .unwrap();
    path
}

#[test]
fn bad_option() {
    assert_eq!(
        rconsole_main(["rconsole", "--this-ridiculous-option-does-not-exist"]),
        ExitCode::FAILURE
    );
}

#[test]
fn help() {
    assert_eq!(rconsole_main(["rconsole", "--help"]), ExitCode::SUCCESS);
}

rusty_fork_test! {

#[test]
fn show_config_files() {
    assert_eq!(rconsole_main(["rconsole", "config-files"]), ExitCode::SUCCESS);
}

#[test]
fn show_config() {
    let dir = tempfile::tempdir().unwrap();
    let conf = rcon_only_config(dir.path(), 25575);
    let conf = conf.to_str().unwrap();
    assert_eq!(
        rconsole_main(["rconsole", "--config", conf, "show-config"]),
        ExitCode::SUCCESS
    );
}

#[test]
fn command_via_rcon() {
    let (port, server) = fake_server("s3cret");
    let dir = tempfile::tempdir().unwrap();
    let conf = rcon_only_config(dir.path(), port);
    let conf = conf.to_str().unwrap();
    assert_eq!(
        rconsole_main(["rconsole", "--config", conf, "command", "list"]),
        ExitCode::SUCCESS
    );
    assert_eq!(server.join().unwrap(), "list");
}

#[test]
fn test_action_sends_list() {
    let (port, server) = fake_server("s3cret");
    let dir = tempfile::tempdir().unwrap();
    let conf = rcon_only_config(dir.path(), port);
    let conf = conf.to_str().unwrap();
    assert_eq!(
        rconsole_main(["rconsole", "--config", conf, "test"]),
        ExitCode::SUCCESS
    );
    assert_eq!(server.join().unwrap(), "list");
}

#[test]
fn nothing_works() {
    // Bind then drop, so nothing is listening on the port
    let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let dir = tempfile::tempdir().unwrap();
    let conf = rcon_only_config(dir.path(), port);
    let conf = conf.to_str().unwrap();
    assert_eq!(
        rconsole_main(["rconsole", "--config", conf, "command", "say", "hello"]),
        ExitCode::FAILURE
    );
}

#[test]
fn invalid_command_fails() {
    let dir = tempfile::tempdir().unwrap();
    let conf = rcon_only_config(dir.path(), 25575);
    let conf = conf.to_str().unwrap();
    assert_eq!(
        rconsole_main(["rconsole", "--config", conf, "command", "   "]),
        ExitCode::FAILURE
    );
}

}
