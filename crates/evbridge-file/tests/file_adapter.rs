#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! File adapter tests: streams, files on disk, and the binary over stdio.

use std::io::{BufRead, BufReader, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use evbridge_core::codec::{decode_json, encode_json};
use evbridge_core::testing::make_event;
use evbridge_core::Adapter;
use evbridge_file::{FileReceiverFactory, FileSenderFactory, FileTransport};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn stream_round_trip_preserves_content_and_order() {
    let (mut in_write, in_read) = tokio::io::duplex(4096);
    let (out_write, out_read) = tokio::io::duplex(4096);
    let mut adapter = Adapter::from_transports(
        Box::new(FileTransport::reading(in_read)),
        Box::new(FileTransport::writing(out_write)),
    );
    let run = tokio::spawn(async move { adapter.run(CancellationToken::new()).await });

    let mut out = tokio::io::BufReader::new(out_read);
    for v in ["a", "b", "c"] {
        let sent = make_event(v);
        let mut line = encode_json(&sent).unwrap();
        line.push(b'\n');
        in_write.write_all(&line).await.unwrap();

        let mut received = String::new();
        tokio::time::timeout(TIMEOUT, out.read_line(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(decode_json(received.as_bytes()).unwrap(), sent);
    }

    drop(in_write);
    tokio::time::timeout(TIMEOUT, run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn file_to_file_runs_to_end_of_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.ndjson");
    let output = dir.path().join("out.ndjson");

    let events: Vec<_> = ["a", "b", "c"].into_iter().map(make_event).collect();
    let mut content = Vec::new();
    for e in &events {
        content.extend_from_slice(&encode_json(e).unwrap());
        content.push(b'\n');
    }
    std::fs::write(&input, content).unwrap();

    let mut adapter = Adapter::new(
        &FileReceiverFactory {
            input: input.display().to_string(),
        },
        &FileSenderFactory {
            output: output.display().to_string(),
        },
    )
    .unwrap();
    adapter.run(CancellationToken::new()).await.unwrap();
    drop(adapter);

    let written = std::fs::read(&output).unwrap();
    let decoded: Vec<_> = written
        .split(|&c| c == b'\n')
        .filter(|l| !l.is_empty())
        .map(|l| decode_json(l).unwrap())
        .collect();
    assert_eq!(decoded, events);
}

#[test]
fn binary_relays_stdin_to_stdout() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_evbridge-file"))
        .arg("--debug")
        .env("ADAPTER_RECEIVER", r#"{"input":"stdin"}"#)
        .env("ADAPTER_SENDER", r#"{"output":"stdout"}"#)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let mut stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    for v in ["a", "b", "c"] {
        let sent = make_event(v);
        let mut line = encode_json(&sent).unwrap();
        line.push(b'\n');
        stdin.write_all(&line).unwrap();
        stdin.flush().unwrap();

        let mut received = String::new();
        stdout.read_line(&mut received).unwrap();
        assert_eq!(decode_json(received.as_bytes()).unwrap(), sent);
    }

    drop(stdin);
    let status = child.wait().unwrap();
    assert!(status.success(), "exit status: {status}");
}

#[test]
fn binary_fails_on_missing_configuration() {
    let status = Command::new(env!("CARGO_BIN_EXE_evbridge-file"))
        .env_remove("ADAPTER_RECEIVER")
        .env("ADAPTER_SENDER", r#"{"output":"stdout"}"#)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}

#[test]
fn binary_fails_on_malformed_configuration() {
    let status = Command::new(env!("CARGO_BIN_EXE_evbridge-file"))
        .env("ADAPTER_RECEIVER", "{not json")
        .env("ADAPTER_SENDER", r#"{"output":"stdout"}"#)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));
}
