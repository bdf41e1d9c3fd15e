/*
 *  source.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Player state and button events as newline delimited JSON
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::model::{Disc, PlayerState, RipState};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Bad event: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Event channel closed")]
    Closed,
}

/// Where events are read from. In YAML this is either `stdin` or a map
/// `{ unix_socket: <path> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "InputRepr", into = "InputRepr")]
pub enum InputSource {
    #[default]
    Stdin,
    /// Listen on a Unix socket, any number of clients
    UnixSocket(PathBuf),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum InputRepr {
    Named(String),
    Socket { unix_socket: PathBuf },
}

impl TryFrom<InputRepr> for InputSource {
    type Error = String;

    fn try_from(repr: InputRepr) -> Result<Self, Self::Error> {
        match repr {
            InputRepr::Named(name) if name == "stdin" => Ok(InputSource::Stdin),
            InputRepr::Named(name) => Err(format!("unknown input '{}', expected stdin or unix_socket", name)),
            InputRepr::Socket { unix_socket } => Ok(InputSource::UnixSocket(unix_socket)),
        }
    }
}

impl From<InputSource> for InputRepr {
    fn from(input: InputSource) -> Self {
        match input {
            InputSource::Stdin => InputRepr::Named("stdin".to_string()),
            InputSource::UnixSocket(unix_socket) => InputRepr::Socket { unix_socket },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonEvent {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: Vec<String>,
}

// Button arguments may arrive as strings or bare numbers
fn deserialize_args<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect())
}

/// One line of input, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    State(PlayerState),
    RipState(RipState),
    Disc(Disc),
    Button(ButtonEvent),
}

/// Sent to a socket client when it connects, asking the publisher to
/// replay its current snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "request")]
pub struct SnapshotRequest {
    pub what: Vec<String>,
}

impl Default for SnapshotRequest {
    fn default() -> Self {
        Self { what: ["disc", "state", "rip_state"].map(String::from).to_vec() }
    }
}

/// Parse one input line. Blank lines are not events.
pub fn parse_line(line: &str) -> Result<Option<Event>, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

/// Forward every event read from `reader` until it ends. Malformed lines
/// are logged and skipped.
pub async fn read_events<R>(reader: R, tx: &mpsc::Sender<Event>) -> Result<(), SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(Some(event)) => tx.send(event).await.map_err(|_| SourceError::Closed)?,
            Ok(None) => {}
            Err(e) => warn!("skipping input line: {}", e),
        }
    }
    Ok(())
}

/// Ask the client for current snapshots, then forward its events until it
/// disconnects.
pub async fn serve_client<S>(stream: S, tx: &mpsc::Sender<Event>) -> Result<(), SourceError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut request = serde_json::to_vec(&SnapshotRequest::default())?;
    request.push(b'\n');
    writer.write_all(&request).await?;
    writer.flush().await?;

    read_events(BufReader::new(reader), tx).await
}

async fn serve_unix_socket(path: &Path, tx: mpsc::Sender<Event>) -> Result<(), SourceError> {
    // left behind by an earlier run
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let listener = UnixListener::bind(path)?;
    info!("listening for events on {}", path.display());

    loop {
        let (stream, _) = listener.accept().await?;
        if tx.is_closed() {
            return Err(SourceError::Closed);
        }
        debug!("event client connected");
        let tx = tx.clone();
        tokio::spawn(async move {
            match serve_client(stream, &tx).await {
                Ok(()) => debug!("event client disconnected"),
                Err(e) => warn!("event client dropped: {}", e),
            }
        });
    }
}

/// Start reading events from `input` in the background.
pub fn spawn(input: InputSource, tx: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = match &input {
            InputSource::Stdin => {
                info!("reading events from stdin");
                read_events(BufReader::new(tokio::io::stdin()), &tx).await
            }
            InputSource::UnixSocket(path) => serve_unix_socket(path, tx).await,
        };
        match result {
            Ok(()) => info!("event input closed"),
            Err(SourceError::Closed) => debug!("event receiver gone"),
            Err(e) => error!("event input failed: {}", e),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlayState;

    #[test]
    fn test_parse_state() {
        let event = parse_line(r#"{"type": "state", "state": "STOP", "no_tracks": 12}"#).unwrap();
        let Some(Event::State(s)) = event else { panic!("not a state") };
        assert_eq!(s.state, PlayState::Stop);
        assert_eq!(s.no_tracks, 12);
    }

    #[test]
    fn test_parse_button_args() {
        let event = parse_line(r#"{"type":"button","name":"DISPLAYTOGGLE","args":[1700000000.25]}"#).unwrap();
        assert_eq!(
            event,
            Some(Event::Button(ButtonEvent {
                name: "DISPLAYTOGGLE".to_string(),
                args: vec!["1700000000.25".to_string()],
            }))
        );

        let event = parse_line(r#"{"type":"button","name":"PLAY"}"#).unwrap();
        let Some(Event::Button(b)) = event else { panic!("not a button") };
        assert!(b.args.is_empty());
    }

    #[test]
    fn test_blank_and_bad_lines() {
        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("{not json").is_err());
        assert!(parse_line(r#"{"type":"eject"}"#).is_err());
    }

    #[test]
    fn test_input_source_from_yaml() {
        use crate::config::Config;

        let cfg: Config = serde_yaml::from_str("input: stdin").unwrap();
        assert_eq!(cfg.input(), InputSource::Stdin);
        let cfg: Config = serde_yaml::from_str("input:\n  unix_socket: /run/codlcd.sock\n").unwrap();
        assert_eq!(cfg.input(), InputSource::UnixSocket(PathBuf::from("/run/codlcd.sock")));
        let cfg: Config = serde_yaml::from_str("input: { unix_socket: /tmp/cd.sock }").unwrap();
        assert_eq!(cfg.input(), InputSource::UnixSocket(PathBuf::from("/tmp/cd.sock")));

        assert!(serde_yaml::from_str::<Config>("input: serial").is_err());
        assert!(serde_yaml::from_str::<Config>("input: !unix_socket /run/codlcd.sock").is_err());
    }

    #[test]
    fn test_input_source_dumps_as_map() {
        let yaml = serde_yaml::to_string(&InputSource::UnixSocket(PathBuf::from("/run/codlcd.sock"))).unwrap();
        assert_eq!(yaml.trim(), "unix_socket: /run/codlcd.sock");
        let back: InputSource = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, InputSource::UnixSocket(PathBuf::from("/run/codlcd.sock")));
        assert_eq!(serde_yaml::to_string(&InputSource::Stdin).unwrap().trim(), "stdin");
    }

    #[tokio::test]
    async fn test_read_events_skips_garbage() {
        let input = b"{\"type\":\"rip_state\",\"state\":\"AUDIO\",\"progress\":42}\ngarbage\n\n{\"type\":\"disc\",\"disc_id\":\"d1\"}\n";
        let (tx, mut rx) = mpsc::channel(8);
        read_events(&input[..], &tx).await.unwrap();
        drop(tx);

        let Some(Event::RipState(r)) = rx.recv().await else { panic!("expected rip state") };
        assert_eq!(r.progress, Some(42));
        let Some(Event::Disc(d)) = rx.recv().await else { panic!("expected disc") };
        assert_eq!(d.disc_id, "d1");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_client_asked_for_snapshots_first() {
        let (ours, theirs) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);
        let server = tokio::spawn(async move { serve_client(ours, &tx).await });

        let (reader, mut writer) = tokio::io::split(theirs);
        let mut lines = BufReader::new(reader).lines();
        let request = lines.next_line().await.unwrap().unwrap();
        assert_eq!(request, r#"{"type":"request","what":["disc","state","rip_state"]}"#);
        let parsed: SnapshotRequest = serde_json::from_str(&request).unwrap();
        assert_eq!(parsed, SnapshotRequest::default());

        writer.write_all(b"{\"type\":\"state\",\"state\":\"PLAY\",\"track\":1}\n").await.unwrap();
        let Some(Event::State(s)) = rx.recv().await else { panic!("expected state") };
        assert_eq!(s.state, PlayState::Play);

        drop(writer);
        drop(lines);
        server.await.unwrap().unwrap();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unix_socket_client_gets_request() {
        let dir = std::env::temp_dir().join(format!("codlcd-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("events.sock");
        let (tx, mut rx) = mpsc::channel(8);
        let task = spawn(InputSource::UnixSocket(path.clone()), tx);

        let mut stream = loop {
            match tokio::net::UnixStream::connect(&path).await {
                Ok(stream) => break stream,
                Err(_) => tokio::task::yield_now().await,
            }
        };
        let (reader, mut writer) = stream.split();
        let mut lines = BufReader::new(reader).lines();
        let request = lines.next_line().await.unwrap().unwrap();
        assert!(request.contains(r#""type":"request""#));

        writer.write_all(b"{\"type\":\"disc\",\"disc_id\":\"d7\"}\n").await.unwrap();
        let Some(Event::Disc(d)) = rx.recv().await else { panic!("expected disc") };
        assert_eq!(d.disc_id, "d7");

        task.abort();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
