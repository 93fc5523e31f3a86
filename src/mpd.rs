/*
 *  mpd.rs
 *
 *  MatrixVu - MPD in lights
 *	(c) 2020-25 Stuart Hunter
 *
 *	TODO:
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

//! Minimal MPD line-protocol client: just enough of the conversation to
//! poll `status` and `currentsong`. Any failure drops the connection; the
//! next poll reconnects. Reconnect policy beyond that belongs to the
//! caller.

use std::collections::HashMap;
use std::time::Duration;

use log::debug;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const COMMAND_TIMEOUT: Duration = Duration::from_millis(800);

/// Marquee fallback when the daemon cannot be reached.
pub const NO_CONNECTION_TEXT: &str = "No MPD Connection";

#[derive(Debug, Error)]
pub enum MpdError {
    #[error("I/O error talking to mpd: {0}")]
    Io(#[from] std::io::Error),
    #[error("mpd did not answer in time")]
    Timeout,
    #[error("unexpected greeting from mpd: {0:?}")]
    Greeting(String),
    #[error("mpd rejected command: {0}")]
    Ack(String),
    #[error("mpd closed the connection")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Play,
    Pause,
    Stop,
}

impl PlayState {
    /// Maps the `state:` field of an mpd `status` response; anything
    /// unrecognized reads as stopped.
    pub fn from_mpd(s: &str) -> Self {
        match s {
            "play" => PlayState::Play,
            "pause" => PlayState::Pause,
            _ => PlayState::Stop,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongInfo {
    pub track: String,
    pub artist: String,
    pub title: String,
}

impl SongInfo {
    /// Marquee line: the non-empty parts joined with " - ".
    pub fn display_line(&self) -> String {
        [self.track.as_str(), self.artist.as_str(), self.title.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

pub struct MpdClient {
    host: String,
    port: u16,
    stream: Option<BufReader<TcpStream>>,
}

impl MpdClient {
    /// Does not connect; the first command does.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            stream: None,
        }
    }

    /// Current player state.
    pub async fn status(&mut self) -> Result<PlayState, MpdError> {
        let fields = self.command("status").await?;
        Ok(PlayState::from_mpd(
            fields.get("state").map(String::as_str).unwrap_or("stop"),
        ))
    }

    /// Track/artist/title of the current song; missing tags come back
    /// empty.
    pub async fn current_song(&mut self) -> Result<SongInfo, MpdError> {
        let fields = self.command("currentsong").await?;
        let take = |key: &str| fields.get(key).cloned().unwrap_or_default();
        Ok(SongInfo {
            track: take("Track"),
            artist: take("Artist"),
            title: take("Title"),
        })
    }

    /// Best-effort close; the daemon treats a dropped socket the same way.
    pub async fn disconnect(&mut self) {
        if let Some(reader) = self.stream.as_mut() {
            let _ = timeout(COMMAND_TIMEOUT, reader.get_mut().write_all(b"close\n")).await;
            debug!("mpd connection closed");
        }
        self.stream = None;
    }

    async fn connect(&mut self) -> Result<(), MpdError> {
        let stream = timeout(
            CONNECT_TIMEOUT,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| MpdError::Timeout)??;
        let mut reader = BufReader::new(stream);
        let mut greeting = String::new();
        timeout(COMMAND_TIMEOUT, reader.read_line(&mut greeting))
            .await
            .map_err(|_| MpdError::Timeout)??;
        if !greeting.starts_with("OK MPD") {
            return Err(MpdError::Greeting(greeting.trim().to_string()));
        }
        debug!("connected to {}", greeting.trim());
        self.stream = Some(reader);
        Ok(())
    }

    async fn command(&mut self, cmd: &str) -> Result<HashMap<String, String>, MpdError> {
        if self.stream.is_none() {
            self.connect().await?;
        }
        match self.exchange(cmd).await {
            Ok(fields) => Ok(fields),
            Err(e) => {
                // drop the connection; next poll starts fresh
                self.stream = None;
                Err(e)
            }
        }
    }

    async fn exchange(&mut self, cmd: &str) -> Result<HashMap<String, String>, MpdError> {
        let reader = self.stream.as_mut().ok_or(MpdError::Closed)?;
        timeout(
            COMMAND_TIMEOUT,
            reader.get_mut().write_all(format!("{cmd}\n").as_bytes()),
        )
        .await
        .map_err(|_| MpdError::Timeout)??;

        let mut fields = HashMap::new();
        loop {
            let mut line = String::new();
            let n = timeout(COMMAND_TIMEOUT, reader.read_line(&mut line))
                .await
                .map_err(|_| MpdError::Timeout)??;
            if n == 0 {
                return Err(MpdError::Closed);
            }
            let line = line.trim_end();
            if line == "OK" {
                return Ok(fields);
            }
            if line.starts_with("ACK") {
                return Err(MpdError::Ack(line.to_string()));
            }
            insert_field(&mut fields, line);
        }
    }
}

fn insert_field(fields: &mut HashMap<String, String>, line: &str) {
    if let Some((key, value)) = line.split_once(": ") {
        fields.insert(key.to_string(), value.to_string());
    }
}
