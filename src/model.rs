/*
 *  model.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Player, ripper and disc snapshots as published by the player daemon
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

use serde::{Deserialize, Deserializer, Serialize};

/// Player state as reported by the player daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayState {
    Off,
    NoDisc,
    Stop,
    Working,
    Play,
    Pause,
}

/// Ripping activity as reported by the ripper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RipActivity {
    Inactive,
    Audio,
    Toc,
}

/// Snapshot of the player. Superseded wholesale by the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub state: PlayState,
    #[serde(default, deserialize_with = "deserialize_error")]
    pub error: Option<String>,
    #[serde(default)]
    pub disc_id: Option<String>,
    #[serde(default)]
    pub track: u32,
    #[serde(default)]
    pub no_tracks: u32,
    /// Seconds into the track, negative while in the pregap
    #[serde(default)]
    pub position: i64,
    #[serde(default)]
    pub length: i64,
}

impl PlayerState {
    pub fn new(state: PlayState) -> Self {
        Self {
            state,
            error: None,
            disc_id: None,
            track: 0,
            no_tracks: 0,
            position: 0,
            length: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RipState {
    pub state: RipActivity,
    #[serde(default)]
    pub progress: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_error")]
    pub error: Option<String>,
}

impl RipState {
    pub fn new(state: RipActivity) -> Self {
        Self { state, progress: None, error: None }
    }

    pub fn is_active(&self) -> bool {
        self.state != RipActivity::Inactive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
}

/// Disc metadata. Only relevant to the display while its `disc_id`
/// matches the one in the current player state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub disc_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Disc {
    /// Build a disc whose tracks are numbered 1..=n in order.
    pub fn with_titles<S: Into<String>>(disc_id: S, titles: &[&str]) -> Self {
        let tracks = titles
            .iter()
            .zip(1..)
            .map(|(title, number)| Track { number, title: Some((*title).to_string()) })
            .collect();
        Self { disc_id: disc_id.into(), title: None, artist: None, tracks }
    }
}

// the player sends "" rather than null when an error clears
fn deserialize_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<String> = Option::deserialize(deserializer)?;
    Ok(v.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_from_json() {
        let json = r#"{"state":"NO_DISC","error":"","track":0}"#;
        let s: PlayerState = serde_json::from_str(json).unwrap();
        assert_eq!(s.state, PlayState::NoDisc);
        assert_eq!(s.error, None);
        assert_eq!(s.no_tracks, 0);
        assert_eq!(s.disc_id, None);
    }

    #[test]
    fn test_rip_state_from_json() {
        let json = r#"{"state":"AUDIO","progress":42,"error":null}"#;
        let r: RipState = serde_json::from_str(json).unwrap();
        assert_eq!(r.state, RipActivity::Audio);
        assert_eq!(r.progress, Some(42));
        assert!(r.is_active());
        assert!(!RipState::new(RipActivity::Inactive).is_active());
    }

    #[test]
    fn test_disc_with_titles_numbers_tracks() {
        let disc = Disc::with_titles("abc", &["One", "Two"]);
        assert_eq!(disc.tracks.len(), 2);
        assert_eq!(disc.tracks[1].number, 2);
        assert_eq!(disc.tracks[1].title.as_deref(), Some("Two"));
    }
}
