//! HistoryStack : journal LIFO borné des transitions de lecture

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Action de lecture consignée dans l'historique
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackAction {
    Play,
    Skip,
    Previous,
}

impl PlaybackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackAction::Play => "play",
            PlaybackAction::Skip => "skip",
            PlaybackAction::Previous => "previous",
        }
    }
}

impl fmt::Display for PlaybackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlaybackAction {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "play" => Ok(PlaybackAction::Play),
            "skip" => Ok(PlaybackAction::Skip),
            "previous" => Ok(PlaybackAction::Previous),
            _ => Err(()),
        }
    }
}

impl Serialize for PlaybackAction {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlaybackAction {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        PlaybackAction::from_str(&value)
            .map_err(|_| serde::de::Error::custom(format!("unknown playback action: {value}")))
    }
}

/// Une transition de lecture consignée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub song_id: String,
    pub at: DateTime<Utc>,
    pub action: PlaybackAction,
}

impl HistoryRecord {
    pub fn new(song_id: impl Into<String>, at: DateTime<Utc>, action: PlaybackAction) -> Self {
        Self {
            song_id: song_id.into(),
            at,
            action,
        }
    }
}

/// Pile LIFO bornée : à capacité atteinte, `push` évince le plus ancien
/// enregistrement (le fond de la pile), jamais le plus récent — la
/// sémantique "dernier entré / premier annulé" reste intacte au sommet.
#[derive(Debug)]
pub struct HistoryStack {
    /// Fond de pile en tête de deque, sommet en queue
    records: VecDeque<HistoryRecord>,
    capacity: usize,
}

impl HistoryStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Empile un enregistrement (éviction du fond si la capacité est
    /// atteinte — ce n'est pas une erreur)
    pub fn push(&mut self, record: HistoryRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Dépile et retourne l'enregistrement le plus récent
    pub fn pop(&mut self) -> Result<HistoryRecord> {
        self.records.pop_back().ok_or(Error::EmptyHistory)
    }

    /// Consulte l'enregistrement le plus récent sans le retirer
    pub fn peek(&self) -> Result<&HistoryRecord> {
        self.records.back().ok_or(Error::EmptyHistory)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Parcourt du plus ancien au plus récent
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    /// Timestamp de la dernière lecture (action `play`) d'un morceau
    pub fn last_played(&self, song_id: &str) -> Option<DateTime<Utc>> {
        self.records
            .iter()
            .rev()
            .find(|record| record.action == PlaybackAction::Play && record.song_id == song_id)
            .map(|record| record.at)
    }
}
