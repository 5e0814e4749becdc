//! SkipTracker : journal FIFO borné des morceaux sautés
//!
//! Alimente les statistiques et la pénalité de score du conseiller de
//! re-lecture. Le débordement de capacité évince le plus ancien
//! enregistrement — politique d'éviction, pas une erreur.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Un saut consigné
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub song_id: String,
    pub at: DateTime<Utc>,
}

impl SkipRecord {
    pub fn new(song_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            song_id: song_id.into(),
            at,
        }
    }
}

/// File FIFO bornée des sauts récents
#[derive(Debug)]
pub struct SkipTracker {
    /// Plus ancien en tête, plus récent en queue
    records: VecDeque<SkipRecord>,
    capacity: usize,
}

impl SkipTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Consigne un saut (éviction du plus ancien à capacité atteinte)
    pub fn push(&mut self, record: SkipRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Les n sauts les plus récents, du plus récent au plus ancien
    pub fn recent(&self, n: usize) -> Vec<&SkipRecord> {
        self.records.iter().rev().take(n).collect()
    }

    /// Nombre de sauts d'un morceau dans la fenêtre `[now - window, now]`
    pub fn recent_count(&self, song_id: &str, window: Duration, now: DateTime<Utc>) -> usize {
        self.records
            .iter()
            .filter(|record| record.song_id == song_id && now - record.at <= window)
            .count()
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
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SkipRecord> {
        self.records.iter()
    }
}
