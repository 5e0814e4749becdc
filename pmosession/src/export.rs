//! Export : instantané JSON complet de la session
//!
//! Document ponctuel et intégral (pas un journal incrémental) : catalogue,
//! playlist avec drapeaux live/tombstone, contenu de l'index de notation,
//! journaux bornés et configuration de la re-lecture automatique. C'est le
//! seul artefact durable que le noyau produit.

use crate::advisor::{AdvisorConfig, AdvisorState};
use crate::history::PlaybackAction;
use crate::song::Song;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document d'export complet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionExport {
    pub exported_at: DateTime<Utc>,
    /// Tous les morceaux du catalogue, triés par id
    pub songs: Vec<Song>,
    /// Entrées de la playlist dans l'ordre, avec drapeau live/tombstone
    pub playlist: Vec<ExportedEntry>,
    /// Position de lecture courante, si une entrée est en cours
    pub current_index: Option<usize>,
    /// Contenu de l'index de notation, par note croissante
    pub ratings: Vec<ExportedBucket>,
    pub history: Vec<ExportedHistoryRecord>,
    pub skips: Vec<ExportedSkipRecord>,
    pub auto_replay: ExportedAdvisor,
}

/// Une entrée de playlist exportée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEntry {
    pub song_id: String,
    /// `false` : référence tombstone (le morceau n'est plus au catalogue)
    pub live: bool,
}

/// Un bucket de l'index de notation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedBucket {
    pub rating: f32,
    pub song_ids: Vec<String>,
}

/// Un enregistrement d'historique exporté (conservé même si le morceau a
/// été retiré : fait historique, rendu tombstone via `live`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedHistoryRecord {
    pub song_id: String,
    pub at: DateTime<Utc>,
    pub action: PlaybackAction,
    pub live: bool,
}

/// Un saut exporté
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedSkipRecord {
    pub song_id: String,
    pub at: DateTime<Utc>,
    pub live: bool,
}

/// État et configuration de la re-lecture automatique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedAdvisor {
    pub state: AdvisorState,
    pub config: AdvisorConfig,
}
