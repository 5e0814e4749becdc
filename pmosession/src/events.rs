//! Évènements de session pour observateurs en-process
//!
//! Registre de callbacks à la manière du gestionnaire central : un jeton
//! (u64) est remis à l'enregistrement et sert au désenregistrement. Les
//! callbacks sont invoqués de manière synchrone, après que la mutation a
//! entièrement abouti.

/// Évènement émis par la session après une mutation réussie
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SongAdded {
        song_id: String,
    },
    SongRemoved {
        song_id: String,
    },
    RatingChanged {
        song_id: String,
        previous: Option<f32>,
        new: f32,
    },
    /// Contenu ou ordre de la playlist modifié
    PlaylistChanged,
    /// Position de lecture modifiée (`None` : plus rien en cours)
    PlaybackChanged {
        song_id: Option<String>,
    },
    /// Re-lecture automatique déclenchée en fin de playlist
    AutoReplayActivated {
        injected: usize,
    },
}
