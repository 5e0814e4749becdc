//! Types d'erreurs pour pmosession

/// Erreurs du moteur de session
///
/// Toutes les erreurs sont locales et synchrones : elles remontent telles
/// quelles à l'appelant, sans retry ni masquage. Le débordement de capacité
/// de l'historique ou du journal de skips n'est PAS une erreur (c'est une
/// politique d'éviction).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Song already exists: {0}")]
    DuplicateId(String),

    #[error("Song not found: {0}")]
    NotFound(String),

    #[error("Playlist index out of range: {index} (len: {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid rating {value} (allowed: 0.0..={max})")]
    InvalidRating { value: f32, max: f32 },

    #[error("History is empty")]
    EmptyHistory,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Divergence interne détectée (bug du coordinateur) : on échoue
    /// bruyamment plutôt que de masquer
    #[error("Internal consistency violation: {0}")]
    Inconsistency(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour pmosession
pub type Result<T> = std::result::Result<T, Error>;
