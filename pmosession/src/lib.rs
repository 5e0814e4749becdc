//! # pmosession - Noyau en mémoire de session d'écoute
//!
//! Cette crate fournit l'état coordonné d'une session de lecture musicale :
//! - Catalogue de morceaux (source de vérité, accès par id)
//! - Playlist ordonnée avec curseur de lecture intrinsèque
//! - Index de notation ordonné (requêtes par plage, top-n)
//! - Historique de lecture (LIFO borné) et journal de sauts (FIFO borné)
//! - Re-lecture automatique par scoring en fin de playlist
//! - Export JSON intégral et audit d'invariants
//!
//! # Architecture
//!
//! - **Session** : Coordinateur mono-écrivain, point d'entrée unique des
//!   mutations ; chaque opération laisse tous les composants cohérents
//! - **SharedSession** : Poignée `Arc<RwLock>` pour hôtes tokio
//! - **Catalog / RatingIndex / Playlist** : composants internes, mutés
//!   uniquement via la session
//!
//! Tout l'état est volatil : rien n'est persisté, l'export JSON est le seul
//! artefact durable.
//!
//! # Exemple d'utilisation
//!
//! ```
//! use pmosession::{Session, SessionConfig, Song};
//!
//! # fn main() -> pmosession::Result<()> {
//! let mut session = Session::new(SessionConfig::default())?;
//!
//! let mut song = Song::new("track-1", "Aqueous Transmission");
//! song.artist = Some("Incubus".into());
//! session.add_song(song)?;
//! session.rate_song("track-1", 4.5)?;
//!
//! session.enqueue("track-1")?;
//! let position = session.play(0)?;
//! assert_eq!(position.song_id, "track-1");
//!
//! println!("{}", session.export_json()?);
//! # Ok(())
//! # }
//! ```

mod advisor;
mod catalog;
mod config;
mod error;
mod events;
mod export;
mod history;
mod playlist;
mod rating;
mod session;
mod shared;
mod skips;
mod song;

// Réexports publics
pub use advisor::{AdvisorConfig, AdvisorState, ReplayAdvisor, Suggestion};
pub use catalog::{Catalog, RatingChange};
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use export::{
    ExportedAdvisor, ExportedBucket, ExportedEntry, ExportedHistoryRecord, ExportedSkipRecord,
    SessionExport,
};
pub use history::{HistoryRecord, HistoryStack, PlaybackAction};
pub use playlist::Playlist;
pub use rating::RatingIndex;
pub use session::{PlaybackPosition, PlaylistItem, Session, SessionSnapshot, SortKey};
pub use shared::SharedSession;
pub use skips::{SkipRecord, SkipTracker};
pub use song::Song;

// Les algorithmes de tri sont une crate sœur ; réexportés pour que les
// appelants de `sort_playlist` n'aient pas à en dépendre directement
pub use pmosort::{Algorithm, Order};
