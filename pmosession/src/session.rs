//! Session : coordinateur central de l'état de lecture
//!
//! Point d'entrée unique de toutes les mutations. La session ne possède
//! aucune donnée métier en propre : elle séquence les appels vers le
//! catalogue (source de vérité, mis à jour en premier), puis propage vers la
//! playlist, l'index de notation et les journaux, de sorte que chaque
//! opération publique soit atomique du point de vue de l'appelant. Les
//! lectures (vue, instantané, export) sont de la pure computation, sans
//! mutation d'aucun composant.

use crate::advisor::{AdvisorState, ReplayAdvisor, Suggestion};
use crate::catalog::{Catalog, RatingChange};
use crate::config::SessionConfig;
use crate::events::SessionEvent;
use crate::export::{
    ExportedAdvisor, ExportedBucket, ExportedEntry, ExportedHistoryRecord, ExportedSkipRecord,
    SessionExport,
};
use crate::history::{HistoryRecord, HistoryStack, PlaybackAction};
use crate::playlist::Playlist;
use crate::rating::RatingIndex;
use crate::skips::{SkipRecord, SkipTracker};
use crate::song::Song;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use pmosort::{Algorithm, Order};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Champ de tri de la playlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Title,
    Artist,
    Album,
    Year,
    Duration,
    Rating,
}

/// Valeur de clé extraite d'un morceau (les champs absents passent en tête
/// de l'ordre croissant)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Text(Option<String>),
    Number(Option<u64>),
}

impl SortValue {
    fn extract(key: SortKey, song: &Song) -> Self {
        match key {
            SortKey::Title => SortValue::Text(Some(song.title.clone())),
            SortKey::Artist => SortValue::Text(song.artist.clone()),
            SortKey::Album => SortValue::Text(song.album.clone()),
            SortKey::Year => SortValue::Number(song.year.map(u64::from)),
            SortKey::Duration => SortValue::Number(song.duration_secs),
            SortKey::Rating => {
                SortValue::Number(song.rating.map(|r| (r * 10.0).round() as u64))
            }
        }
    }
}

/// Élément de la vue ordonnée de la playlist
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistItem {
    pub index: usize,
    pub song_id: String,
    /// `None` : référence tombstone, à rendre "removed" — jamais écartée
    /// silencieusement, l'adressage par index des appelants en dépend
    pub song: Option<Song>,
}

/// Position de lecture courante
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackPosition {
    pub index: usize,
    pub song_id: String,
}

/// Instantané agrégé en lecture seule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub song_count: usize,
    pub playlist_len: usize,
    pub history_len: usize,
    pub skip_len: usize,
    pub current: Option<PlaybackPosition>,
    /// Les 5 morceaux les mieux notés
    pub top_rated: Vec<String>,
    /// Les 5 sauts les plus récents, du plus récent au plus ancien
    pub recent_skips: Vec<String>,
    pub auto_replay: AdvisorState,
    pub last_change: DateTime<Utc>,
}

type Callback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// L'état complet et coordonné d'une session de lecture
///
/// Objet explicite et constructible : créer → muter via les opérations
/// publiques → exporter/jeter. Mono-écrivain par conception : une mutation
/// peut toucher plusieurs composants, une application partielle violerait
/// l'intégrité référentielle. Les hôtes concurrents sérialisent l'accès via
/// [`SharedSession`](crate::SharedSession).
pub struct Session {
    config: SessionConfig,
    catalog: Catalog,
    ratings: RatingIndex,
    playlist: Playlist,
    history: HistoryStack,
    skips: SkipTracker,
    advisor: ReplayAdvisor,
    callbacks: HashMap<u64, Callback>,
    next_callback_token: u64,
    last_change: DateTime<Utc>,
}

impl Session {
    /// Crée une session vide (erreur si la configuration est invalide)
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog: Catalog::new(config.rating_max),
            ratings: RatingIndex::new(),
            playlist: Playlist::new(),
            history: HistoryStack::new(config.history_capacity),
            skips: SkipTracker::new(config.skip_capacity),
            advisor: ReplayAdvisor::new(config.advisor.clone())?,
            callbacks: HashMap::new(),
            next_callback_token: 1,
            last_change: Utc::now(),
            config,
        })
    }

    /// Crée une session et la peuple depuis un lot de départ
    ///
    /// Tout l'état est volatil : au démarrage, l'hôte reconstruit la session
    /// depuis sa graine.
    pub fn with_seed(config: SessionConfig, songs: Vec<Song>) -> Result<Self> {
        let mut session = Self::new(config)?;
        for song in songs {
            session.add_song(song)?;
        }
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ========== Catalogue ==========

    /// Ajoute un morceau au catalogue (et à l'index s'il porte une note)
    pub fn add_song(&mut self, song: Song) -> Result<()> {
        let id = song.id.clone();
        tracing::debug!("Adding song {} to catalog", id);

        self.catalog.add(song)?;
        // La note éventuelle a été quantifiée par le catalogue
        let rating = self.catalog.get(&id)?.rating;
        if let Some(rating) = rating {
            self.ratings.insert(rating, &id);
        }

        self.touch();
        self.notify(SessionEvent::SongAdded { song_id: id });
        Ok(())
    }

    /// Retire un morceau et purge ses références en cascade
    ///
    /// La playlist et l'index de notation sont purgés physiquement ; les
    /// enregistrements d'historique et de sauts restent comme faits
    /// historiques et se rendent tombstone à la résolution.
    pub fn remove_song(&mut self, id: &str) -> Result<Song> {
        let song = self.catalog.remove(id)?;
        if let Some(rating) = song.rating {
            self.ratings.remove(rating, id);
        }
        let purged = self.playlist.purge(id);
        tracing::info!(
            "Removed song {} ({} playlist entries purged)",
            id,
            purged
        );

        self.touch();
        if purged > 0 {
            self.notify(SessionEvent::PlaylistChanged);
        }
        self.notify(SessionEvent::SongRemoved {
            song_id: id.to_string(),
        });
        Ok(song)
    }

    /// Change la note d'un morceau et re-bucketise l'index
    ///
    /// Une re-notation à la valeur inchangée est un no-op : l'id garde sa
    /// position d'affectation dans son bucket (le départage des égalités de
    /// `top_n` n'est pas réinitialisé).
    pub fn rate_song(&mut self, id: &str, value: f32) -> Result<RatingChange> {
        let change = self.catalog.set_rating(id, value)?;
        if change.previous == Some(change.new) {
            return Ok(change);
        }
        if let Some(previous) = change.previous {
            self.ratings.remove(previous, id);
        }
        self.ratings.insert(change.new, id);
        tracing::debug!("Rated song {}: {:?} -> {}", id, change.previous, change.new);

        self.touch();
        self.notify(SessionEvent::RatingChanged {
            song_id: id.to_string(),
            previous: change.previous,
            new: change.new,
        });
        Ok(change)
    }

    /// Lit un morceau du catalogue
    pub fn song(&self, id: &str) -> Result<&Song> {
        self.catalog.get(id)
    }

    pub fn song_count(&self) -> usize {
        self.catalog.len()
    }

    // ========== Playlist ==========

    /// Ajoute un morceau en fin de playlist (erreur si absent du catalogue)
    pub fn enqueue(&mut self, id: &str) -> Result<()> {
        self.catalog.get(id)?;
        self.playlist.push(id);
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
        Ok(())
    }

    /// Insère un morceau à la position donnée
    pub fn insert_at(&mut self, index: usize, id: &str) -> Result<()> {
        self.catalog.get(id)?;
        self.playlist.insert_at(index, id)?;
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
        Ok(())
    }

    /// Retire l'entrée à la position donnée ; retourne l'id du morceau
    pub fn remove_at(&mut self, index: usize) -> Result<String> {
        let song_id = self.playlist.remove_at(index)?;
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
        Ok(song_id)
    }

    /// Déplace une entrée de `from` vers la position finale `to`
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        self.playlist.move_entry(from, to)?;
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
        Ok(())
    }

    /// Inverse l'ordre de la playlist
    pub fn reverse_playlist(&mut self) {
        self.playlist.reverse();
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
    }

    /// Vide la playlist (le catalogue n'est pas touché)
    pub fn clear_playlist(&mut self) {
        self.playlist.clear();
        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
    }

    pub fn playlist_len(&self) -> usize {
        self.playlist.len()
    }

    /// Trie la playlist par clé extraite, en reliant les entrées existantes
    /// dans le nouvel ordre (aucune réallocation, le curseur suit son entrée)
    ///
    /// Une entrée dont l'id ne résout plus au catalogue révèle un bug de
    /// purge en cascade : échec bruyant plutôt que tri silencieusement faux.
    pub fn sort_playlist(&mut self, key: SortKey, order: Order, algorithm: Algorithm) -> Result<()> {
        let slots = self.playlist.slots_in_order();
        let mut keyed: Vec<(SortValue, usize)> = Vec::with_capacity(slots.len());
        for idx in slots {
            let song_id = self
                .playlist
                .song_of_slot(idx)
                .ok_or_else(|| Error::Inconsistency(format!("freed slot {idx} still linked")))?;
            let song = self.catalog.get(song_id).map_err(|_| {
                Error::Inconsistency(format!("playlist references unknown song {song_id}"))
            })?;
            keyed.push((SortValue::extract(key, song), idx));
        }

        match order {
            Order::Ascending => {
                pmosort::sort_by(&mut keyed, algorithm, |a, b| a.0.cmp(&b.0));
            }
            Order::Descending => {
                pmosort::sort_by(&mut keyed, algorithm, |a, b| b.0.cmp(&a.0));
            }
        }

        let new_order: Vec<usize> = keyed.into_iter().map(|(_, idx)| idx).collect();
        self.playlist.relink(&new_order);
        tracing::debug!(
            "Sorted playlist by {:?} ({}, {})",
            key,
            order,
            algorithm
        );

        self.touch();
        self.notify(SessionEvent::PlaylistChanged);
        Ok(())
    }

    /// Vue ordonnée de la playlist, morceaux résolus
    ///
    /// Les références tombstone sont rendues comme entrées sans morceau,
    /// jamais écartées : les écarter désynchroniserait l'adressage par index.
    pub fn current_view(&self) -> Vec<PlaylistItem> {
        self.playlist
            .iter()
            .enumerate()
            .map(|(index, song_id)| PlaylistItem {
                index,
                song_id: song_id.to_string(),
                song: self.catalog.lookup(song_id).cloned(),
            })
            .collect()
    }

    // ========== Lecture ==========

    /// Position de lecture courante
    pub fn position(&self) -> Option<PlaybackPosition> {
        let index = self.playlist.current_index()?;
        let song_id = self.playlist.current_song()?.to_string();
        Some(PlaybackPosition { index, song_id })
    }

    /// Lance la lecture de l'entrée à la position donnée
    pub fn play(&mut self, index: usize) -> Result<PlaybackPosition> {
        let song_id = self.playlist.jump_to(index)?.to_string();
        self.record(PlaybackAction::Play, &song_id);
        tracing::debug!("Playing {} at index {}", song_id, index);

        self.touch();
        self.notify(SessionEvent::PlaybackChanged {
            song_id: Some(song_id.clone()),
        });
        Ok(PlaybackPosition { index, song_id })
    }

    /// Passe à l'entrée suivante
    ///
    /// En fin de playlist : retourne `None`, sauf si la re-lecture
    /// automatique est armée — elle s'active alors et ré-alimente la
    /// playlist depuis les suggestions.
    pub fn next(&mut self) -> Result<Option<PlaybackPosition>> {
        match self.playlist.advance().map(str::to_string) {
            Some(song_id) => {
                self.record(PlaybackAction::Play, &song_id);
                self.touch();
                self.notify(SessionEvent::PlaybackChanged {
                    song_id: Some(song_id.clone()),
                });
                Ok(self.position())
            }
            None => self.handle_playlist_end(),
        }
    }

    /// Saute l'entrée courante : consigne le saut puis avance
    ///
    /// Sans entrée courante il n'y a rien à sauter : no-op (`None`).
    pub fn skip(&mut self) -> Result<Option<PlaybackPosition>> {
        let Some(current) = self.playlist.current_song().map(str::to_string) else {
            tracing::debug!("Skip requested with no current entry");
            return Ok(None);
        };

        let now = Utc::now();
        self.skips.push(SkipRecord::new(current.clone(), now));
        self.history
            .push(HistoryRecord::new(current.clone(), now, PlaybackAction::Skip));
        tracing::debug!("Skipped {}", current);

        match self.playlist.advance().map(str::to_string) {
            Some(song_id) => {
                self.touch();
                self.notify(SessionEvent::PlaybackChanged {
                    song_id: Some(song_id),
                });
                Ok(self.position())
            }
            None => self.handle_playlist_end(),
        }
    }

    /// Revient à l'entrée précédente (`None` en amont de la première)
    pub fn previous(&mut self) -> Result<Option<PlaybackPosition>> {
        match self.playlist.retreat().map(str::to_string) {
            Some(song_id) => {
                self.record(PlaybackAction::Previous, &song_id);
                self.touch();
                self.notify(SessionEvent::PlaybackChanged {
                    song_id: Some(song_id),
                });
                Ok(self.position())
            }
            None => {
                self.touch();
                self.notify(SessionEvent::PlaybackChanged { song_id: None });
                Ok(None)
            }
        }
    }

    /// Annule la dernière transition : dépile l'historique et ramène la
    /// position de lecture sur le morceau du nouveau sommet (ou sur rien si
    /// l'historique est vide)
    pub fn undo(&mut self) -> Result<HistoryRecord> {
        let record = self.history.pop()?;
        match self.history.peek() {
            Ok(top) => {
                let song_id = top.song_id.clone();
                if !self.playlist.seek_song(&song_id) {
                    // Le morceau n'a plus d'entrée dans la playlist
                    self.playlist.clear_cursor();
                }
            }
            Err(_) => self.playlist.clear_cursor(),
        }
        tracing::debug!("Undo: popped {} ({})", record.song_id, record.action);

        self.touch();
        self.notify(SessionEvent::PlaybackChanged {
            song_id: self.playlist.current_song().map(str::to_string),
        });
        Ok(record)
    }

    /// Dernière transition consignée, sans la retirer
    pub fn last_transition(&self) -> Result<&HistoryRecord> {
        self.history.peek()
    }

    // ========== Notation (lectures) ==========

    /// Séquence paresseuse et relançable des morceaux notés dans
    /// `[min, max]`, par note croissante
    pub fn songs_by_rating(&self, min: f32, max: f32) -> impl Iterator<Item = &Song> + '_ {
        self.ratings
            .range(min, max)
            .filter_map(|(_, id)| self.catalog.lookup(id))
    }

    /// Les n ids les mieux notés
    pub fn top_rated(&self, n: usize) -> Vec<String> {
        self.ratings.top_n(n)
    }

    // ========== Re-lecture automatique ==========

    pub fn enable_auto_replay(&mut self) {
        self.advisor.enable();
        tracing::debug!("Auto-replay state: {}", self.advisor.state());
        self.touch();
    }

    pub fn disable_auto_replay(&mut self) {
        self.advisor.disable();
        tracing::debug!("Auto-replay state: {}", self.advisor.state());
        self.touch();
    }

    pub fn auto_replay_state(&self) -> AdvisorState {
        self.advisor.state()
    }

    /// Les n meilleurs candidats à la re-lecture, à l'instant présent
    pub fn suggestions(&self, n: usize) -> Vec<Suggestion> {
        self.advisor.suggest(
            n,
            &self.catalog,
            &self.ratings,
            &self.history,
            &self.skips,
            Utc::now(),
        )
    }

    /// Les n sauts les plus récents, du plus récent au plus ancien
    pub fn recent_skips(&self, n: usize) -> Vec<SkipRecord> {
        self.skips.recent(n).into_iter().cloned().collect()
    }

    // ========== Observateurs ==========

    /// Enregistre un callback d'évènement ; retourne un jeton pour le
    /// désenregistrement
    pub fn register_callback<F>(&mut self, callback: F) -> u64
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let token = self.next_callback_token;
        self.next_callback_token += 1;
        self.callbacks.insert(token, Arc::new(callback));
        token
    }

    /// Désenregistre un callback via son jeton
    pub fn unregister_callback(&mut self, token: u64) {
        self.callbacks.remove(&token);
    }

    // ========== Instantané, export, audit ==========

    /// Instantané agrégé en lecture seule — pure computation, aucun
    /// composant n'est modifié
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            song_count: self.catalog.len(),
            playlist_len: self.playlist.len(),
            history_len: self.history.len(),
            skip_len: self.skips.len(),
            current: self.position(),
            top_rated: self.ratings.top_n(5),
            recent_skips: self
                .skips
                .recent(5)
                .into_iter()
                .map(|record| record.song_id.clone())
                .collect(),
            auto_replay: self.advisor.state(),
            last_change: self.last_change,
        }
    }

    /// Document d'export complet (instantané ponctuel, pas un journal)
    pub fn export(&self) -> SessionExport {
        let mut songs: Vec<Song> = self.catalog.iter().cloned().collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));

        SessionExport {
            exported_at: Utc::now(),
            songs,
            playlist: self
                .playlist
                .iter()
                .map(|song_id| ExportedEntry {
                    song_id: song_id.to_string(),
                    live: self.catalog.contains(song_id),
                })
                .collect(),
            current_index: self.playlist.current_index(),
            ratings: self
                .ratings
                .buckets()
                .map(|(rating, ids)| ExportedBucket {
                    rating,
                    song_ids: ids.to_vec(),
                })
                .collect(),
            history: self
                .history
                .iter()
                .map(|record| ExportedHistoryRecord {
                    song_id: record.song_id.clone(),
                    at: record.at,
                    action: record.action,
                    live: self.catalog.contains(&record.song_id),
                })
                .collect(),
            skips: self
                .skips
                .iter()
                .map(|record| ExportedSkipRecord {
                    song_id: record.song_id.clone(),
                    at: record.at,
                    live: self.catalog.contains(&record.song_id),
                })
                .collect(),
            auto_replay: ExportedAdvisor {
                state: self.advisor.state(),
                config: self.advisor.config().clone(),
            },
        }
    }

    /// Sérialise l'export en JSON
    pub fn export_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.export())
            .map_err(|e| Error::Other(anyhow::anyhow!("export serialization failed: {e}")))
    }

    /// Vérifie les invariants inter-composants ; échec bruyant
    /// ([`Error::Inconsistency`]) sur toute divergence — une divergence est
    /// un bug du coordinateur, jamais un état à masquer
    pub fn audit(&self) -> Result<()> {
        // Note du catalogue == bucket de l'index, dans les deux sens
        for song in self.catalog.iter() {
            let bucket = self.ratings.bucket_of(&song.id);
            match (song.rating, bucket) {
                (Some(rating), Some(bucket)) => {
                    if (rating * 10.0).round() != (bucket * 10.0).round() {
                        return Err(Error::Inconsistency(format!(
                            "song {} rated {} but indexed at {}",
                            song.id, rating, bucket
                        )));
                    }
                }
                (None, None) => {}
                (rating, bucket) => {
                    return Err(Error::Inconsistency(format!(
                        "song {} rating/index divergence: {:?} vs {:?}",
                        song.id, rating, bucket
                    )));
                }
            }
        }
        for (rating, ids) in self.ratings.buckets() {
            for id in ids {
                if !self.catalog.contains(id) {
                    return Err(Error::Inconsistency(format!(
                        "rating index holds unknown song {id} at {rating}"
                    )));
                }
            }
        }

        // Bornes de capacité des journaux
        if self.history.len() > self.config.history_capacity {
            return Err(Error::Inconsistency(format!(
                "history overflows capacity: {} > {}",
                self.history.len(),
                self.config.history_capacity
            )));
        }
        if self.skips.len() > self.config.skip_capacity {
            return Err(Error::Inconsistency(format!(
                "skip log overflows capacity: {} > {}",
                self.skips.len(),
                self.config.skip_capacity
            )));
        }

        // Liens de la playlist
        if !self.playlist.links_consistent() {
            return Err(Error::Inconsistency(
                "playlist links are broken".to_string(),
            ));
        }

        Ok(())
    }

    // ========== Interne ==========

    /// Fin de playlist atteinte : active la re-lecture automatique si armée
    fn handle_playlist_end(&mut self) -> Result<Option<PlaybackPosition>> {
        if !self.advisor.activate() {
            self.touch();
            self.notify(SessionEvent::PlaybackChanged { song_id: None });
            return Ok(None);
        }

        let suggestions = self.advisor.suggest(
            self.config.refill_count,
            &self.catalog,
            &self.ratings,
            &self.history,
            &self.skips,
            Utc::now(),
        );
        if suggestions.is_empty() {
            tracing::debug!("Auto-replay active but no candidate to inject");
            self.touch();
            self.notify(SessionEvent::PlaybackChanged { song_id: None });
            return Ok(None);
        }

        let injected = suggestions.len();
        let first = self.playlist.len();
        for suggestion in &suggestions {
            self.playlist.push(suggestion.song_id.as_str());
        }
        let song_id = self.playlist.jump_to(first)?.to_string();
        self.record(PlaybackAction::Play, &song_id);
        tracing::info!("Auto-replay activated: injected {} suggestions", injected);

        self.touch();
        self.notify(SessionEvent::AutoReplayActivated { injected });
        self.notify(SessionEvent::PlaylistChanged);
        self.notify(SessionEvent::PlaybackChanged {
            song_id: Some(song_id.clone()),
        });
        Ok(Some(PlaybackPosition {
            index: first,
            song_id,
        }))
    }

    fn record(&mut self, action: PlaybackAction, song_id: &str) {
        self.history
            .push(HistoryRecord::new(song_id, Utc::now(), action));
    }

    fn touch(&mut self) {
        self.last_change = Utc::now();
    }

    fn notify(&self, event: SessionEvent) {
        for callback in self.callbacks.values() {
            callback(&event);
        }
    }
}
