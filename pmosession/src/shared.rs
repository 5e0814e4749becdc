//! Poignée partagée pour hôtes asynchrones
//!
//! La session est mono-écrivain : une mutation touche plusieurs composants
//! et doit rester atomique du point de vue des autres tâches. La poignée
//! enveloppe la session dans un `Arc<RwLock>` tokio : lectures concurrentes,
//! écritures exclusives, chaque opération couverte par une seule prise de
//! verrou.

use crate::config::SessionConfig;
use crate::session::Session;
use crate::song::Song;
use crate::Result;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Session partageable entre tâches tokio
///
/// Clonage bon marché (clone du `Arc`) ; toutes les copies pointent la même
/// session.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    /// Crée une session partagée vide
    pub fn new(config: SessionConfig) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(Session::new(config)?)),
        })
    }

    /// Crée une session partagée peuplée depuis un lot de départ
    pub fn with_seed(config: SessionConfig, songs: Vec<Song>) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(RwLock::new(Session::with_seed(config, songs)?)),
        })
    }

    /// Enveloppe une session existante
    pub fn from_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }

    /// Exécute une lecture sous verrou partagé
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Session) -> T,
    {
        let guard = self.inner.read().await;
        f(&guard)
    }

    /// Exécute une mutation sous verrou exclusif
    ///
    /// Toute la mutation s'exécute sous une seule prise de verrou : les
    /// lecteurs ne voient jamais d'état intermédiaire.
    pub async fn write<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Session) -> T,
    {
        let mut guard = self.inner.write().await;
        f(&mut guard)
    }
}
