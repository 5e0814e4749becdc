//! Configuration d'une session
//!
//! La session est un objet explicite et constructible : pas de singleton de
//! configuration au niveau du process, chaque session porte la sienne.

use crate::advisor::AdvisorConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration d'une session de lecture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capacité H de l'historique de lecture (LIFO borné)
    pub history_capacity: usize,
    /// Capacité S du journal de sauts (FIFO borné)
    pub skip_capacity: usize,
    /// Borne supérieure de l'échelle de notation (`0.0..=rating_max`)
    pub rating_max: f32,
    /// Nombre de morceaux ré-injectés quand la re-lecture automatique
    /// s'active en fin de playlist
    pub refill_count: usize,
    pub advisor: AdvisorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            skip_capacity: 100,
            rating_max: 5.0,
            refill_count: 10,
            advisor: AdvisorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Valide les capacités, l'échelle de notation et la configuration du
    /// conseiller
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "history_capacity must be >= 1".to_string(),
            ));
        }
        if self.skip_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "skip_capacity must be >= 1".to_string(),
            ));
        }
        if !self.rating_max.is_finite() || self.rating_max <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "rating_max must be finite and > 0 (got {})",
                self.rating_max
            )));
        }
        if self.refill_count == 0 {
            return Err(Error::InvalidConfiguration(
                "refill_count must be >= 1".to_string(),
            ));
        }
        self.advisor.validate()
    }
}
