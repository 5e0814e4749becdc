//! AutoReplayAdvisor : scoring des candidats à la re-lecture automatique
//!
//! Le score d'un candidat combine sa note, la récence de sa dernière lecture
//! et une pénalité de sauts récents :
//!
//! `score = w_rating·note + w_recency·décroissance(dernière lecture) − w_skip·sauts récents`
//!
//! La décroissance de récence est exponentielle, paramétrée par une demi-vie.
//! Un morceau sauté plus de `skip_threshold` fois dans la fenêtre de
//! refroidissement est exclu des suggestions tant que ses sauts n'ont pas
//! vieilli hors de la fenêtre.

use crate::catalog::Catalog;
use crate::history::HistoryStack;
use crate::rating::RatingIndex;
use crate::skips::SkipTracker;
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// État d'activation de la re-lecture automatique
///
/// `enable()` fait passer de `Disabled` à `Armed` ; le coordinateur fait
/// passer de `Armed` à `Active` quand la lecture atteint la fin de la
/// playlist ; `disable()` ramène à `Disabled` depuis n'importe quel état.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdvisorState {
    #[default]
    Disabled,
    Armed,
    Active,
}

impl AdvisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorState::Disabled => "disabled",
            AdvisorState::Armed => "armed",
            AdvisorState::Active => "active",
        }
    }
}

impl fmt::Display for AdvisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdvisorState {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" => Ok(AdvisorState::Disabled),
            "armed" => Ok(AdvisorState::Armed),
            "active" => Ok(AdvisorState::Active),
            _ => Err(()),
        }
    }
}

impl Serialize for AdvisorState {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AdvisorState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        AdvisorState::from_str(&value)
            .map_err(|_| serde::de::Error::custom(format!("unknown advisor state: {value}")))
    }
}

/// Pondérations et fenêtres du conseiller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub rating_weight: f64,
    pub recency_weight: f64,
    pub skip_weight: f64,
    /// Demi-vie (secondes) de la décroissance de récence
    pub recency_half_life_secs: f64,
    /// Fenêtre de refroidissement pendant laquelle un saut pénalise
    pub cooldown_secs: u64,
    /// Nombre de sauts récents toléré avant exclusion
    pub skip_threshold: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            rating_weight: 1.0,
            recency_weight: 0.5,
            skip_weight: 1.0,
            recency_half_life_secs: 3600.0,
            cooldown_secs: 1800,
            skip_threshold: 0,
        }
    }
}

impl AdvisorConfig {
    /// Valide les pondérations et la demi-vie
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("rating_weight", self.rating_weight),
            ("recency_weight", self.recency_weight),
            ("skip_weight", self.skip_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "{name} must be finite and >= 0 (got {value})"
                )));
            }
        }
        if !self.recency_half_life_secs.is_finite() || self.recency_half_life_secs <= 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "recency_half_life_secs must be finite and > 0 (got {})",
                self.recency_half_life_secs
            )));
        }
        Ok(())
    }
}

/// Candidat retourné par [`ReplayAdvisor::suggest`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub song_id: String,
    pub score: f64,
}

/// Conseiller de re-lecture : scoring sans état, plus une petite machine à
/// états d'activation
#[derive(Debug)]
pub struct ReplayAdvisor {
    config: AdvisorConfig,
    state: AdvisorState,
}

impl ReplayAdvisor {
    pub fn new(config: AdvisorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: AdvisorState::Disabled,
        })
    }

    pub fn state(&self) -> AdvisorState {
        self.state
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// `Disabled` → `Armed` (sans effet depuis les autres états)
    pub fn enable(&mut self) {
        if self.state == AdvisorState::Disabled {
            self.state = AdvisorState::Armed;
        }
    }

    /// Retour à `Disabled` depuis n'importe quel état
    pub fn disable(&mut self) {
        self.state = AdvisorState::Disabled;
    }

    /// Transition de fin de playlist : `Armed` → `Active`
    ///
    /// Retourne `true` si le conseiller est actif après l'appel (le
    /// coordinateur doit alors ré-alimenter la playlist).
    pub(crate) fn activate(&mut self) -> bool {
        match self.state {
            AdvisorState::Armed => {
                self.state = AdvisorState::Active;
                true
            }
            AdvisorState::Active => true,
            AdvisorState::Disabled => false,
        }
    }

    /// Score d'un candidat (fonction pure)
    pub fn score(
        &self,
        rating: f32,
        last_played: Option<DateTime<Utc>>,
        recent_skips: usize,
        now: DateTime<Utc>,
    ) -> f64 {
        let recency = match last_played {
            Some(at) => {
                let age_secs = (now - at).num_seconds().max(0) as f64;
                (-age_secs * std::f64::consts::LN_2 / self.config.recency_half_life_secs).exp()
            }
            None => 0.0,
        };
        self.config.rating_weight * f64::from(rating) + self.config.recency_weight * recency
            - self.config.skip_weight * recent_skips as f64
    }

    /// Les n meilleurs candidats par score décroissant
    ///
    /// Le bassin de candidats est l'ensemble des morceaux notés (énumérés
    /// via l'index de notation). Un id qui ne résout plus au catalogue est
    /// ignoré. Les égalités de score conservent l'ordre de `top_n` (note la
    /// plus haute d'abord).
    pub fn suggest(
        &self,
        n: usize,
        catalog: &Catalog,
        ratings: &RatingIndex,
        history: &HistoryStack,
        skips: &SkipTracker,
        now: DateTime<Utc>,
    ) -> Vec<Suggestion> {
        let cooldown = Duration::seconds(self.config.cooldown_secs.min(i64::MAX as u64) as i64);

        let mut candidates: Vec<Suggestion> = ratings
            .top_n(usize::MAX)
            .into_iter()
            .filter_map(|song_id| {
                let song = catalog.lookup(&song_id)?;
                let recent = skips.recent_count(&song_id, cooldown, now);
                if recent > self.config.skip_threshold {
                    return None; // en refroidissement
                }
                let score = self.score(
                    song.rating.unwrap_or(0.0),
                    history.last_played(&song_id),
                    recent,
                    now,
                );
                Some(Suggestion { song_id, score })
            })
            .collect();

        // Tri stable : les égalités gardent l'ordre note décroissante
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(n);
        candidates
    }
}
