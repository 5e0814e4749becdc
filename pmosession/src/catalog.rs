//! Catalog : magasin canonique des morceaux, indexé par id

use crate::rating::quantize;
use crate::song::Song;
use crate::{Error, Result};
use std::collections::HashMap;

/// Delta de notation retourné par [`Catalog::set_rating`]
///
/// Le coordinateur s'en sert pour déplacer l'id de morceau de son ancien
/// bucket de l'index vers le nouveau.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingChange {
    pub previous: Option<f32>,
    pub new: f32,
}

/// Magasin canonique des morceaux (lookup/insertion/suppression O(1) moyen)
#[derive(Debug)]
pub struct Catalog {
    songs: HashMap<String, Song>,
    rating_max: f32,
}

impl Catalog {
    /// Crée un catalogue vide avec l'échelle de notation `0.0..=rating_max`
    pub fn new(rating_max: f32) -> Self {
        Self {
            songs: HashMap::new(),
            rating_max,
        }
    }

    /// Ajoute un morceau (erreur si l'id existe déjà)
    ///
    /// Une note éventuellement portée par le morceau est validée puis
    /// quantifiée au dixième avant stockage.
    pub fn add(&mut self, mut song: Song) -> Result<()> {
        if let Some(rating) = song.rating {
            self.check_rating(rating)?;
            song.rating = Some(quantize(rating));
        }
        if self.songs.contains_key(&song.id) {
            return Err(Error::DuplicateId(song.id));
        }
        self.songs.insert(song.id.clone(), song);
        Ok(())
    }

    /// Récupère un morceau (erreur si absent)
    pub fn get(&self, id: &str) -> Result<&Song> {
        self.songs
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Variante tolérante : `None` si absent
    ///
    /// Utilisée par les vues qui doivent rendre les références tombstone
    /// comme "removed" au lieu d'échouer.
    pub fn lookup(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.songs.contains_key(id)
    }

    /// Supprime un morceau et le retourne (erreur si absent)
    ///
    /// L'appelant (le coordinateur) est responsable de la purge en cascade
    /// dans les structures dérivées.
    pub fn remove(&mut self, id: &str) -> Result<Song> {
        self.songs
            .remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Écrase la note d'un morceau et retourne le delta ancien/nouveau
    ///
    /// La valeur est quantifiée au dixième : c'est la valeur quantifiée qui
    /// fait foi, pour que le catalogue et l'index de notation ne puissent
    /// jamais diverger.
    pub fn set_rating(&mut self, id: &str, value: f32) -> Result<RatingChange> {
        self.check_rating(value)?;
        let quantized = quantize(value);
        let song = self
            .songs
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        let previous = song.rating.replace(quantized);
        Ok(RatingChange {
            previous,
            new: quantized,
        })
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Parcourt tous les morceaux (ordre non spécifié)
    pub fn iter(&self) -> impl Iterator<Item = &Song> {
        self.songs.values()
    }

    fn check_rating(&self, value: f32) -> Result<()> {
        if !value.is_finite() || value < 0.0 || value > self.rating_max {
            return Err(Error::InvalidRating {
                value,
                max: self.rating_max,
            });
        }
        Ok(())
    }
}
