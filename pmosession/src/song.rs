//! Song : fiche canonique d'un morceau du catalogue

use serde::{Deserialize, Serialize};

/// Un morceau du catalogue
///
/// La copie canonique vit uniquement dans le [`Catalog`](crate::Catalog) ;
/// toutes les autres structures (playlist, index de notation, journaux) ne
/// stockent que l'`id`, jamais un duplicata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    /// Identifiant unique et immuable
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration_secs: Option<u64>,
    pub genre: Option<String>,
    pub year: Option<u32>,
    /// Localisation de la source (URL ou chemin de fichier)
    pub source_url: Option<String>,
    /// Note, quantifiée au dixième sur l'échelle configurée de la session
    pub rating: Option<f32>,
}

impl Song {
    /// Crée un morceau minimal (champs descriptifs à `None`)
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: None,
            album: None,
            duration_secs: None,
            genre: None,
            year: None,
            source_url: None,
            rating: None,
        }
    }
}
