//! RatingIndex : projection ordonnée des morceaux par note
//!
//! L'index est une structure dérivée : la note portée par le morceau dans le
//! catalogue fait foi, l'index ne doit jamais en diverger. Il est adossé à un
//! `BTreeMap`, un arbre ordonné équilibré garantissant O(log n) au pire cas —
//! un arbre binaire non équilibré dégénérerait en O(n) sous des insertions de
//! notes monotones, l'équilibrage est donc un choix de conception requis.

use std::collections::BTreeMap;

/// Quantifie une note au dixième
pub(crate) fn quantize(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Clé de bucket : note quantifiée au dixième, en dixièmes
fn bucket_key(value: f32) -> u32 {
    (value.max(0.0) * 10.0).round() as u32
}

fn key_to_rating(key: u32) -> f32 {
    key as f32 / 10.0
}

/// Index ordonné note → ids de morceaux
///
/// Chaque bucket conserve l'ordre d'affectation des notes : les égalités de
/// `top_n` se départagent par ordre d'affectation le plus ancien.
#[derive(Debug, Default)]
pub struct RatingIndex {
    buckets: BTreeMap<u32, Vec<String>>,
}

impl RatingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insère un id dans le bucket de la note donnée
    ///
    /// Sans effet si l'id y figure déjà. L'appelant doit avoir retiré l'id
    /// de son ancien bucket au préalable (un id appartient à au plus un
    /// bucket).
    pub fn insert(&mut self, rating: f32, id: &str) {
        let bucket = self.buckets.entry(bucket_key(rating)).or_default();
        if !bucket.iter().any(|existing| existing == id) {
            bucket.push(id.to_string());
        }
    }

    /// Retire un id du bucket de la note donnée (idempotent)
    pub fn remove(&mut self, rating: f32, id: &str) {
        let key = bucket_key(rating);
        if let Some(bucket) = self.buckets.get_mut(&key) {
            bucket.retain(|existing| existing != id);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Séquence paresseuse et relançable des ids dont la note est dans
    /// `[min, max]`, par note croissante puis ordre d'insertion dans chaque
    /// bucket
    pub fn range(&self, min: f32, max: f32) -> impl Iterator<Item = (f32, &str)> + '_ {
        let lo = bucket_key(min);
        let hi = bucket_key(max);
        // Demi-ouvert pour rester valide quand min > max (séquence vide).
        // Borne saturée : `bucket_key` plafonne les max démesurés à
        // `u32::MAX`, clé qu'aucune note validée (bornée par un
        // `rating_max` fini) ne peut occuper
        let end = if hi >= lo { hi.saturating_add(1) } else { lo };
        self.buckets.range(lo..end).flat_map(|(key, ids)| {
            let rating = key_to_rating(*key);
            ids.iter().map(move |id| (rating, id.as_str()))
        })
    }

    /// Les n ids les mieux notés, du plus haut au plus bas
    ///
    /// Égalités départagées par ordre d'affectation de note le plus ancien.
    pub fn top_n(&self, n: usize) -> Vec<String> {
        let mut out = Vec::new();
        for ids in self.buckets.values().rev() {
            for id in ids {
                if out.len() == n {
                    return out;
                }
                out.push(id.clone());
            }
        }
        out
    }

    /// Note du bucket contenant l'id, s'il y en a un (audit de cohérence)
    pub fn bucket_of(&self, id: &str) -> Option<f32> {
        self.buckets.iter().find_map(|(key, ids)| {
            ids.iter()
                .any(|existing| existing == id)
                .then(|| key_to_rating(*key))
        })
    }

    /// Nombre total d'ids indexés
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Parcourt les buckets par note croissante (export, audit)
    pub fn buckets(&self) -> impl Iterator<Item = (f32, &[String])> + '_ {
        self.buckets
            .iter()
            .map(|(key, ids)| (key_to_rating(*key), ids.as_slice()))
    }
}
