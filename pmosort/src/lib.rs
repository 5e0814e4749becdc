//! # pmosort - Algorithmes de tri sans état
//!
//! Cette crate fournit trois algorithmes de tri à choix de l'appelant,
//! avec des contrats explicites :
//!
//! - **Merge** : stable (les éléments de clés égales conservent leur ordre
//!   relatif d'origine — c'est un contrat, pas un détail d'implémentation),
//!   O(n log n) en temps, O(n) en espace auxiliaire
//! - **Quick** : en place, O(n log n) en moyenne, O(n²) au pire cas sur des
//!   pivots adverses, non stable
//! - **Heap** : en place, O(n log n) au pire cas, non stable
//!
//! Les trois algorithmes produisent une sortie identique pour des clés
//! strictement ordonnées.
//!
//! # Exemple
//!
//! ```
//! use pmosort::{sort_by_key, Algorithm, Order};
//!
//! let mut values = vec![3, 1, 2];
//! sort_by_key(&mut values, Algorithm::Merge, Order::Ascending, |v| *v);
//! assert_eq!(values, vec![1, 2, 3]);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Erreur de parsing d'un nom d'algorithme
#[derive(Debug, thiserror::Error)]
#[error("Unknown sort algorithm: {0}")]
pub struct UnknownAlgorithm(String);

/// Erreur de parsing d'un sens de tri
#[derive(Debug, thiserror::Error)]
#[error("Unknown sort order: {0}")]
pub struct UnknownOrder(String);

/// Algorithme de tri sélectionné par l'appelant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Merge,
    Quick,
    Heap,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Merge => "merge",
            Algorithm::Quick => "quick",
            Algorithm::Heap => "heap",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(Algorithm::Merge),
            "quick" => Ok(Algorithm::Quick),
            "heap" => Ok(Algorithm::Heap),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

impl Serialize for Algorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Algorithm::from_str(&value).map_err(serde::de::Error::custom)
    }
}

/// Sens de tri
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Ascending => "ascending",
            Order::Descending => "descending",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = UnknownOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(Order::Ascending),
            "descending" | "desc" => Ok(Order::Descending),
            other => Err(UnknownOrder(other.to_string())),
        }
    }
}

impl Serialize for Order {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Order {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Order::from_str(&value).map_err(serde::de::Error::custom)
    }
}

/// Trie une séquence avec le comparateur fourni
///
/// Le choix de l'algorithme appartient à l'appelant. Seul `Merge` garantit
/// la stabilité pour les clés égales.
pub fn sort_by<T, F>(items: &mut [T], algorithm: Algorithm, mut compare: F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    match algorithm {
        Algorithm::Merge => merge_sort(items, &mut compare),
        Algorithm::Quick => quick_sort(items, &mut compare),
        Algorithm::Heap => heap_sort(items, &mut compare),
    }
}

/// Trie une séquence par clé extraite, dans le sens demandé
pub fn sort_by_key<T, K, F>(items: &mut [T], algorithm: Algorithm, order: Order, mut key: F)
where
    T: Clone,
    K: Ord,
    F: FnMut(&T) -> K,
{
    match order {
        Order::Ascending => sort_by(items, algorithm, |a, b| key(a).cmp(&key(b))),
        Order::Descending => sort_by(items, algorithm, |a, b| key(b).cmp(&key(a))),
    }
}

/// Tri fusion : stable, O(n log n), tampon auxiliaire O(n)
fn merge_sort<T, F>(items: &mut [T], compare: &mut F)
where
    T: Clone,
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len <= 1 {
        return;
    }

    let mid = len / 2;
    merge_sort(&mut items[..mid], compare);
    merge_sort(&mut items[mid..], compare);

    let mut merged = Vec::with_capacity(len);
    {
        let (left, right) = items.split_at(mid);
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            // `!= Greater` fait passer la gauche en premier à clés égales :
            // c'est ce qui garantit la stabilité
            if compare(&left[i], &right[j]) != Ordering::Greater {
                merged.push(left[i].clone());
                i += 1;
            } else {
                merged.push(right[j].clone());
                j += 1;
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
    }
    items.clone_from_slice(&merged);
}

/// Tri rapide : en place, O(n log n) moyen, non stable
fn quick_sort<T, F>(items: &mut [T], compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() <= 1 {
        return;
    }

    let pivot = partition(items, compare);
    let (left, right) = items.split_at_mut(pivot);
    quick_sort(left, compare);
    quick_sort(&mut right[1..], compare);
}

/// Partition de Lomuto avec pivot médiane-de-trois (évite la dégénérescence
/// sur les séquences déjà triées, croissantes comme décroissantes)
fn partition<T, F>(items: &mut [T], compare: &mut F) -> usize
where
    F: FnMut(&T, &T) -> Ordering,
{
    let hi = items.len() - 1;
    let mid = items.len() / 2;
    // Ordonne premier/milieu/dernier : minimum en 0, maximum en hi,
    // médiane en mid
    if compare(&items[mid], &items[0]) == Ordering::Less {
        items.swap(mid, 0);
    }
    if compare(&items[hi], &items[0]) == Ordering::Less {
        items.swap(hi, 0);
    }
    if compare(&items[hi], &items[mid]) == Ordering::Less {
        items.swap(hi, mid);
    }
    // La médiane devient le pivot en position hi
    items.swap(mid, hi);

    let mut store = 0;
    for i in 0..hi {
        if compare(&items[i], &items[hi]) == Ordering::Less {
            items.swap(i, store);
            store += 1;
        }
    }
    items.swap(store, hi);
    store
}

/// Tri par tas : en place, O(n log n) au pire cas, non stable
fn heap_sort<T, F>(items: &mut [T], compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let len = items.len();
    if len <= 1 {
        return;
    }

    for start in (0..len / 2).rev() {
        sift_down(items, start, len, compare);
    }

    for end in (1..len).rev() {
        items.swap(0, end);
        sift_down(items, 0, end, compare);
    }
}

fn sift_down<T, F>(items: &mut [T], mut root: usize, end: usize, compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && compare(&items[child], &items[child + 1]) == Ordering::Less {
            child += 1;
        }
        if compare(&items[root], &items[child]) == Ordering::Less {
            items.swap(root, child);
            root = child;
        } else {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Algorithm; 3] = [Algorithm::Merge, Algorithm::Quick, Algorithm::Heap];

    #[test]
    fn test_empty_and_single() {
        for algorithm in ALL {
            let mut empty: Vec<i32> = vec![];
            sort_by_key(&mut empty, algorithm, Order::Ascending, |v| *v);
            assert!(empty.is_empty());

            let mut single = vec![42];
            sort_by_key(&mut single, algorithm, Order::Ascending, |v| *v);
            assert_eq!(single, vec![42]);
        }
    }

    #[test]
    fn test_all_algorithms_agree_on_distinct_keys() {
        let input = vec![9, 3, 7, 1, 8, 2, 6, 4, 5, 0];
        for algorithm in ALL {
            let mut values = input.clone();
            sort_by_key(&mut values, algorithm, Order::Ascending, |v| *v);
            assert_eq!(values, (0..10).collect::<Vec<_>>(), "{algorithm}");
        }
    }

    #[test]
    fn test_descending_order() {
        for algorithm in ALL {
            let mut values = vec![2, 5, 1, 4, 3];
            sort_by_key(&mut values, algorithm, Order::Descending, |v| *v);
            assert_eq!(values, vec![5, 4, 3, 2, 1], "{algorithm}");
        }
    }

    #[test]
    fn test_sorting_is_idempotent() {
        for algorithm in ALL {
            let mut values = vec![4, 1, 3, 2];
            sort_by_key(&mut values, algorithm, Order::Ascending, |v| *v);
            let once = values.clone();
            sort_by_key(&mut values, algorithm, Order::Ascending, |v| *v);
            assert_eq!(values, once, "{algorithm}");
        }
    }

    #[test]
    fn test_merge_sort_stability() {
        // Deux éléments de clé égale : leur ordre relatif d'origine
        // doit être conservé
        let mut pairs = vec![(2, "a"), (1, "x"), (2, "b"), (1, "y"), (2, "c")];
        sort_by_key(&mut pairs, Algorithm::Merge, Order::Ascending, |p| p.0);
        assert_eq!(
            pairs,
            vec![(1, "x"), (1, "y"), (2, "a"), (2, "b"), (2, "c")]
        );
    }

    #[test]
    fn test_quick_sort_on_sorted_input() {
        // Séquence déjà triée : la médiane-de-trois doit éviter le pire cas
        // pathologique et produire le même résultat
        let mut values: Vec<i32> = (0..100).collect();
        sort_by_key(&mut values, Algorithm::Quick, Order::Ascending, |v| *v);
        assert_eq!(values, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_quick_sort_on_reverse_sorted_input() {
        // Séquence décroissante : l'autre cas dégénéré du choix de pivot
        let mut values: Vec<i32> = (0..100).rev().collect();
        sort_by_key(&mut values, Algorithm::Quick, Order::Ascending, |v| *v);
        assert_eq!(values, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_quick_sort_small_slices() {
        // Tailles 2 et 3 : chemins limites de la médiane-de-trois
        let mut pair = vec![2, 1];
        sort_by_key(&mut pair, Algorithm::Quick, Order::Ascending, |v| *v);
        assert_eq!(pair, vec![1, 2]);

        let mut triple = vec![3, 1, 2];
        sort_by_key(&mut triple, Algorithm::Quick, Order::Ascending, |v| *v);
        assert_eq!(triple, vec![1, 2, 3]);
    }

    #[test]
    fn test_heap_sort_with_duplicates() {
        let mut values = vec![3, 1, 3, 2, 1, 3, 2];
        sort_by_key(&mut values, Algorithm::Heap, Order::Ascending, |v| *v);
        assert_eq!(values, vec![1, 1, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn test_algorithm_round_trip() {
        for algorithm in ALL {
            let parsed: Algorithm = algorithm.as_str().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }
        assert!("bogus".parse::<Algorithm>().is_err());
        assert_eq!("desc".parse::<Order>().unwrap(), Order::Descending);
    }
}
