//! Playlist : file de lecture ordonnée (liste doublement chaînée en arène)
//!
//! Les entrées vivent dans une arène de slots réutilisables, reliés par des
//! indices prev/next plutôt que par des pointeurs : un unlink/relink ne peut
//! pas produire de lien pendant. Les doublons de morceaux sont permis, chaque
//! entrée a sa propre identité (son slot). Le curseur de lecture est porté par
//! la playlist elle-même et suit l'entrée — pas la position — lors des
//! réorganisations (reverse, move, sort).

use crate::{Error, Result};

#[derive(Debug, Clone)]
struct Slot {
    song_id: String,
    prev: Option<usize>,
    next: Option<usize>,
}

/// File de lecture avec curseur de lecture intégré
#[derive(Debug, Default)]
pub struct Playlist {
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
    cursor: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insère un morceau à la position donnée (erreur si index > len)
    ///
    /// O(1) une fois le successeur localisé, O(index) pour le localiser.
    pub fn insert_at(&mut self, index: usize, song_id: impl Into<String>) -> Result<()> {
        if index > self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }

        if index == self.len {
            self.push(song_id);
            return Ok(());
        }

        let succ = self.slot_index_at(index)?;
        let idx = self.alloc(song_id.into());
        self.attach_before(idx, succ);
        Ok(())
    }

    /// Ajoute un morceau en fin de file
    pub fn push(&mut self, song_id: impl Into<String>) {
        let idx = self.alloc(song_id.into());
        self.attach_tail(idx);
    }

    /// Retire l'entrée à la position donnée et retourne son id de morceau
    ///
    /// Les liens prédécesseur/successeur sont réparés atomiquement. Si
    /// l'entrée retirée était l'entrée courante, le curseur passe à son
    /// successeur (ou à rien en fin de file).
    pub fn remove_at(&mut self, index: usize) -> Result<String> {
        let idx = self.slot_index_at(index)?;
        self.unlink(idx)
            .ok_or_else(|| Error::Inconsistency(format!("unlink of occupied slot {idx} failed")))
    }

    /// Déplace l'entrée de `from` vers la position finale `to`, sans
    /// réallocation
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        if to >= self.len {
            return Err(Error::IndexOutOfRange {
                index: to,
                len: self.len,
            });
        }
        let idx = self.slot_index_at(from)?;
        if from == to {
            return Ok(());
        }

        self.detach(idx);
        if to == self.len {
            self.attach_tail(idx);
        } else {
            let succ = self.slot_index_at(to)?;
            self.attach_before(idx, succ);
        }
        Ok(())
    }

    /// Inverse la file en O(n) en retournant tous les liens
    pub fn reverse(&mut self) {
        let mut current = self.head;
        while let Some(idx) = current {
            let next = match self.slot_mut(idx) {
                Some(slot) => {
                    let next = slot.next;
                    std::mem::swap(&mut slot.prev, &mut slot.next);
                    next
                }
                None => None,
            };
            current = next;
        }
        std::mem::swap(&mut self.head, &mut self.tail);
    }

    /// Retire toutes les entrées référençant un morceau ; retourne le nombre
    /// d'entrées purgées
    pub fn purge(&mut self, song_id: &str) -> usize {
        let matching: Vec<usize> = self
            .iter_slots()
            .filter(|&idx| {
                self.slot(idx)
                    .map(|slot| slot.song_id == song_id)
                    .unwrap_or(false)
            })
            .collect();

        let count = matching.len();
        for idx in matching {
            self.unlink(idx);
        }
        count
    }

    /// Vide la file et oublie le curseur
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
        self.cursor = None;
    }

    // ========== Curseur de lecture ==========

    /// Id du morceau de l'entrée courante
    pub fn current_song(&self) -> Option<&str> {
        self.cursor
            .and_then(|idx| self.slot(idx))
            .map(|slot| slot.song_id.as_str())
    }

    /// Position (index) de l'entrée courante, O(n)
    pub fn current_index(&self) -> Option<usize> {
        let target = self.cursor?;
        self.iter_slots().position(|idx| idx == target)
    }

    /// Place le curseur sur l'entrée à la position donnée
    pub fn jump_to(&mut self, index: usize) -> Result<&str> {
        let idx = self.slot_index_at(index)?;
        self.cursor = Some(idx);
        self.slot(idx)
            .map(|slot| slot.song_id.as_str())
            .ok_or_else(|| Error::Inconsistency(format!("cursor on freed slot {idx}")))
    }

    /// Avance le curseur : successeur de l'entrée courante, ou tête de file
    /// si rien n'est en cours
    ///
    /// Retourne `None` quand la lecture dépasse la fin (le curseur est alors
    /// vidé — c'est le signal de fin de playlist pour le coordinateur).
    pub fn advance(&mut self) -> Option<&str> {
        self.cursor = match self.cursor {
            None => self.head,
            Some(idx) => self.slot(idx).and_then(|slot| slot.next),
        };
        self.current_song()
    }

    /// Recule le curseur sur le prédécesseur ; `None` (curseur vidé) en
    /// amont de la première entrée
    pub fn retreat(&mut self) -> Option<&str> {
        self.cursor = self
            .cursor
            .and_then(|idx| self.slot(idx).and_then(|slot| slot.prev));
        self.current_song()
    }

    /// Vide le curseur (plus d'entrée courante)
    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    /// Place le curseur sur la première entrée portant ce morceau
    ///
    /// Retourne `false` (curseur inchangé) si aucune entrée ne correspond.
    pub fn seek_song(&mut self, song_id: &str) -> bool {
        let found = self.iter_slots().find(|&idx| {
            self.slot(idx)
                .map(|slot| slot.song_id == song_id)
                .unwrap_or(false)
        });
        match found {
            Some(idx) => {
                self.cursor = Some(idx);
                true
            }
            None => false,
        }
    }

    // ========== Parcours ==========

    /// Parcourt les ids de morceaux dans l'ordre de la file
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter_slots()
            .filter_map(|idx| self.slot(idx))
            .map(|slot| slot.song_id.as_str())
    }

    fn iter_slots(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(self.head, move |&idx| {
            self.slot(idx).and_then(|slot| slot.next)
        })
    }

    // ========== Support du tri (relink sans réallocation) ==========

    /// Slots dans l'ordre courant de la file
    pub(crate) fn slots_in_order(&self) -> Vec<usize> {
        self.iter_slots().collect()
    }

    pub(crate) fn song_of_slot(&self, idx: usize) -> Option<&str> {
        self.slot(idx).map(|slot| slot.song_id.as_str())
    }

    /// Reconstruit les liens dans l'ordre donné : mêmes slots, aucune
    /// réallocation, le curseur continue de suivre son entrée
    pub(crate) fn relink(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.len);
        self.head = order.first().copied();
        self.tail = order.last().copied();
        for (pos, &idx) in order.iter().enumerate() {
            let prev = if pos == 0 { None } else { Some(order[pos - 1]) };
            let next = order.get(pos + 1).copied();
            if let Some(slot) = self.slot_mut(idx) {
                slot.prev = prev;
                slot.next = next;
            }
        }
    }

    /// Vérifie la cohérence des liens : parcours avant et arrière de
    /// longueur `len`, liens retour symétriques
    pub(crate) fn links_consistent(&self) -> bool {
        let mut count = 0;
        let mut prev: Option<usize> = None;
        let mut current = self.head;
        while let Some(idx) = current {
            let Some(slot) = self.slot(idx) else {
                return false;
            };
            if slot.prev != prev {
                return false;
            }
            prev = Some(idx);
            current = slot.next;
            count += 1;
            if count > self.len {
                return false; // cycle
            }
        }
        count == self.len && self.tail == prev
    }

    // ========== Arène ==========

    fn alloc(&mut self, song_id: String) -> usize {
        let slot = Slot {
            song_id,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                idx
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        }
    }

    fn slot(&self, idx: usize) -> Option<&Slot> {
        self.slots.get(idx).and_then(|slot| slot.as_ref())
    }

    fn slot_mut(&mut self, idx: usize) -> Option<&mut Slot> {
        self.slots.get_mut(idx).and_then(|slot| slot.as_mut())
    }

    /// Slot occupant la position donnée (erreur si hors bornes)
    fn slot_index_at(&self, index: usize) -> Result<usize> {
        if index >= self.len {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len,
            });
        }
        self.iter_slots()
            .nth(index)
            .ok_or_else(|| Error::Inconsistency(format!("broken links at index {index}")))
    }

    /// Détache un slot de la chaîne sans le libérer (les liens voisins sont
    /// réparés, le curseur reste sur le slot)
    fn detach(&mut self, idx: usize) {
        let Some((prev, next)) = self.slot(idx).map(|slot| (slot.prev, slot.next)) else {
            return;
        };
        match prev {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(slot) = self.slot_mut(n) {
                    slot.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(slot) = self.slot_mut(idx) {
            slot.prev = None;
            slot.next = None;
        }
        self.len -= 1;
    }

    fn attach_before(&mut self, idx: usize, succ: usize) {
        let pred = self.slot(succ).and_then(|slot| slot.prev);
        if let Some(slot) = self.slot_mut(idx) {
            slot.prev = pred;
            slot.next = Some(succ);
        }
        if let Some(slot) = self.slot_mut(succ) {
            slot.prev = Some(idx);
        }
        match pred {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.len += 1;
    }

    fn attach_tail(&mut self, idx: usize) {
        let pred = self.tail;
        if let Some(slot) = self.slot_mut(idx) {
            slot.prev = pred;
            slot.next = None;
        }
        match pred {
            Some(p) => {
                if let Some(slot) = self.slot_mut(p) {
                    slot.next = Some(idx);
                }
            }
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.len += 1;
    }

    /// Détache puis libère un slot ; ajuste le curseur s'il pointait dessus
    fn unlink(&mut self, idx: usize) -> Option<String> {
        let next = self.slot(idx).and_then(|slot| slot.next);
        self.detach(idx);
        if self.cursor == Some(idx) {
            self.cursor = next;
        }
        let slot = self.slots.get_mut(idx).and_then(Option::take)?;
        self.free.push(idx);
        Some(slot.song_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(playlist: &Playlist) -> Vec<&str> {
        playlist.iter().collect()
    }

    fn build(songs: &[&str]) -> Playlist {
        let mut playlist = Playlist::new();
        for song in songs {
            playlist.push(*song);
        }
        playlist
    }

    #[test]
    fn test_push_and_iter() {
        let playlist = build(&["a", "b", "c"]);
        assert_eq!(ids(&playlist), vec!["a", "b", "c"]);
        assert_eq!(playlist.len(), 3);
        assert!(playlist.links_consistent());
    }

    #[test]
    fn test_insert_at() {
        let mut playlist = build(&["a", "c"]);
        playlist.insert_at(1, "b").unwrap();
        playlist.insert_at(0, "z").unwrap();
        playlist.insert_at(4, "d").unwrap();
        assert_eq!(ids(&playlist), vec!["z", "a", "b", "c", "d"]);
        assert!(playlist.links_consistent());

        assert!(matches!(
            playlist.insert_at(6, "x"),
            Err(Error::IndexOutOfRange { index: 6, len: 5 })
        ));
    }

    #[test]
    fn test_remove_at_repairs_links() {
        let mut playlist = build(&["a", "b", "c"]);
        assert_eq!(playlist.remove_at(1).unwrap(), "b");
        assert_eq!(ids(&playlist), vec!["a", "c"]);
        assert!(playlist.links_consistent());

        assert_eq!(playlist.remove_at(0).unwrap(), "a");
        assert_eq!(playlist.remove_at(0).unwrap(), "c");
        assert!(playlist.is_empty());
        assert!(matches!(
            playlist.remove_at(0),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_duplicates_have_own_identity() {
        let mut playlist = build(&["a", "a", "a"]);
        playlist.remove_at(1).unwrap();
        assert_eq!(ids(&playlist), vec!["a", "a"]);
        assert_eq!(playlist.purge("a"), 2);
        assert!(playlist.is_empty());
    }

    #[test]
    fn test_reverse() {
        let mut playlist = build(&["a", "b", "c"]);
        playlist.reverse();
        assert_eq!(ids(&playlist), vec!["c", "b", "a"]);
        assert!(playlist.links_consistent());

        // Inverser une file vide ou à un élément est un no-op
        let mut single = build(&["x"]);
        single.reverse();
        assert_eq!(ids(&single), vec!["x"]);
    }

    #[test]
    fn test_reverse_then_move() {
        let mut playlist = build(&["a", "b", "c"]);
        playlist.reverse();
        assert_eq!(ids(&playlist), vec!["c", "b", "a"]);
        playlist.move_entry(0, 2).unwrap();
        assert_eq!(ids(&playlist), vec!["b", "a", "c"]);
        assert!(playlist.links_consistent());
    }

    #[test]
    fn test_move_entry_bounds() {
        let mut playlist = build(&["a", "b"]);
        assert!(matches!(
            playlist.move_entry(2, 0),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            playlist.move_entry(0, 2),
            Err(Error::IndexOutOfRange { .. })
        ));
        playlist.move_entry(1, 0).unwrap();
        assert_eq!(ids(&playlist), vec!["b", "a"]);
    }

    #[test]
    fn test_cursor_follows_entry_through_reverse() {
        let mut playlist = build(&["a", "b", "c"]);
        playlist.jump_to(0).unwrap();
        playlist.reverse();
        assert_eq!(playlist.current_song(), Some("a"));
        assert_eq!(playlist.current_index(), Some(2));
    }

    #[test]
    fn test_cursor_advance_and_retreat() {
        let mut playlist = build(&["a", "b"]);
        assert_eq!(playlist.advance(), Some("a"));
        assert_eq!(playlist.advance(), Some("b"));
        assert_eq!(playlist.advance(), None); // fin de file
        assert_eq!(playlist.current_song(), None);

        // Depuis rien, advance repart en tête
        assert_eq!(playlist.advance(), Some("a"));
        assert_eq!(playlist.retreat(), None); // en amont de la première
    }

    #[test]
    fn test_cursor_moves_to_successor_on_removal() {
        let mut playlist = build(&["a", "b", "c"]);
        playlist.jump_to(1).unwrap();
        playlist.remove_at(1).unwrap();
        assert_eq!(playlist.current_song(), Some("c"));

        playlist.jump_to(1).unwrap(); // "c", dernière entrée
        playlist.remove_at(1).unwrap();
        assert_eq!(playlist.current_song(), None);
    }

    #[test]
    fn test_slot_reuse_after_removal() {
        let mut playlist = build(&["a", "b"]);
        playlist.remove_at(0).unwrap();
        playlist.push("c");
        // Le slot libéré est réutilisé, l'arène ne grossit pas
        assert_eq!(playlist.slots.len(), 2);
        assert_eq!(ids(&playlist), vec!["b", "c"]);
        assert!(playlist.links_consistent());
    }

    #[test]
    fn test_seek_song() {
        let mut playlist = build(&["a", "b", "a"]);
        assert!(playlist.seek_song("a"));
        assert_eq!(playlist.current_index(), Some(0));
        assert!(!playlist.seek_song("zzz"));
        assert_eq!(playlist.current_index(), Some(0)); // inchangé
    }

    #[test]
    fn test_relink_keeps_cursor_on_entry() {
        let mut playlist = build(&["a", "b", "c"]);
        playlist.jump_to(2).unwrap();
        let mut order = playlist.slots_in_order();
        order.reverse();
        playlist.relink(&order);
        assert_eq!(ids(&playlist), vec!["c", "b", "a"]);
        assert_eq!(playlist.current_song(), Some("c"));
        assert_eq!(playlist.current_index(), Some(0));
        assert!(playlist.links_consistent());
    }
}
