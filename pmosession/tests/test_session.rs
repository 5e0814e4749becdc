use pmosession::{
    AdvisorState, Algorithm, Error, Order, PlaybackAction, Session, SessionConfig, SharedSession,
    Song, SortKey,
};

/// Construit une session avec un petit catalogue varié
fn seeded_session() -> Session {
    let songs = vec![
        song("a", "Aqueous", Some("Incubus"), Some(2001), Some(467)),
        song("b", "Breathe", Some("Pink Floyd"), Some(1973), Some(169)),
        song("c", "Clocks", Some("Coldplay"), Some(2002), Some(307)),
        song("d", "Dreams", Some("Fleetwood Mac"), Some(1977), Some(257)),
    ];
    Session::with_seed(SessionConfig::default(), songs).unwrap()
}

fn song(
    id: &str,
    title: &str,
    artist: Option<&str>,
    year: Option<u32>,
    duration: Option<u64>,
) -> Song {
    let mut song = Song::new(id, title);
    song.artist = artist.map(str::to_string);
    song.year = year;
    song.duration_secs = duration;
    song
}

fn playlist_ids(session: &Session) -> Vec<String> {
    session
        .current_view()
        .into_iter()
        .map(|item| item.song_id)
        .collect()
}

#[test]
fn test_remove_song_purges_playlist_and_index() {
    let mut session = seeded_session();
    session.rate_song("a", 4.0).unwrap();
    session.rate_song("b", 3.0).unwrap();
    for id in ["a", "b", "a", "c"] {
        session.enqueue(id).unwrap();
    }

    session.remove_song("a").unwrap();

    // Toutes les occurrences de "a" sont purgées, l'ordre relatif des
    // autres entrées est préservé
    assert_eq!(playlist_ids(&session), vec!["b", "c"]);
    assert_eq!(session.top_rated(10), vec!["b"]);
    assert!(matches!(session.song("a"), Err(Error::NotFound(_))));
    session.audit().unwrap();
}

#[test]
fn test_rating_index_tracks_catalog_exactly() {
    let mut session = seeded_session();
    session.rate_song("a", 2.0).unwrap();
    session.rate_song("b", 2.0).unwrap();
    session.rate_song("c", 4.5).unwrap();
    session.rate_song("a", 5.0).unwrap(); // re-notation

    // Plage inclusive, note croissante
    let in_range: Vec<String> = session
        .songs_by_rating(2.0, 4.5)
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(in_range, vec!["b", "c"]);

    // top-n par note décroissante
    assert_eq!(session.top_rated(2), vec!["a", "c"]);

    // Plage inversée : séquence vide, pas d'erreur
    assert_eq!(session.songs_by_rating(4.0, 1.0).count(), 0);

    session.audit().unwrap();
}

#[test]
fn test_open_ended_rating_query() {
    let mut session = seeded_session();
    session.rate_song("a", 5.0).unwrap();
    session.rate_song("b", 1.5).unwrap();

    // "Tout au-dessus de min" exprimé avec un max démesuré
    let all: Vec<String> = session
        .songs_by_rating(0.0, f32::MAX)
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(all, vec!["b", "a"]);

    let high: Vec<String> = session
        .songs_by_rating(2.0, f32::MAX)
        .map(|s| s.id.clone())
        .collect();
    assert_eq!(high, vec!["a"]);
}

#[test]
fn test_rating_validation() {
    let mut session = seeded_session();
    assert!(matches!(
        session.rate_song("a", 5.5),
        Err(Error::InvalidRating { .. })
    ));
    assert!(matches!(
        session.rate_song("a", -0.5),
        Err(Error::InvalidRating { .. })
    ));
    assert!(matches!(
        session.rate_song("ghost", 3.0),
        Err(Error::NotFound(_))
    ));
    // L'échec ne laisse aucune trace dans l'index
    assert!(session.top_rated(10).is_empty());
}

#[test]
fn test_history_capacity_eviction() {
    let config = SessionConfig {
        history_capacity: 3,
        ..SessionConfig::default()
    };
    let mut session = Session::with_seed(
        config,
        vec![song("a", "A", None, None, None), song("b", "B", None, None, None)],
    )
    .unwrap();
    session.enqueue("a").unwrap();
    session.enqueue("b").unwrap();

    // 5 transitions pour une capacité de 3 : les plus anciennes s'évincent
    for _ in 0..5 {
        session.play(0).unwrap();
    }
    session.play(1).unwrap();

    let export = session.export();
    assert_eq!(export.history.len(), 3);
    // Le sommet (dernier élément) est la transition la plus récente
    assert_eq!(export.history.last().unwrap().song_id, "b");
    assert_eq!(session.last_transition().unwrap().song_id, "b");
}

#[test]
fn test_undo_walks_back_through_history() {
    let mut session = seeded_session();
    for id in ["a", "b", "c"] {
        session.enqueue(id).unwrap();
    }

    session.play(0).unwrap();
    session.next().unwrap();
    session.next().unwrap();
    assert_eq!(session.position().unwrap().song_id, "c");

    let undone = session.undo().unwrap();
    assert_eq!(undone.song_id, "c");
    assert_eq!(undone.action, PlaybackAction::Play);
    assert_eq!(session.position().unwrap().song_id, "b");

    session.undo().unwrap();
    assert_eq!(session.position().unwrap().song_id, "a");

    // Dernier undo : historique vide, plus rien en cours
    session.undo().unwrap();
    assert_eq!(session.position(), None);
    assert!(matches!(session.undo(), Err(Error::EmptyHistory)));
}

#[test]
fn test_skip_records_and_advances() {
    let mut session = seeded_session();
    session.enqueue("a").unwrap();
    session.enqueue("b").unwrap();

    session.play(0).unwrap();
    let position = session.skip().unwrap().unwrap();
    assert_eq!(position.song_id, "b");

    let skips = session.recent_skips(10);
    assert_eq!(skips.len(), 1);
    assert_eq!(skips[0].song_id, "a");
    // Le saut est aussi une transition d'historique
    let export = session.export();
    assert!(export
        .history
        .iter()
        .any(|r| r.song_id == "a" && r.action == PlaybackAction::Skip));
}

#[test]
fn test_reverse_then_move() {
    let mut session = seeded_session();
    for id in ["a", "b", "c"] {
        session.enqueue(id).unwrap();
    }
    session.play(1).unwrap(); // curseur sur "b"

    session.reverse_playlist();
    assert_eq!(playlist_ids(&session), vec!["c", "b", "a"]);
    // Le curseur suit son entrée, pas son index
    assert_eq!(session.position().unwrap().song_id, "b");

    session.move_entry(0, 2).unwrap();
    assert_eq!(playlist_ids(&session), vec!["b", "a", "c"]);
    assert_eq!(session.position().unwrap().song_id, "b");
    assert_eq!(session.position().unwrap().index, 0);

    session.audit().unwrap();
}

#[test]
fn test_move_entry_bounds() {
    let mut session = seeded_session();
    session.enqueue("a").unwrap();
    session.enqueue("b").unwrap();

    assert!(matches!(
        session.move_entry(5, 0),
        Err(Error::IndexOutOfRange { .. })
    ));
    assert!(matches!(
        session.move_entry(0, 5),
        Err(Error::IndexOutOfRange { .. })
    ));
    // L'échec ne modifie pas l'ordre
    assert_eq!(playlist_ids(&session), vec!["a", "b"]);
}

#[test]
fn test_sort_playlist_all_algorithms_agree() {
    for algorithm in [Algorithm::Merge, Algorithm::Quick, Algorithm::Heap] {
        let mut session = seeded_session();
        for id in ["c", "a", "d", "b"] {
            session.enqueue(id).unwrap();
        }

        session
            .sort_playlist(SortKey::Year, Order::Ascending, algorithm)
            .unwrap();
        assert_eq!(
            playlist_ids(&session),
            vec!["b", "d", "a", "c"],
            "algorithm {algorithm}"
        );

        session
            .sort_playlist(SortKey::Title, Order::Descending, algorithm)
            .unwrap();
        assert_eq!(playlist_ids(&session), vec!["d", "c", "b", "a"]);
        session.audit().unwrap();
    }
}

#[test]
fn test_sort_keeps_cursor_on_entry() {
    let mut session = seeded_session();
    for id in ["c", "a", "b"] {
        session.enqueue(id).unwrap();
    }
    session.play(0).unwrap(); // "c"

    session
        .sort_playlist(SortKey::Title, Order::Ascending, Algorithm::Quick)
        .unwrap();

    assert_eq!(playlist_ids(&session), vec!["a", "b", "c"]);
    let position = session.position().unwrap();
    assert_eq!(position.song_id, "c");
    assert_eq!(position.index, 2);
}

#[test]
fn test_auto_replay_full_cycle() {
    let mut session = seeded_session();
    session.rate_song("a", 5.0).unwrap();
    session.rate_song("b", 4.0).unwrap();
    session.rate_song("c", 3.0).unwrap();
    session.enqueue("d").unwrap();

    // Désactivée : la fin de playlist est un simple arrêt
    session.play(0).unwrap();
    assert_eq!(session.next().unwrap(), None);
    assert_eq!(session.playlist_len(), 1);

    // Armée : la fin de playlist déclenche l'injection
    session.enable_auto_replay();
    assert_eq!(session.auto_replay_state(), AdvisorState::Armed);
    session.play(0).unwrap();
    let position = session.next().unwrap().expect("refill");
    assert_eq!(session.auto_replay_state(), AdvisorState::Active);
    assert_eq!(position.song_id, "a"); // meilleure note d'abord
    assert_eq!(session.playlist_len(), 4);

    // Désactivation : retour à l'arrêt simple en fin de playlist
    session.disable_auto_replay();
    assert_eq!(session.auto_replay_state(), AdvisorState::Disabled);
}

#[test]
fn test_suggestions_exclude_recently_skipped() {
    let mut session = seeded_session();
    session.rate_song("a", 5.0).unwrap();
    session.rate_song("b", 4.0).unwrap();
    session.enqueue("a").unwrap();
    session.enqueue("b").unwrap();

    session.play(0).unwrap();
    session.skip().unwrap(); // "a" vient d'être sauté

    let ids: Vec<String> = session
        .suggestions(10)
        .into_iter()
        .map(|s| s.song_id)
        .collect();
    assert!(!ids.contains(&"a".to_string()));
    assert!(ids.contains(&"b".to_string()));
}

#[test]
fn test_export_roundtrip_and_tombstones() {
    let mut session = seeded_session();
    session.rate_song("a", 4.5).unwrap();
    session.enqueue("a").unwrap();
    session.enqueue("b").unwrap();
    session.play(0).unwrap();
    session.skip().unwrap();
    session.remove_song("a").unwrap();

    let json = session.export_json().unwrap();
    let export: pmosession::SessionExport = serde_json::from_str(&json).unwrap();

    assert_eq!(export.songs.len(), 3);
    assert!(export.songs.iter().all(|s| s.id != "a"));
    // "a" a disparu de la playlist et de l'index, mais reste dans les
    // journaux comme fait historique tombstone
    assert!(export.playlist.iter().all(|e| e.song_id != "a"));
    assert!(export.ratings.is_empty());
    assert!(export.history.iter().any(|r| r.song_id == "a" && !r.live));
    assert!(export.skips.iter().any(|r| r.song_id == "a" && !r.live));
}

#[test]
fn test_duplicate_id_rejected() {
    let mut session = seeded_session();
    assert!(matches!(
        session.add_song(Song::new("a", "Other")),
        Err(Error::DuplicateId(_))
    ));
    // Le morceau d'origine est intact
    assert_eq!(session.song("a").unwrap().title, "Aqueous");
}

#[tokio::test]
async fn test_shared_session_across_tasks() {
    let shared = SharedSession::with_seed(
        SessionConfig::default(),
        vec![song("a", "A", None, None, None)],
    )
    .unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let shared = shared.clone();
        handles.push(tokio::spawn(async move {
            shared.write(|session| session.enqueue("a")).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let (len, audit) = shared
        .read(|session| (session.playlist_len(), session.audit().map(|_| ())))
        .await;
    assert_eq!(len, 4);
    audit.unwrap();
}
