//! Store conformance suite
//!
//! Behaviour every `Store` must share. Instantiate it in a test file with
//!
//! ```ignore
//! store_conformance_tests!(setup, count);
//! ```
//!
//! where `setup() -> (Fixture, S)` builds a fresh store (the fixture keeps
//! temp dirs alive) and `count(&S) -> usize` reports how many notes it holds.

#[allow(unused_macros)]
macro_rules! store_conformance_tests {
    ($setup:ident, $count:ident) => {
        mod conformance {
            use notestore::{Context, Note, Store, StoreError};
            use uuid::Uuid;

            use super::{$count, $setup};
            use crate::common::{fixed_time, sample_note};

            fn ctx() -> Context {
                Context::background()
            }

            fn cancelled() -> Context {
                let (ctx, handle) = Context::with_cancel();
                handle.cancel();
                ctx
            }

            // =================================================================
            // Insert
            // =================================================================

            #[test]
            fn test_insert_then_get_returns_equal_copy() {
                let (_fixture, store) = $setup();
                let note = sample_note();

                store.insert(&ctx(), &note).unwrap();
                let got = store.get(&ctx(), note.id).unwrap();

                assert_eq!(got, note);
                // Different storage, not the caller's buffer
                assert_ne!(
                    got.title.as_ref().unwrap().as_ptr(),
                    note.title.as_ref().unwrap().as_ptr()
                );
            }

            #[test]
            fn test_insert_duplicate_fails_and_keeps_first() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let dup = note.clone().with_title("second");
                let err = store.insert(&ctx(), &dup).unwrap_err();

                assert!(matches!(err, StoreError::AlreadyExists(id) if id == note.id));
                assert_eq!(store.get(&ctx(), note.id).unwrap(), note);
                assert_eq!($count(&store), 1);
            }

            #[test]
            fn test_insert_nil_id_rejected() {
                let (_fixture, store) = $setup();
                let note = sample_note().with_title("no id");
                let note = Note { id: Uuid::nil(), ..note };

                let err = store.insert(&ctx(), &note).unwrap_err();
                assert!(matches!(err, StoreError::EmptyIdentifier));
                assert_eq!($count(&store), 0);
            }

            #[test]
            fn test_insert_cancelled() {
                let (_fixture, store) = $setup();
                let note = sample_note();

                let err = store.insert(&cancelled(), &note).unwrap_err();
                assert!(matches!(err, StoreError::Cancelled));
                assert!(matches!(
                    store.get(&ctx(), note.id),
                    Err(StoreError::NotFound(_))
                ));
            }

            // =================================================================
            // Get
            // =================================================================

            #[test]
            fn test_get_absent_not_found() {
                let (_fixture, store) = $setup();
                let id = Uuid::new_v4();

                let err = store.get(&ctx(), id).unwrap_err();
                assert!(matches!(err, StoreError::NotFound(got) if got == id));
            }

            #[test]
            fn test_get_cancelled_leaves_store_unchanged() {
                let (_fixture, store) = $setup();
                let a = sample_note();
                let b = sample_note();
                store.insert(&ctx(), &a).unwrap();
                store.insert(&ctx(), &b).unwrap();
                let before = $count(&store);

                let err = store.get(&cancelled(), a.id).unwrap_err();

                assert!(matches!(err, StoreError::Cancelled));
                assert_eq!($count(&store), before);
                assert_eq!(store.get(&ctx(), a.id).unwrap(), a);
                assert_eq!(store.get(&ctx(), b.id).unwrap(), b);
            }

            #[test]
            fn test_mutating_returned_note_does_not_touch_store() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let mut got = store.get(&ctx(), note.id).unwrap();
                got.set_title("changed by caller");
                got.set_is_favorite(true);

                assert_eq!(store.get(&ctx(), note.id).unwrap(), note);
            }

            // =================================================================
            // Update
            // =================================================================

            #[test]
            fn test_update_absent_not_found() {
                let (_fixture, store) = $setup();
                let patch = Note::new(Uuid::new_v4()).with_content("Not existing yet");

                let err = store.update(&ctx(), &patch).unwrap_err();
                assert!(matches!(err, StoreError::NotFound(id) if id == patch.id));
                assert_eq!($count(&store), 0);
            }

            #[test]
            fn test_update_changes_only_present_fields() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let patch = Note::new(note.id)
                    .with_content("Updated Content")
                    .with_updated_time(fixed_time(1_700_000_000));
                let updated = store.update(&ctx(), &patch).unwrap();

                let mut want = note.clone();
                want.content = patch.content.clone();
                want.updated_time = patch.updated_time;

                assert_eq!(updated, want);
                assert_eq!(store.get(&ctx(), note.id).unwrap(), want);
            }

            #[test]
            fn test_update_keeps_created_time() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let patch = Note::new(note.id).with_created_time(fixed_time(0));
                let updated = store.update(&ctx(), &patch).unwrap();

                assert_eq!(updated.created_time, note.created_time);
            }

            #[test]
            fn test_update_can_clear_field() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let patch = Note::new(note.id).with_title("");
                let updated = store.update(&ctx(), &patch).unwrap();

                assert_eq!(updated.title.as_deref(), Some(""));
                assert_eq!(updated.content, note.content);
            }

            #[test]
            fn test_update_cancelled() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let patch = Note::new(note.id).with_title("never");
                let err = store.update(&cancelled(), &patch).unwrap_err();

                assert!(matches!(err, StoreError::Cancelled));
                assert_eq!(store.get(&ctx(), note.id).unwrap(), note);
            }

            // =================================================================
            // Delete
            // =================================================================

            #[test]
            fn test_delete_then_get_not_found() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                store.delete(&ctx(), note.id).unwrap();

                assert!(matches!(
                    store.get(&ctx(), note.id),
                    Err(StoreError::NotFound(_))
                ));
                assert_eq!($count(&store), 0);
            }

            #[test]
            fn test_delete_absent_is_ok() {
                let (_fixture, store) = $setup();
                store.delete(&ctx(), Uuid::new_v4()).unwrap();
                assert_eq!($count(&store), 0);
            }

            #[test]
            fn test_delete_cancelled() {
                let (_fixture, store) = $setup();
                let note = sample_note();
                store.insert(&ctx(), &note).unwrap();

                let err = store.delete(&cancelled(), note.id).unwrap_err();

                assert!(matches!(err, StoreError::Cancelled));
                assert_eq!(store.get(&ctx(), note.id).unwrap(), note);
            }

            // =================================================================
            // Scenario
            // =================================================================

            #[test]
            fn test_insert_update_delete_scenario() {
                let (_fixture, store) = $setup();
                let id = Uuid::new_v4();

                store.insert(&ctx(), &Note::new(id).with_title("x")).unwrap();
                assert!(matches!(
                    store.insert(&ctx(), &Note::new(id)),
                    Err(StoreError::AlreadyExists(_))
                ));

                let patch = Note::new(id)
                    .with_content("y")
                    .with_updated_time(fixed_time(1_700_000_000));
                let updated = store.update(&ctx(), &patch).unwrap();
                assert_eq!(updated.title(), "x");
                assert_eq!(updated.content(), "y");
                assert!(updated.updated_time.is_some());

                store.delete(&ctx(), id).unwrap();
                assert!(matches!(store.get(&ctx(), id), Err(StoreError::NotFound(_))));
            }

            // =================================================================
            // Concurrency
            // =================================================================

            #[test]
            fn test_concurrent_inserts_all_land() {
                let (_fixture, store) = $setup();
                let notes: Vec<Note> = (0..32).map(|_| sample_note()).collect();

                crossbeam::thread::scope(|s| {
                    for chunk in notes.chunks(4) {
                        let store = &store;
                        s.spawn(move |_| {
                            for note in chunk {
                                store.insert(&ctx(), note).unwrap();
                            }
                        });
                    }
                })
                .unwrap();

                assert_eq!($count(&store), notes.len());
                for note in &notes {
                    assert_eq!(&store.get(&ctx(), note.id).unwrap(), note);
                }
            }

            #[test]
            fn test_concurrent_duplicate_insert_exactly_one_wins() {
                let (_fixture, store) = $setup();
                let note = sample_note();

                let results: Vec<_> = crossbeam::thread::scope(|s| {
                    let handles: Vec<_> = (0..8)
                        .map(|_| {
                            let store = &store;
                            let note = &note;
                            s.spawn(move |_| store.insert(&ctx(), note))
                        })
                        .collect();
                    handles.into_iter().map(|h| h.join().unwrap()).collect()
                })
                .unwrap();

                let wins = results.iter().filter(|r| r.is_ok()).count();
                let dups = results
                    .iter()
                    .filter(|r| matches!(r, Err(StoreError::AlreadyExists(_))))
                    .count();
                assert_eq!(wins, 1);
                assert_eq!(dups, 7);
                assert_eq!($count(&store), 1);
            }
        }
    };
}
