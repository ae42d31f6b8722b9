//! End-to-end behavior of the search session against the mock backend.

use std::sync::Arc;

use cerdas_core::defaults::LAST_ACTIVE_DOCUMENT_KEY;
use cerdas_core::mock::{sample_document, MockBackend};
use cerdas_core::{
    parse_tags, Delivery, DocumentUpdate, Error, LatestDocument, PreferenceStore, SearchResult,
    SessionEvent,
};
use cerdas_session::{
    FormStatus, JsonFileStore, Key, MemoryStore, ResolverState, SearchSession, SessionLabel,
};

fn session_with(backend: &MockBackend, store: &Arc<MemoryStore>) -> SearchSession {
    SearchSession::new(Arc::new(backend.clone()), store.clone())
}

fn remembered(store: &MemoryStore) -> Option<String> {
    store.get(LAST_ACTIVE_DOCUMENT_KEY).unwrap()
}

fn two_documents() -> MockBackend {
    MockBackend::new()
        .with_document(sample_document("1", "a.pdf"))
        .with_document(sample_document("2", "b.pdf"))
}

fn hits(count: usize) -> SearchResult {
    SearchResult {
        count,
        snippets: (0..count).map(|i| format!("...<mark>{i}</mark>...")).collect(),
    }
}

// =============================================================================
// Startup
// =============================================================================

#[tokio::test]
async fn test_remembered_document_wins_without_latest_lookup() {
    let backend = MockBackend::new().with_document(sample_document("1", "a.pdf"));
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert_eq!(started.active_document_id.as_deref(), Some("1"));
    assert_eq!(started.label, SessionLabel::Document("a.pdf".into()));
    assert_eq!(backend.call_count("latest_document"), 0);
    assert_eq!(remembered(&store).as_deref(), Some("1"));
}

#[tokio::test]
async fn test_remembered_wins_over_newer_latest() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();

    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    assert_eq!(session.resolver().active_document_id(), Some("1"));
    assert_eq!(backend.active_document().as_deref(), Some("1"));
    assert_eq!(backend.call_count("latest_document"), 0);
}

#[tokio::test]
async fn test_no_remembered_document_uses_latest_once() {
    let backend = two_documents().with_latest(Some(LatestDocument {
        id: "2".into(),
        filename: "b.pdf".into(),
    }));
    let store = Arc::new(MemoryStore::new());

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert_eq!(started.active_document_id.as_deref(), Some("2"));
    assert_eq!(remembered(&store).as_deref(), Some("2"));
    assert_eq!(backend.call_count("latest_document"), 1);
}

#[tokio::test]
async fn test_empty_remembered_value_counts_as_absent() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "").unwrap();

    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    assert_eq!(backend.call_count("latest_document"), 1);
    assert_eq!(backend.call_count("switch_document"), 1);
    assert_eq!(session.resolver().active_document_id(), Some("2"));
}

#[tokio::test]
async fn test_stale_remembered_document_falls_back_to_latest() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "deleted-elsewhere").unwrap();

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert_eq!(started.active_document_id.as_deref(), Some("2"));
    assert_eq!(remembered(&store).as_deref(), Some("2"));
    assert_eq!(backend.call_count("latest_document"), 1);
}

#[tokio::test]
async fn test_empty_backend_settles_on_no_documents() {
    let backend = MockBackend::new();
    let store = Arc::new(MemoryStore::new());

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert_eq!(started.active_document_id, None);
    assert_eq!(started.label, SessionLabel::NoDocuments);
    assert_eq!(session.resolver().state(), &ResolverState::Empty);
    assert_eq!(remembered(&store), None);
}

#[tokio::test]
async fn test_unreachable_backend_settles_on_unreachable_label() {
    let backend = two_documents();
    backend.set_unreachable(true);
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert_eq!(started.active_document_id, None);
    assert_eq!(started.label, SessionLabel::BackendUnreachable);
    assert!(session.catalog().is_empty());
    assert_eq!(remembered(&store), None);
}

#[tokio::test]
async fn test_catalog_failure_does_not_block_activation() {
    let backend = two_documents().with_failing_list();
    let store = Arc::new(MemoryStore::new());

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert!(session.catalog().is_empty());
    assert_eq!(started.active_document_id.as_deref(), Some("2"));
}

#[tokio::test]
async fn test_catalog_backend_error_without_latest_reports_unreachable() {
    let backend = MockBackend::new()
        .with_document(sample_document("1", "a.pdf"))
        .with_failing_list()
        .with_latest(None);
    let store = Arc::new(MemoryStore::new());

    let mut session = session_with(&backend, &store);
    let started = session.startup().await.unwrap();

    assert!(session.catalog().is_empty());
    assert_eq!(started.active_document_id, None);
    assert_eq!(started.label, SessionLabel::BackendUnreachable);
    assert_eq!(session.resolver().state(), &ResolverState::Empty);
}

#[tokio::test]
async fn test_startup_publishes_session_changes() {
    let backend = MockBackend::new().with_document(sample_document("1", "a.pdf"));
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    let mut rx = session.events().subscribe();

    session.startup().await.unwrap();

    let mut labels = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        if let SessionEvent::SessionChanged { label, .. } = envelope.payload {
            labels.push(label);
        }
    }
    assert_eq!(labels, vec!["Loading...".to_string(), "a.pdf".to_string()]);
}

// =============================================================================
// Switching
// =============================================================================

#[tokio::test]
async fn test_any_switch_failure_forgets_choice() {
    let backend = two_documents().with_failing_switch("2");
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    for bad in ["2", "missing", ""] {
        store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();
        assert!(session.switch_document(bad).await.is_err());
        assert_eq!(remembered(&store), None, "after switching to {bad:?}");
    }

    backend.set_unreachable(true);
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();
    let err = session.switch_document("1").await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(remembered(&store), None);
}

#[tokio::test]
async fn test_switch_failure_leaves_session_unchanged() {
    let backend = two_documents().with_failing_switch("1");
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();
    let before = session.session();

    session.switch_document("1").await.unwrap_err();
    assert_eq!(session.session(), before);
}

#[tokio::test]
async fn test_switch_uses_server_filename() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    let switched = session.switch_document("1").await.unwrap();
    assert_eq!(switched.active_document_id.as_deref(), Some("1"));
    assert_eq!(switched.label.to_string(), "a.pdf");
    assert_eq!(remembered(&store).as_deref(), Some("1"));
}

#[tokio::test]
async fn test_forget_keeps_active_document() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    session.forget_remembered().unwrap();
    assert_eq!(remembered(&store), None);
    assert_eq!(session.resolver().active_document_id(), Some("2"));
}

#[tokio::test]
async fn test_file_store_remembers_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    let backend = two_documents();

    let mut first = SearchSession::new(
        Arc::new(backend.clone()),
        Arc::new(JsonFileStore::new(&path)),
    );
    first.startup().await.unwrap();
    first.switch_document("1").await.unwrap();

    let mut second = SearchSession::new(
        Arc::new(backend.clone()),
        Arc::new(JsonFileStore::new(&path)),
    );
    backend.clear_calls();
    let started = second.startup().await.unwrap();
    assert_eq!(started.active_document_id.as_deref(), Some("1"));
    assert_eq!(backend.call_count("latest_document"), 0);
}

// =============================================================================
// Catalog mutations
// =============================================================================

#[tokio::test]
async fn test_deleting_active_document_resets_session() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    store.set(LAST_ACTIVE_DOCUMENT_KEY, "1").unwrap();
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();
    assert_eq!(session.resolver().active_document_id(), Some("1"));

    session.delete_document("1").await.unwrap();

    assert_eq!(session.resolver().active_document_id(), None);
    assert_eq!(session.session().label, SessionLabel::NoDocumentSelected);
    assert_eq!(remembered(&store), None);
    assert!(!session.catalog().contains("1"));
    assert!(session.catalog().contains("2"));
}

#[tokio::test]
async fn test_deleting_other_document_keeps_session() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();
    let before = session.session();

    session.delete_document("1").await.unwrap();

    assert_eq!(session.session(), before);
    assert_eq!(remembered(&store).as_deref(), Some("2"));
    assert_eq!(session.catalog().len(), 1);
}

#[tokio::test]
async fn test_delete_unknown_document_is_not_found() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    let err = session.delete_document("nope").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(backend.call_count("delete_document"), 0);
}

#[tokio::test]
async fn test_catalog_refresh_does_not_invalidate_session() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    backend.set_unreachable(true);
    assert!(session.refresh_catalog().await.is_err());
    assert!(session.catalog().is_empty());
    assert_eq!(session.resolver().active_document_id(), Some("2"));
}

#[tokio::test]
async fn test_update_document_refreshes_catalog() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    let update = DocumentUpdate {
        uploaded_by: "Sari".into(),
        tags: parse_tags("internal, 2024"),
    };
    session.update_document("1", &update).await.unwrap();

    let doc = session.catalog().lookup("1").unwrap();
    assert_eq!(doc.uploaded_by, "Sari");
    assert_eq!(doc.tags_text(), "2024, internal");
}

#[tokio::test]
async fn test_edit_form_save_and_validation() {
    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    let form = session.open_edit("1").unwrap();
    form.uploaded_by = "  ".into();
    let err = session.save_edit().await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(matches!(
        session.edit_form().unwrap().status(),
        Some(FormStatus::Error(_))
    ));
    assert_eq!(backend.call_count("update_document"), 0);

    let form = session.edit_form_mut().unwrap();
    form.uploaded_by = "Budi".into();
    form.tags = "baru".into();
    session.save_edit().await.unwrap();

    assert!(session.edit_form().is_none());
    assert_eq!(session.catalog().lookup("1").unwrap().uploaded_by, "Budi");
}

#[tokio::test]
async fn test_upload_success_clears_form_and_refreshes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("c.txt");
    std::fs::write(&path, "isi").unwrap();

    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    let form = session.upload_form_mut();
    form.select_file(&path);
    form.uploaded_by = "Budi".into();
    form.tags = "x, y".into();
    session.upload().await.unwrap();

    let form = session.upload_form();
    assert!(form.file().is_none());
    assert!(form.uploaded_by.is_empty());
    assert!(form.tags.is_empty());
    assert!(matches!(form.status(), Some(FormStatus::Success(_))));
    assert_eq!(session.catalog().len(), 3);
    assert!(session
        .catalog()
        .documents()
        .iter()
        .any(|d| d.filename == "c.txt" && d.uploaded_by == "Budi"));
}

#[tokio::test]
async fn test_upload_failure_keeps_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.pdf");
    std::fs::write(&path, "dup").unwrap();

    let backend = two_documents();
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(&backend, &store);
    session.startup().await.unwrap();

    session.upload_form_mut().select_file(&path);
    let err = session.upload().await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert!(session.upload_form().file().is_some());
    assert!(matches!(
        session.upload_form().status(),
        Some(FormStatus::Error(_))
    ));
}

// =============================================================================
// Query box and search
// =============================================================================

async fn active_session(backend: &MockBackend) -> SearchSession {
    let store = Arc::new(MemoryStore::new());
    let mut session = session_with(backend, &store);
    session.startup().await.unwrap();
    session
}

#[tokio::test]
async fn test_suggestions_follow_typing() {
    let backend = two_documents().with_words("2", &["hukum", "hukuman", "hutan"]);
    let mut session = active_session(&backend).await;

    assert!(session.type_query("h").await.unwrap().is_empty());
    assert_eq!(backend.call_count("autocomplete"), 0);

    let words = session.type_query("huk").await.unwrap().to_vec();
    assert_eq!(words, vec!["hukum".to_string(), "hukuman".to_string()]);
}

#[tokio::test]
async fn test_out_of_order_suggestions_keep_latest_query() {
    let backend = two_documents().with_words("2", &["ab", "abc", "abcd", "abx"]);
    let mut session = active_session(&backend).await;
    let backend_handle = session.backend();

    let ab = session.on_query_change("ab").unwrap();
    let abc = session.on_query_change("abc").unwrap();

    let abc_result = abc.fetch(backend_handle.as_ref()).await;
    let ab_result = ab.fetch(backend_handle.as_ref()).await;

    assert_eq!(
        session.apply_suggestions(&abc, abc_result).unwrap(),
        Delivery::Applied
    );
    assert_eq!(
        session.apply_suggestions(&ab, ab_result).unwrap(),
        Delivery::Stale
    );
    assert_eq!(
        session.suggestions().suggestions(),
        ["abc".to_string(), "abcd".to_string()].as_slice()
    );
}

#[tokio::test]
async fn test_keyboard_selection_commits_suggestion() {
    let backend = two_documents()
        .with_words("2", &["hukum", "hukuman"])
        .with_search("hukuman", hits(3));
    let mut session = active_session(&backend).await;

    session.type_query("huk").await.unwrap();
    assert!(session.on_key(Key::ArrowDown));
    assert!(session.on_key(Key::ArrowDown));
    assert!(session.on_key(Key::ArrowDown));
    assert!(session.on_key(Key::ArrowDown));
    assert_eq!(session.suggestions().cursor(), Some(1));

    let result = session.submit().await.unwrap().unwrap().clone();
    assert_eq!(result.count, 3);
    assert_eq!(session.suggestions().query(), "hukuman");
    assert!(session.suggestions().suggestions().is_empty());
    assert_eq!(backend.get_calls().last().unwrap().input, "hukuman");
}

#[tokio::test]
async fn test_escape_dismisses_suggestions() {
    let backend = two_documents().with_words("2", &["hukum"]);
    let mut session = active_session(&backend).await;

    session.type_query("huk").await.unwrap();
    assert!(session.on_key(Key::Escape));
    assert!(session.suggestions().suggestions().is_empty());
    assert!(!session.on_key(Key::ArrowDown));
}

#[tokio::test]
async fn test_empty_commit_issues_no_search() {
    let backend = two_documents();
    let mut session = active_session(&backend).await;

    session.on_query_change("");
    assert!(session.submit().await.unwrap().is_none());
    assert_eq!(backend.call_count("search"), 0);
    assert!(!session.search().has_searched());
}

#[tokio::test]
async fn test_select_by_pointer() {
    let backend = two_documents()
        .with_words("2", &["hukum", "hukuman"])
        .with_search("hukum", hits(1));
    let mut session = active_session(&backend).await;

    session.type_query("huk").await.unwrap();
    let ticket = session.select(0).unwrap().unwrap();
    assert_eq!(ticket.query, "hukum");
    assert_eq!(ticket.document_id, "2");

    let result = ticket.run(session.backend().as_ref()).await;
    session.apply_search(&ticket, result).unwrap();
    assert_eq!(session.search().result().count, 1);
}

#[tokio::test]
async fn test_search_without_active_document() {
    let backend = MockBackend::new();
    let mut session = active_session(&backend).await;

    session.on_query_change("hukum");
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, Error::NoActiveDocument));
    assert_eq!(backend.call_count("search"), 0);
}

#[tokio::test]
async fn test_last_dispatched_search_wins() {
    let backend = two_documents()
        .with_search("lama", hits(5))
        .with_search("baru", hits(2));
    let mut session = active_session(&backend).await;
    let handle = session.backend();

    session.on_query_change("lama");
    let first = session.commit().unwrap().unwrap();
    session.on_query_change("baru");
    let second = session.commit().unwrap().unwrap();

    let second_result = second.run(handle.as_ref()).await;
    let first_result = first.run(handle.as_ref()).await;
    assert_eq!(
        session.apply_search(&second, second_result).unwrap(),
        Delivery::Applied
    );
    assert_eq!(
        session.apply_search(&first, first_result).unwrap(),
        Delivery::Stale
    );
    assert_eq!(session.search().result().count, 2);
    assert_eq!(session.search().query(), Some("baru"));
}

#[tokio::test]
async fn test_search_result_dropped_after_switching_document() {
    let backend = two_documents().with_search("lama", hits(5));
    let mut session = active_session(&backend).await;
    let handle = session.backend();

    session.on_query_change("lama");
    let ticket = session.commit().unwrap().unwrap();
    assert_eq!(ticket.document_id, "2");
    let result = ticket.run(handle.as_ref()).await;

    session.switch_document("1").await.unwrap();
    assert_eq!(
        session.apply_search(&ticket, result).unwrap(),
        Delivery::Stale
    );
    assert_eq!(session.search().result().count, 0);
    assert!(!session.search().is_loading());
}

#[tokio::test]
async fn test_failed_search_records_error() {
    let backend = two_documents();
    let mut session = active_session(&backend).await;
    let mut rx = session.events().subscribe();

    session.on_query_change("hukum");
    backend.set_unreachable(true);
    assert!(session.submit().await.unwrap_err().is_transport());

    assert_eq!(session.search().result().count, 0);
    assert!(session.search().last_error().is_some());
    assert!(!session.search().is_loading());

    let mut saw_failure = false;
    while let Ok(envelope) = rx.try_recv() {
        if matches!(envelope.payload, SessionEvent::SearchFailed { .. }) {
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

// =============================================================================
// Read-only views
// =============================================================================

#[tokio::test]
async fn test_overview_and_status() {
    let mut backend = MockBackend::new();
    for i in 1..=7 {
        backend = backend.with_document(sample_document(&i.to_string(), &format!("{i}.pdf")));
    }
    let mut session = active_session(&backend).await;

    let overview = session.overview().await.unwrap();
    assert_eq!(overview.stats.total_documents, 7);
    assert_eq!(overview.recent.len(), 5);
    assert_eq!(overview.recent[0].id, "1");

    let status = session.server_status().await.unwrap();
    assert_eq!(status.indexed_file, "7.pdf");
}

#[tokio::test]
async fn test_tags_are_distinct_and_sorted() {
    let mut a = sample_document("1", "a.pdf");
    a.tags = parse_tags("zeta, alpha");
    let mut b = sample_document("2", "b.pdf");
    b.tags = parse_tags("alpha, mid");
    let backend = MockBackend::new().with_document(a).with_document(b);
    let session = active_session(&backend).await;

    assert_eq!(
        session.tags().await.unwrap(),
        vec!["alpha".to_string(), "mid".to_string(), "zeta".to_string()]
    );
    assert_eq!(session.stats().await.unwrap().total_tags, 3);
}
