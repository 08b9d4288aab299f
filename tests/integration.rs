//! Integration tests — BookManagerClient against a scripted store, JsonFileStore file I/O.

mod common;

use common::{assert_error_contains, book, loaded_client, sample_books, Request, ScriptedStore};

use book_manager_mcp::application::client::{BookManagerClient, SubmitOutcome};
use book_manager_mcp::application::error::ClientError;
use book_manager_mcp::domain::error::{FormError, StoreError};
use book_manager_mcp::domain::model::book::BookField;
use book_manager_mcp::domain::model::form::EditMode;
use book_manager_mcp::domain::model::id::BookId;
use book_manager_mcp::infra::json_store::JsonFileStore;

// =============================================================================
// load
// =============================================================================

#[tokio::test]
async fn load_replaces_cache_in_store_order() {
    let client = loaded_client().await;
    assert_eq!(client.books(), sample_books().as_slice());
    assert_eq!(client.store().requests(), vec![Request::List]);
}

#[tokio::test]
async fn load_failure_keeps_previous_cache() {
    let mut client = loaded_client().await;
    client.store().set_offline(true);

    let result = client.load().await;
    assert!(matches!(result, Err(ClientError::Store(StoreError::Transport(_)))));
    assert_eq!(client.books(), sample_books().as_slice());
}

#[tokio::test]
async fn first_load_failure_leaves_empty_cache() {
    let store = ScriptedStore::with_books(sample_books());
    store.set_offline(true);
    let mut client = BookManagerClient::new(store);

    assert_error_contains(client.load().await, "connection refused");
    assert!(client.books().is_empty());
}

#[tokio::test]
async fn load_resets_form() {
    let mut client = loaded_client().await;
    client.begin_edit_by_id(&BookId::from("b-1")).unwrap();

    client.load().await.unwrap();
    assert!(client.form().is_empty());
    assert_eq!(client.edit_mode(), EditMode::Create);
}

// =============================================================================
// submit — create
// =============================================================================

#[tokio::test]
async fn create_appends_store_representation() {
    let mut client = loaded_client().await;
    client.update_field(BookField::Title, "Neuromancer").unwrap();
    client.update_field(BookField::Author, "William Gibson").unwrap();
    client.update_field(BookField::Isbn, "978-0441569595").unwrap();
    client.update_field(BookField::PublishYear, "1984").unwrap();
    client.update_field(BookField::Language, "English").unwrap();

    let outcome = client.submit().await.unwrap();
    let created = match &outcome {
        SubmitOutcome::Created(book) => book.clone(),
        other => panic!("expected Created, got {other:?}"),
    };

    assert_eq!(created.title, "Neuromancer");
    assert_eq!(client.books().len(), 4);
    assert_eq!(client.books().last(), Some(&created));
    assert!(client.form().is_empty());

    // 送信したBodyにクライアント採番のIDが入っている
    let requests = client.store().requests();
    match requests.last() {
        Some(Request::Create(sent)) => assert_eq!(sent, &created),
        other => panic!("expected Create request, got {other:?}"),
    }
}

#[tokio::test]
async fn create_failure_resets_form_without_touching_cache() {
    let mut client = loaded_client().await;
    client.update_field(BookField::Title, "Lost").unwrap();
    client.store().set_offline(true);

    assert!(client.submit().await.is_err());
    assert!(client.form().is_empty());
    assert_eq!(client.edit_mode(), EditMode::Create);
    assert_eq!(client.books(), sample_books().as_slice());
}

#[tokio::test]
async fn back_to_back_creates_use_distinct_ids() {
    let mut client = BookManagerClient::new(ScriptedStore::new());
    for title in ["One", "Two"] {
        client.update_field(BookField::Title, title).unwrap();
        client.submit().await.unwrap();
    }

    let ids: Vec<BookId> = client
        .store()
        .requests()
        .into_iter()
        .filter_map(|r| match r {
            Request::Create(b) => Some(b.id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(client.books().len(), 2);
}

// =============================================================================
// submit — update
// =============================================================================

#[tokio::test]
async fn edit_then_submit_sends_full_book() {
    let mut client = loaded_client().await;
    let original = sample_books()[1].clone();

    client.begin_edit(&original);
    assert!(client.is_editing());
    client.update_field(BookField::Title, "Emma (Penguin)").unwrap();

    let outcome = client.submit().await.unwrap();
    let mut expected = original.clone();
    expected.title = "Emma (Penguin)".into();

    assert_eq!(outcome, SubmitOutcome::Updated(expected.clone()));
    assert_eq!(
        client.store().requests().last(),
        Some(&Request::Update(expected.clone()))
    );
    assert_eq!(client.books()[1], expected);
    assert_eq!(client.books().len(), 3);
    assert!(!client.is_editing());
    assert!(client.form().is_empty());
}

#[tokio::test]
async fn update_applies_store_confirmed_representation() {
    let mut client = loaded_client().await;
    // ストア側でタイトルを正規化する
    client
        .store()
        .set_update_transform(|b| b.title = b.title.trim().to_string());

    client.begin_edit_by_id(&BookId::from("b-3")).unwrap();
    client.update_field(BookField::Title, "  Solaris  ").unwrap();
    client.submit().await.unwrap();

    assert_eq!(client.books()[2].title, "Solaris");
}

#[tokio::test]
async fn update_failure_leaves_cache_and_exits_edit_mode() {
    let mut client = loaded_client().await;
    client.begin_edit_by_id(&BookId::from("b-1")).unwrap();
    client.update_field(BookField::Author, "Someone Else").unwrap();
    client.store().set_offline(true);

    assert!(client.submit().await.is_err());
    assert_eq!(client.books(), sample_books().as_slice());
    assert!(!client.is_editing());
    assert!(client.form().is_empty());
}

#[tokio::test]
async fn update_of_uncached_book_keeps_count() {
    let mut client = loaded_client().await;
    let stranger = book("b-9", "Stranger", "", "", "", "");
    client.begin_edit(&stranger);

    // ストアにも無いのでNotFound
    let result = client.submit().await;
    assert!(matches!(
        result,
        Err(ClientError::Store(StoreError::NotFound(id))) if id.as_str() == "b-9"
    ));
    assert_eq!(client.books().len(), 3);
}

#[tokio::test]
async fn begin_edit_by_unknown_id_errors() {
    let mut client = loaded_client().await;
    let result = client.begin_edit_by_id(&BookId::from("missing"));
    assert!(matches!(result, Err(FormError::BookNotFound(_))));
    assert!(!client.is_editing());
}

// =============================================================================
// remove
// =============================================================================

#[tokio::test]
async fn remove_then_remove_again() {
    let store = ScriptedStore::with_books(vec![book("1", "A", "", "", "", "")]);
    let mut client = BookManagerClient::new(store);
    client.load().await.unwrap();

    client.remove(&BookId::from("1")).await.unwrap();
    assert!(client.books().is_empty());

    // 二度目はストアがNotFoundを返す。キャッシュは空のまま
    let result = client.remove(&BookId::from("1")).await;
    assert_error_contains(result, "not found");
    assert!(client.books().is_empty());
}

#[tokio::test]
async fn remove_failure_keeps_cache() {
    let mut client = loaded_client().await;
    client.store().set_offline(true);

    assert!(client.remove(&BookId::from("b-2")).await.is_err());
    assert_eq!(client.books(), sample_books().as_slice());
}

#[tokio::test]
async fn remove_drops_only_matching_record() {
    let mut client = loaded_client().await;
    client.remove(&BookId::from("b-2")).await.unwrap();

    let ids: Vec<&str> = client.books().iter().map(|b| b.id.as_str()).collect();
    assert_eq!(ids, vec!["b-1", "b-3"]);
}

// =============================================================================
// BookManagerClient with JsonFileStore (file-backed)
// =============================================================================

#[tokio::test]
async fn client_json_store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");

    let mut client = BookManagerClient::new(JsonFileStore::new(&path));
    client.load().await.unwrap();
    client.update_field(BookField::Title, "File Test").unwrap();
    client.update_field(BookField::PublishYear, "2001").unwrap();
    client.submit().await.unwrap();

    // 新たなクライアントで読み直す
    let mut reader = BookManagerClient::new(JsonFileStore::new(&path));
    assert_eq!(reader.load().await.unwrap(), 1);
    let loaded = &reader.books()[0];
    assert_eq!(loaded.title, "File Test");
    assert_eq!(loaded.publish_year, "2001");

    let id = loaded.id.clone();
    reader.begin_edit_by_id(&id).unwrap();
    reader.update_field(BookField::Language, "Swedish").unwrap();
    reader.submit().await.unwrap();
    reader.remove(&id).await.unwrap();

    assert_eq!(client.load().await.unwrap(), 0);
}

#[tokio::test]
async fn client_reads_legacy_db_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db.json");
    std::fs::write(
        &path,
        r#"{
  "books": [
    { "id": 1712345678901, "title": "Pippi", "author": "Astrid Lindgren", "isbn": "91-29-62335-4", "publishYear": "1945" }
  ]
}"#,
    )
    .unwrap();

    let mut client = BookManagerClient::new(JsonFileStore::new(&path));
    client.load().await.unwrap();
    assert_eq!(client.books()[0].id.as_str(), "1712345678901");
    assert_eq!(client.books()[0].language, "");

    client.remove(&BookId::from("1712345678901")).await.unwrap();
    assert!(client.books().is_empty());
}
