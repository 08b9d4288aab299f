//! Shared test harness for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;

use book_manager_mcp::application::client::BookManagerClient;
use book_manager_mcp::domain::error::StoreError;
use book_manager_mcp::domain::model::book::Book;
use book_manager_mcp::domain::model::id::BookId;
use book_manager_mcp::domain::store::BookStore;

// =============================================================================
// ScriptedStore — テスト用ストア
// =============================================================================

/// ストアに届いたリクエスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Create(Book),
    Update(Book),
    Delete(BookId),
}

#[derive(Default)]
struct State {
    books: Vec<Book>,
    requests: Vec<Request>,
    offline: bool,
    update_transform: Option<fn(&mut Book)>,
}

/// json-server相当の振る舞いをするインメモリストア。
/// 受けたリクエストを記録し、オフライン（通信失敗）にもできる。
#[derive(Default)]
pub struct ScriptedStore {
    state: Mutex<State>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().books = books;
        store
    }

    /// 以降のリクエストを全て通信失敗にする（falseで復帰）。
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().unwrap().offline = offline;
    }

    /// update時にストア側でBookを書き換える（正規化するサーバーの再現）。
    pub fn set_update_transform(&self, f: fn(&mut Book)) {
        self.state.lock().unwrap().update_transform = Some(f);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn stored(&self) -> Vec<Book> {
        self.state.lock().unwrap().books.clone()
    }

    fn record(&self, request: Request) -> Result<std::sync::MutexGuard<'_, State>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        if state.offline {
            return Err(StoreError::transport("connection refused"));
        }
        Ok(state)
    }
}

#[async_trait]
impl BookStore for ScriptedStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let state = self.record(Request::List)?;
        Ok(state.books.clone())
    }

    async fn create(&self, book: &Book) -> Result<Book, StoreError> {
        let mut state = self.record(Request::Create(book.clone()))?;
        if state.books.iter().any(|b| b.id == book.id) {
            return Err(StoreError::Conflict(book.id.clone()));
        }
        state.books.push(book.clone());
        Ok(book.clone())
    }

    async fn update(&self, book: &Book) -> Result<Book, StoreError> {
        let mut state = self.record(Request::Update(book.clone()))?;
        let transform = state.update_transform;
        let slot = state
            .books
            .iter_mut()
            .find(|b| b.id == book.id)
            .ok_or_else(|| StoreError::NotFound(book.id.clone()))?;
        *slot = book.clone();
        if let Some(f) = transform {
            f(slot);
        }
        Ok(slot.clone())
    }

    async fn delete(&self, id: &BookId) -> Result<(), StoreError> {
        let mut state = self.record(Request::Delete(id.clone()))?;
        let before = state.books.len();
        state.books.retain(|b| &b.id != id);
        if state.books.len() == before {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn book(id: &str, title: &str, author: &str, isbn: &str, year: &str, language: &str) -> Book {
    Book {
        id: BookId::from(id),
        title: title.into(),
        author: author.into(),
        isbn: isbn.into(),
        publish_year: year.into(),
        language: language.into(),
    }
}

/// 標準的なテスト用蔵書:
/// ```text
/// 1. Dune (b-1)
/// 2. Emma (b-2)
/// 3. Solaris (b-3)
/// ```
pub fn sample_books() -> Vec<Book> {
    vec![
        book("b-1", "Dune", "Frank Herbert", "978-0441013593", "1965", "English"),
        book("b-2", "Emma", "Jane Austen", "978-0141439587", "1815", "English"),
        book("b-3", "Solaris", "Stanisław Lem", "978-0156027601", "1961", "Polish"),
    ]
}

/// sample_booksを持つストアでクライアントを作り、読み込み済みにする。
pub async fn loaded_client() -> BookManagerClient<ScriptedStore> {
    let mut client = BookManagerClient::new(ScriptedStore::with_books(sample_books()));
    client.load().await.unwrap();
    client
}

/// proptest等、同期コンテキストからasyncを回す。
pub fn block_on<F: Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

// =============================================================================
// Assertion helpers
// =============================================================================

/// 結果がErrで、メッセージに指定文字列を含むことをassert。
#[allow(dead_code)]
pub fn assert_error_contains<T: std::fmt::Debug>(
    result: Result<T, impl std::fmt::Display>,
    expected: &str,
) {
    match result {
        Err(e) => {
            let msg = e.to_string();
            assert!(
                msg.contains(expected),
                "Expected error containing '{expected}', got: '{msg}'"
            );
        }
        Ok(v) => panic!("Expected error containing '{expected}', got Ok({v:?})"),
    }
}
