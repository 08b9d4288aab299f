use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::error::StoreError;
use crate::domain::model::book::Book;
use crate::domain::model::id::BookId;
use crate::domain::store::BookStore;

const COLLECTION: &str = "books";

/// json-serverの `db.json` を直接読み書きするBookStore実装。
/// `books` 以外のトップレベルキーは保持したまま書き戻す。
pub struct JsonFileStore {
    path: PathBuf,
    /// read-modify-write を直列化する
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // --- private ---

    /// ファイルが無い・空なら空のDB。
    async fn read_db(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(StoreError::transport(e)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(StoreError::decode)
    }

    fn books_of(db: &Map<String, Value>) -> Result<Vec<Book>, StoreError> {
        match db.get(COLLECTION) {
            Some(value) => Vec::<Book>::deserialize(value).map_err(StoreError::decode),
            None => Ok(Vec::new()),
        }
    }

    async fn write_db(&self, mut db: Map<String, Value>, books: &[Book]) -> Result<(), StoreError> {
        db.insert(
            COLLECTION.to_string(),
            serde_json::to_value(books).map_err(StoreError::decode)?,
        );
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::transport)?;
        }
        let content =
            serde_json::to_string_pretty(&Value::Object(db)).map_err(StoreError::decode)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &content)
            .await
            .map_err(StoreError::transport)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(StoreError::transport)?;
        Ok(())
    }

    /// 読み込み → 変更 → 書き戻し。変更がErrなら書き戻さない。
    async fn modify<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<Book>) -> Result<T, StoreError> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let db = self.read_db().await?;
        let mut books = Self::books_of(&db)?;
        let out = f(&mut books)?;
        self.write_db(db, &books).await?;
        debug!(path = %self.path.display(), count = books.len(), "wrote book db");
        Ok(out)
    }
}

#[async_trait]
impl BookStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let _guard = self.lock.lock().await;
        let db = self.read_db().await?;
        Self::books_of(&db)
    }

    async fn create(&self, book: &Book) -> Result<Book, StoreError> {
        self.modify(|books| {
            if books.iter().any(|b| b.id == book.id) {
                return Err(StoreError::Conflict(book.id.clone()));
            }
            books.push(book.clone());
            Ok(book.clone())
        })
        .await
    }

    async fn update(&self, book: &Book) -> Result<Book, StoreError> {
        self.modify(|books| {
            let slot = books
                .iter_mut()
                .find(|b| b.id == book.id)
                .ok_or_else(|| StoreError::NotFound(book.id.clone()))?;
            *slot = book.clone();
            Ok(book.clone())
        })
        .await
    }

    async fn delete(&self, id: &BookId) -> Result<(), StoreError> {
        self.modify(|books| {
            let before = books.len();
            books.retain(|b| &b.id != id);
            if books.len() == before {
                return Err(StoreError::NotFound(id.clone()));
            }
            Ok(())
        })
        .await
    }
}
