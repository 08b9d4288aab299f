use async_trait::async_trait;

use super::error::StoreError;
use super::model::book::Book;
use super::model::id::BookId;

/// 書籍コレクションの外部ストア。Infra層が実装する。
///
/// 正はストア側にあり、戻り値のBookがそのまま正規の表現として扱われる。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// コレクション全体（ストアの並び順のまま）
    async fn list(&self) -> Result<Vec<Book>, StoreError>;

    /// クライアント採番のIDを含むBookを登録し、登録後の表現を返す。
    async fn create(&self, book: &Book) -> Result<Book, StoreError>;

    /// `book.id` のレコードを丸ごと置き換え、置き換え後の表現を返す。
    async fn update(&self, book: &Book) -> Result<Book, StoreError>;

    async fn delete(&self, id: &BookId) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: BookStore + ?Sized> BookStore for Box<T> {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        (**self).list().await
    }

    async fn create(&self, book: &Book) -> Result<Book, StoreError> {
        (**self).create(book).await
    }

    async fn update(&self, book: &Book) -> Result<Book, StoreError> {
        (**self).update(book).await
    }

    async fn delete(&self, id: &BookId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}
