use super::model::id::BookId;

/// フォーム操作のエラー。
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("unknown form field: '{0}' (use: title, author, isbn, publishYear, language)")]
    UnknownField(String),

    #[error("publish year must be an integer, got '{0}'")]
    InvalidPublishYear(String),

    #[error("form has no book id to update")]
    MissingId,

    #[error("book not found: {0}")]
    BookNotFound(BookId),
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// ストア（外部の書籍API・ファイル）とのやり取りで起きるエラー。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(#[source] BoxError),

    #[error("malformed store response: {0}")]
    Decode(#[source] BoxError),

    #[error("book not found in store: {0}")]
    NotFound(BookId),

    #[error("book already exists in store: {0}")]
    Conflict(BookId),

    #[error("{method} {url} failed with status {status}")]
    Status {
        method: String,
        url: String,
        status: u16,
    },

    #[error("invalid store base URL: {0}")]
    InvalidBaseUrl(String),
}

impl StoreError {
    pub fn transport(e: impl Into<BoxError>) -> Self {
        Self::Transport(e.into())
    }

    pub fn decode(e: impl Into<BoxError>) -> Self {
        Self::Decode(e.into())
    }
}
