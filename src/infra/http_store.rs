use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::domain::error::StoreError;
use crate::domain::model::book::Book;
use crate::domain::model::id::BookId;
use crate::domain::store::BookStore;

const COLLECTION: &str = "books";

/// REST API（json-server互換）によるBookStore実装。
///
/// `GET/POST {base}/books`, `GET/PUT/DELETE {base}/books/{id}`
#[derive(Debug, Clone)]
pub struct HttpBookStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBookStore {
    /// タイムアウトなしのクライアントで作る。
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(StoreError::transport)?;
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self, StoreError> {
        let mut url = Url::parse(base_url)
            .map_err(|e| StoreError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::InvalidBaseUrl(format!(
                "{base_url}: expected an http(s) URL"
            )));
        }
        url.set_query(None);
        url.set_fragment(None);
        Ok(Self {
            client,
            base_url: url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 1件取得。update応答が空だった場合の照合にも使う。
    pub async fn get(&self, id: &BookId) -> Result<Book, StoreError> {
        let body = self
            .execute(Method::GET, self.endpoint(Some(id)), None, Some(id))
            .await?;
        decode(&body)
    }

    // --- private ---

    /// `{base}/books` または `{base}/books/{id}`。IDは1セグメントとしてエスケープされる。
    fn endpoint(&self, id: Option<&BookId>) -> Url {
        let mut url = self.base_url.clone();
        // http(s)のURLはベースになれることをコンストラクタで確認済み
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(COLLECTION);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
        }
        url
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<&Book>,
        id: Option<&BookId>,
    ) -> Result<Vec<u8>, StoreError> {
        debug!(%method, %url, "sending store request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some(book) = body {
            request = request.json(book);
        }
        let response = request.send().await.map_err(StoreError::transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(StoreError::NotFound(id.clone()));
            }
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(StoreError::transport)?;
        debug!(%method, %url, status = status.as_u16(), len = bytes.len(), "store responded");
        Ok(bytes.to_vec())
    }

    /// 書き込み応答の本文を確定した表現として読む。
    /// 本文なしで成功を返すストアでは、取り直した表現を正とする。
    async fn confirmed(&self, body: Vec<u8>, id: &BookId) -> Result<Book, StoreError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return self.get(id).await;
        }
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(body).map_err(StoreError::decode)
}

#[async_trait]
impl BookStore for HttpBookStore {
    async fn list(&self) -> Result<Vec<Book>, StoreError> {
        let body = self
            .execute(Method::GET, self.endpoint(None), None, None)
            .await?;
        decode(&body)
    }

    async fn create(&self, book: &Book) -> Result<Book, StoreError> {
        let body = self
            .execute(Method::POST, self.endpoint(None), Some(book), None)
            .await?;
        self.confirmed(body, &book.id).await
    }

    async fn update(&self, book: &Book) -> Result<Book, StoreError> {
        let id = &book.id;
        let body = self
            .execute(Method::PUT, self.endpoint(Some(id)), Some(book), Some(id))
            .await?;
        self.confirmed(body, id).await
    }

    async fn delete(&self, id: &BookId) -> Result<(), StoreError> {
        self.execute(Method::DELETE, self.endpoint(Some(id)), None, Some(id))
            .await?;
        Ok(())
    }
}
