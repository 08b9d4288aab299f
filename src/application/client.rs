use tracing::{debug, info, warn};

use crate::domain::error::FormError;
use crate::domain::model::book::{Book, BookField};
use crate::domain::model::form::{EditMode, FormBuffer};
use crate::domain::model::id::BookId;
use crate::domain::store::BookStore;

use super::error::ClientError;

/// submit() の結果。どちらもストアが返した正規の表現を持つ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created(Book),
    Updated(Book),
}

impl SubmitOutcome {
    pub fn book(&self) -> &Book {
        match self {
            Self::Created(book) | Self::Updated(book) => book,
        }
    }
}

/// 書籍一覧と編集フォームの状態を持つコントローラ。
///
/// 一覧はストアのミラー（キャッシュ）に過ぎず、更新はストアの応答が返ってから反映する。
/// 失敗はログに残したうえで呼び出し側へ返す。リトライはしない。
pub struct BookManagerClient<S: BookStore> {
    store: S,
    books: Vec<Book>,
    form: FormBuffer,
    mode: EditMode,
}

impl<S: BookStore> BookManagerClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            books: Vec::new(),
            form: FormBuffer::new(),
            mode: EditMode::Create,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn find(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|b| &b.id == id)
    }

    pub fn form(&self) -> &FormBuffer {
        &self.form
    }

    pub fn edit_mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode == EditMode::Update
    }

    /// ストアから一覧を取り直し、キャッシュを丸ごと置き換える。
    /// 失敗時はキャッシュに手を付けない。
    pub async fn load(&mut self) -> Result<usize, ClientError> {
        match self.store.list().await {
            Ok(books) => {
                self.books = books;
                self.form.reset();
                self.mode = EditMode::Create;
                info!(count = self.books.len(), "loaded books");
                Ok(self.books.len())
            }
            Err(e) => {
                warn!(error = %e, "failed to load books");
                Err(e.into())
            }
        }
    }

    /// フォームの1フィールドだけを書き換える。
    pub fn update_field(
        &mut self,
        field: BookField,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        self.form.set(field, value.into()).inspect_err(|e| {
            debug!(%field, error = %e, "rejected form input");
        })
    }

    /// 既存Bookをフォームに写して更新モードに入る。
    pub fn begin_edit(&mut self, book: &Book) {
        self.form = FormBuffer::from_book(book);
        self.mode = EditMode::Update;
    }

    /// キャッシュ内のBookを選んで更新モードに入る。
    pub fn begin_edit_by_id(&mut self, id: &BookId) -> Result<(), FormError> {
        let book = self
            .find(id)
            .cloned()
            .ok_or_else(|| FormError::BookNotFound(id.clone()))?;
        self.begin_edit(&book);
        Ok(())
    }

    /// フォームを送信する。更新モードならupdate、それ以外はcreate。
    ///
    /// 成否にかかわらずフォームは空に戻り、作成モードに戻る。
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ClientError> {
        let form = std::mem::take(&mut self.form);
        let mode = std::mem::take(&mut self.mode);

        let result = match mode {
            EditMode::Update => self.submit_update(&form).await,
            EditMode::Create => self.submit_create(&form).await,
        };

        match &result {
            Ok(outcome) => info!(?mode, id = %outcome.book().id, "submitted book"),
            Err(e) => warn!(?mode, error = %e, "failed to submit book"),
        }
        result
    }

    /// ストアに削除を依頼し、成功した時だけキャッシュから除く。
    pub async fn remove(&mut self, id: &BookId) -> Result<(), ClientError> {
        match self.store.delete(id).await {
            Ok(()) => {
                self.books.retain(|b| &b.id != id);
                info!(%id, "removed book");
                Ok(())
            }
            Err(e) => {
                warn!(%id, error = %e, "failed to remove book");
                Err(e.into())
            }
        }
    }

    // --- private ---

    async fn submit_create(&mut self, form: &FormBuffer) -> Result<SubmitOutcome, ClientError> {
        let book = form.to_book(BookId::generate());
        let created = self.store.create(&book).await?;
        self.upsert(created.clone());
        Ok(SubmitOutcome::Created(created))
    }

    async fn submit_update(&mut self, form: &FormBuffer) -> Result<SubmitOutcome, ClientError> {
        let id = form.id().cloned().ok_or(FormError::MissingId)?;
        let book = form.to_book(id.clone());
        let confirmed = self.store.update(&book).await?;
        // キャッシュに無いレコードは追加しない（一覧の件数は変えない）
        if let Some(slot) = self.books.iter_mut().find(|b| b.id == id) {
            *slot = confirmed.clone();
        }
        Ok(SubmitOutcome::Updated(confirmed))
    }

    /// ID一意性を保ったまま追加する。
    fn upsert(&mut self, book: Book) {
        match self.books.iter_mut().find(|b| b.id == book.id) {
            Some(slot) => *slot = book,
            None => self.books.push(book),
        }
    }
}
