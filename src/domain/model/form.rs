use super::book::{Book, BookField};
use super::id::BookId;
use crate::domain::error::FormError;

/// 送信方式。既存レコードを選んだ時だけ `Update`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditMode {
    #[default]
    Create,
    Update,
}

/// 送信前の編集バッファ。フィールド単位で書き換え、送信時にBookへ変換する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormBuffer {
    id: Option<BookId>,
    title: String,
    author: String,
    isbn: String,
    publish_year: String,
    language: String,
}

impl FormBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存Bookの内容をそのまま写す。
    pub fn from_book(book: &Book) -> Self {
        Self {
            id: Some(book.id.clone()),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            publish_year: book.publish_year.clone(),
            language: book.language.clone(),
        }
    }

    pub fn id(&self) -> Option<&BookId> {
        self.id.as_ref()
    }

    pub fn get(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Isbn => &self.isbn,
            BookField::PublishYear => &self.publish_year,
            BookField::Language => &self.language,
        }
    }

    /// 1フィールドだけ書き換える。検証は数値入力欄相当（publishYear）のみ。
    pub fn set(&mut self, field: BookField, value: String) -> Result<(), FormError> {
        let slot = match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Isbn => &mut self.isbn,
            BookField::PublishYear => {
                if !is_integer_like(&value) {
                    return Err(FormError::InvalidPublishYear(value));
                }
                &mut self.publish_year
            }
            BookField::Language => &mut self.language,
        };
        *slot = value;
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// 未入力の必須項目。フォーム上は全項目が必須。
    pub fn missing_fields(&self) -> Vec<BookField> {
        BookField::ALL
            .into_iter()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    pub fn to_book(&self, id: BookId) -> Book {
        Book {
            id,
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            publish_year: self.publish_year.clone(),
            language: self.language.clone(),
        }
    }
}

/// 空、または任意の先頭 `-` に続くASCII数字列。
fn is_integer_like(s: &str) -> bool {
    if s.is_empty() {
        return true;
    }
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
