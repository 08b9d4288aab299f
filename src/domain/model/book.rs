use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::{text_or_number, BookId};
use crate::domain::error::FormError;

/// 書籍レコード。ストアとの間でそのままJSONとして送受信する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    /// 整数らしきテキスト（数値入力欄の値そのもの）
    #[serde(default, deserialize_with = "text_or_number")]
    pub publish_year: String,
    #[serde(default)]
    pub language: String,
}

impl Book {
    pub fn new(id: impl Into<BookId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            isbn: String::new(),
            publish_year: String::new(),
            language: String::new(),
        }
    }

    pub fn field(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Isbn => &self.isbn,
            BookField::PublishYear => &self.publish_year,
            BookField::Language => &self.language,
        }
    }
}

/// フォームで編集可能なフィールド。IDは含まない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookField {
    Title,
    Author,
    Isbn,
    PublishYear,
    Language,
}

impl BookField {
    pub const ALL: [BookField; 5] = [
        BookField::Title,
        BookField::Author,
        BookField::Isbn,
        BookField::PublishYear,
        BookField::Language,
    ];

    /// フォーム上のフィールド名（JSONのキーと同じ）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Isbn => "isbn",
            Self::PublishYear => "publishYear",
            Self::Language => "language",
        }
    }

    /// 画面表示用ラベル
    pub fn label(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Isbn => "ISBN",
            Self::PublishYear => "Publish Year",
            Self::Language => "Language",
        }
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BookField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "author" => Ok(Self::Author),
            "isbn" => Ok(Self::Isbn),
            "publishYear" | "publish_year" => Ok(Self::PublishYear),
            "language" => Ok(Self::Language),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}
