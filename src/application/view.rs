//! 一覧・フォームのテキスト表示

use crate::domain::model::book::{Book, BookField};
use crate::domain::model::form::{EditMode, FormBuffer};

/// 書籍一覧を番号付きで描画する。番号は `edit` / `delete` で参照できる。
pub fn render_book_list(books: &[Book]) -> String {
    let mut buf = format!("# Book List ({} books)\n", books.len());

    if books.is_empty() {
        buf.push_str("\n(empty) Fill in the form with `set_field` and `submit` to add a book.\n");
        return buf;
    }

    for (i, book) in books.iter().enumerate() {
        buf.push_str(&format!("\n{}. {}\n", i + 1, display_value(&book.title)));
        buf.push_str(&format!("   Author: {}\n", display_value(&book.author)));
        buf.push_str(&format!("   ISBN: {}\n", display_value(&book.isbn)));
        buf.push_str(&format!("   Published: {}\n", display_value(&book.publish_year)));
        buf.push_str(&format!("   Language: {}\n", display_value(&book.language)));
        buf.push_str(&format!("   ID: {}\n", book.id));
    }
    buf
}

/// フォームの現在値を描画する。見出しと送信ボタンの文言はモードで切り替わる。
pub fn render_form(form: &FormBuffer, mode: EditMode) -> String {
    let (heading, button) = match mode {
        EditMode::Create => ("Add New Book", "Add Book"),
        EditMode::Update => ("Update Book", "Save Changes"),
    };

    let mut buf = format!("# {heading}\n\n");
    if let (EditMode::Update, Some(id)) = (mode, form.id()) {
        buf.push_str(&format!("Editing: {id}\n"));
    }
    for field in BookField::ALL {
        buf.push_str(&format!(
            "{}: {}\n",
            field.label(),
            display_value(form.get(field))
        ));
    }
    buf.push_str(&format!("\n[{button}]\n"));
    buf
}

fn display_value(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}
