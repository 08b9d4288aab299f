pub mod book;
pub mod form;
pub mod id;
