pub mod http_store;
pub mod json_store;
