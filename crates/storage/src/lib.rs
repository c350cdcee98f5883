#![forbid(unsafe_code)]

pub mod cache;
pub mod csv_bank;
pub mod repository;
pub mod sqlite;

pub use cache::CachedQuestionBank;
pub use csv_bank::CsvQuestionBank;
pub use repository::{
    Cookie, CookieJar, InMemoryCookieJar, InMemoryQuestionBank, QuestionBank, Storage,
    StorageError,
};
