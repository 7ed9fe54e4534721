#![forbid(unsafe_code)]

pub mod bookmarks;
pub mod progress;
pub mod repository;
pub mod sqlite;
pub mod xp;
