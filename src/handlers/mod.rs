pub mod activities;
pub mod auth;
pub mod daily_entries;
pub mod diary;
pub mod health;
pub mod mood;
pub mod sessions;
