pub mod health;
pub mod keywords;
pub mod sessions;
