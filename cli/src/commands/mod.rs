pub mod chat;
pub mod health;
pub mod keywords;
pub mod scan;
pub mod session;
