pub mod catalog;
pub mod chat;
pub mod profile;
pub mod validate;
