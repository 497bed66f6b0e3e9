pub mod chat;
pub mod errors;
pub mod events;
pub mod history;
pub mod requests;
pub mod styles;
