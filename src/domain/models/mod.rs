mod action;
mod author;
mod backend;
mod chat_turn;
mod error;
mod event;
mod file;
mod inventory;
mod loading;
mod message;
mod request;
mod session;
mod slash_commands;
mod textarea;

pub use action::*;
pub use author::*;
pub use backend::*;
pub use chat_turn::*;
pub use error::*;
pub use event::*;
pub use file::*;
pub use inventory::*;
pub use loading::*;
pub use message::*;
pub use request::*;
pub use session::*;
pub use slash_commands::*;
pub use textarea::*;
