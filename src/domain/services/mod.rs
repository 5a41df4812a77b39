pub mod actions;
mod app_state;
mod bubble;
mod bubble_list;
mod conversation_driver;
pub mod events;
mod orchestrator;
mod scroll;
mod session_manager;
mod session_reset;
mod upload_coordinator;

pub use app_state::*;
pub use bubble::*;
pub use bubble_list::*;
pub use conversation_driver::*;
pub use orchestrator::*;
pub use scroll::*;
pub use session_manager::*;
pub use session_reset::*;
pub use upload_coordinator::*;
