pub mod controller;
pub mod markup;
pub mod session;

pub use controller::{ChatController, ChatError, ChatPartner, ChatPhase, ChatState, ChatView, Draft};
pub use session::{SessionContext, SessionStore};
