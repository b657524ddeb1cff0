mod auth;
mod health_check;
mod messages;

pub use auth::{current_session, login, register};
pub use health_check::health_check;
pub use messages::{list_messages, post_message};
