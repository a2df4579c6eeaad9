mod errors;
mod helpers;
mod subscribe_handler;
mod types;

pub use errors::SubscribeError;
pub use subscribe_handler::subscribe;
pub use types::{NotificationOutcome, SubscribeResponse};
