mod health_check;
mod helpers;
mod subscribe;

pub use health_check::health_check;
pub use subscribe::{NotificationOutcome, SubscribeError, SubscribeResponse, subscribe};
