mod admin;
mod health_check;
mod subscriptions;
mod subscriptions_confirm;

pub use admin::*;
pub use health_check::*;
pub use subscriptions::*;
pub use subscriptions_confirm::*;
