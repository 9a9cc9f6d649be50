mod confirmation_token;
mod new_subscriber;
mod subscriber_email;
mod subscriber_name;
// allow external `use` statements to skip the submodule names
pub use confirmation_token::ConfirmationToken;
pub use confirmation_token::TokenError;
pub use new_subscriber::NewSubscriber;
pub use subscriber_email::SubscriberEmail;
pub use subscriber_name::SubscriberName;
