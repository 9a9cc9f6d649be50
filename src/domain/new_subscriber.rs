use super::SubscriberEmail;
use super::SubscriberName;

/// A subscriber whose form input has already been parsed. Only values of this
/// type ever reach the email service.
#[derive(Debug)]
pub struct NewSubscriber {
    pub email: SubscriberEmail,
    pub name: SubscriberName,
}
