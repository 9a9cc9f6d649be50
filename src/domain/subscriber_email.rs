use validator::ValidateEmail;

/// A syntactically valid email address. Used for recipients; provider
/// adapters never validate addresses themselves, so parsing has to happen
/// before anything is handed to the email service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(email: String) -> Result<Self, String> {
        let email = email.trim().to_string();
        ValidateEmail::validate_email(&email)
            .then_some(Self(email.clone()))
            .ok_or(format!("Invalid email: {email:?}"))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str { &self.0 }
}

impl std::fmt::Display for SubscriberEmail {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
