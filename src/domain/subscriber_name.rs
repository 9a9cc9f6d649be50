use unicode_segmentation::UnicodeSegmentation;

/// Characters that have no business in a display name and tend to break HTML
/// or vendor merge fields.
const FORBIDDEN_CHARS: &str = r#"/()"<>\{}"#;

/// Subscriber display name, passed to providers as the `Name` merge field.
///
/// Rejects blank input, anything longer than 256 graphemes (Cyrillic names are
/// counted by grapheme, not byte) and names containing `FORBIDDEN_CHARS`.
#[derive(Debug, Clone)]
pub struct SubscriberName(String);

impl SubscriberName {
    pub fn parse(name: String) -> Result<Self, String> {
        let name = name.trim().to_string();
        let empty = name.is_empty();
        let too_long = name.graphemes(true).count() > 256;
        let bad = name.chars().any(|c| FORBIDDEN_CHARS.contains(c));
        match !empty && !too_long && !bad {
            true => Ok(Self(name)),
            false => Err(format!("Invalid name: {name:?}")),
        }
    }
}

impl AsRef<str> for SubscriberName {
    fn as_ref(&self) -> &str { &self.0 }
}
