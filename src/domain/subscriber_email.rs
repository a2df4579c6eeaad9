use once_cell::sync::Lazy;
use regex::Regex;

// One non-whitespace run, an `@`, and a domain run containing a dot.
// A syntactic sanity check, not RFC 5322 validation.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("Invalid email pattern"));

#[derive(Debug, Clone)]
pub struct SubscriberEmail(String);

impl SubscriberEmail {
    pub fn parse(s: String) -> Result<Self, String> {
        let s = s.trim();
        if !EMAIL_PATTERN.is_match(s) {
            return Err(format!("{s} is not a valid subscriber email."));
        };
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for SubscriberEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SubscriberEmail {
    type Error = String;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        SubscriberEmail::parse(value)
    }
}
