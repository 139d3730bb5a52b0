//! Submitted form data and the request around it.
//!
//! The save path only reads posted values through [`Submission::get`], which
//! applies the array/scalar shape the field's sanitizer flags ask for.

use std::collections::HashMap;

use metabox_fields::RawInput;

use crate::auth::Principal;

/// Form field carrying the anti-forgery token
pub const NONCE_FIELD: &str = "metabox_nonce";

/// Action the anti-forgery token is issued for
pub const NONCE_ACTION: &str = "metabox_save_data";

/// Posted `action` value for inline quick-edit saves
pub const INLINE_SAVE_ACTION: &str = "inline-save";

/// Raw posted values keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    values: HashMap<String, RawInput>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Keys ending in `[]` collect into a list under the bare key. A repeated
    /// scalar key keeps its last value.
    pub fn from_urlencoded(body: &str) -> Self {
        let mut submission = Self::new();
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.strip_suffix("[]") {
                Some(bare) => submission.push(bare, value.into_owned()),
                None => submission.insert(key.into_owned(), value.into_owned()),
            }
        }
        submission
    }

    /// Set a scalar value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), RawInput::Scalar(value.into()));
    }

    /// Append to a list value, converting a scalar into a list if needed.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let slot = self
            .values
            .entry(key.into())
            .or_insert_with(|| RawInput::List(Vec::new()));
        if let RawInput::Scalar(existing) = slot {
            let first = std::mem::take(existing);
            *slot = RawInput::List(vec![first]);
        }
        if let RawInput::List(items) = slot {
            items.push(value);
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.insert(
            key.into(),
            RawInput::List(values.into_iter().map(Into::into).collect()),
        );
        self
    }

    /// Read the raw value posted under `key`.
    ///
    /// With `as_array`, a posted scalar comes back as a one-element list.
    /// Without it, the value is returned in the shape it was posted.
    pub fn get(&self, key: &str, as_array: bool) -> Option<RawInput> {
        let raw = self.values.get(key)?;
        Some(match (raw, as_array) {
            (RawInput::Scalar(s), true) => RawInput::List(vec![s.clone()]),
            (other, _) => other.clone(),
        })
    }

    /// Scalar value posted under `key`, if it was posted as a scalar.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            RawInput::Scalar(s) => Some(s),
            RawInput::List(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything the save path needs to know about the request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub principal: Principal,
    pub submission: Submission,
    /// Background/async partial save
    pub is_ajax: bool,
}

impl Request {
    pub fn new(principal: Principal, submission: Submission) -> Self {
        Self {
            principal,
            submission,
            is_ajax: false,
        }
    }

    pub fn ajax(mut self) -> Self {
        self.is_ajax = true;
        self
    }

    /// Anti-forgery token posted with the form.
    pub fn nonce(&self) -> Option<&str> {
        self.submission.scalar(NONCE_FIELD)
    }

    /// Inline quick-edit saves post `action=inline-save`.
    pub fn is_inline_save(&self) -> bool {
        self.submission.scalar("action") == Some(INLINE_SAVE_ACTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_collects_bracketed_keys() {
        let submission = Submission::from_urlencoded(
            "_mb_title=Hello+World&_mb_tags%5B%5D=a&_mb_tags%5B%5D=b&_mb_note=%22hi%22",
        );
        assert_eq!(
            submission.get("_mb_title", false),
            Some(RawInput::Scalar("Hello World".into()))
        );
        assert_eq!(
            submission.get("_mb_tags", true),
            Some(RawInput::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(submission.scalar("_mb_note"), Some("\"hi\""));
        assert_eq!(submission.len(), 3);
    }

    #[test]
    fn repeated_scalar_keeps_last() {
        let submission = Submission::from_urlencoded("a=1&a=2");
        assert_eq!(submission.scalar("a"), Some("2"));
    }

    #[test]
    fn get_as_array_coerces_scalar() {
        let submission = Submission::new().with("k", "v");
        assert_eq!(
            submission.get("k", true),
            Some(RawInput::List(vec!["v".into()]))
        );
        assert_eq!(submission.get("k", false), Some(RawInput::Scalar("v".into())));
        assert_eq!(submission.get("missing", true), None);
    }

    #[test]
    fn get_without_array_keeps_list_shape() {
        let submission = Submission::new().with_list("k", ["a", "b"]);
        assert_eq!(
            submission.get("k", false),
            Some(RawInput::List(vec!["a".into(), "b".into()]))
        );
        assert_eq!(submission.scalar("k"), None);
    }

    #[test]
    fn push_upgrades_scalar_to_list() {
        let mut submission = Submission::new().with("k", "a");
        submission.push("k", "b");
        assert_eq!(
            submission.get("k", false),
            Some(RawInput::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn request_detects_inline_save_and_nonce() {
        let request = Request::new(
            Principal::new(1),
            Submission::new()
                .with("action", INLINE_SAVE_ACTION)
                .with(NONCE_FIELD, "token"),
        );
        assert!(request.is_inline_save());
        assert_eq!(request.nonce(), Some("token"));
        assert!(!request.is_ajax);
        assert!(request.clone().ajax().is_ajax);
    }
}
