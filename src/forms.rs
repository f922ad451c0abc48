// Mutation input schemas - explicit named fields per mutation, validated
// before any store access. Author identity is never part of a schema; it is
// bound server-side from the viewer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Per-field validation messages surfaced back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap())
}

/// Input schema for create-post and edit-post.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostInput {
    pub text: String,
    /// Group slug, resolved by the handler.
    pub group: Option<String>,
    /// Asset reference handed out by the binary asset store.
    pub image: Option<String>,
}

impl PostInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.insert("text", "Post text must not be empty");
        }
        if let Some(slug) = self.group.as_deref() {
            if !slug_pattern().is_match(slug) {
                errors.insert("group", format!("'{}' is not a valid group slug", slug));
            }
        }
        errors
    }
}

/// Input schema for create-comment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentInput {
    pub text: String,
}

impl CommentInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.insert("text", "Comment text must not be empty");
        }
        errors
    }
}
