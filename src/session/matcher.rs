//! Structured element matchers
//!
//! Every fallback step of the posting pipeline is one of these descriptors;
//! drivers resolve them through `PageContext::query_all` /
//! `ElementRef::query_all`.

use std::fmt;

/// How to find candidate elements inside a scope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Plain CSS selector
    Css(String),
    /// CSS selector, keeping elements whose visible text contains `text`
    /// (case-insensitive)
    CssWithText { selector: String, text: String },
    /// Elements with an explicit or implicit ARIA role and an exact
    /// accessible name
    Role { role: String, name: String },
    /// Innermost elements whose text contains `text` (case-insensitive)
    Text(String),
}

impl Matcher {
    pub fn css<S: Into<String>>(selector: S) -> Self {
        Matcher::Css(selector.into())
    }

    pub fn css_with_text<S: Into<String>, T: Into<String>>(selector: S, text: T) -> Self {
        Matcher::CssWithText {
            selector: selector.into(),
            text: text.into(),
        }
    }

    pub fn role<S: Into<String>, T: Into<String>>(role: S, name: T) -> Self {
        Matcher::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn text<S: Into<String>>(text: S) -> Self {
        Matcher::Text(text.into())
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Css(selector) => write!(f, "{}", selector),
            Matcher::CssWithText { selector, text } => write!(f, "{}:has-text({:?})", selector, text),
            Matcher::Role { role, name } => write!(f, "role={}[name={:?}]", role, name),
            Matcher::Text(text) => write!(f, "text={}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Matcher::css("textarea").to_string(), "textarea");
        assert_eq!(
            Matcher::css_with_text("div[role=\"button\"]", "Post").to_string(),
            "div[role=\"button\"]:has-text(\"Post\")"
        );
        assert_eq!(Matcher::role("button", "Post").to_string(), "role=button[name=\"Post\"]");
        assert_eq!(Matcher::text("Post").to_string(), "text=Post");
    }

    #[test]
    fn test_matchers_are_hashable_keys() {
        let mut set = std::collections::HashSet::new();
        set.insert(Matcher::css("textarea"));
        set.insert(Matcher::css("textarea"));
        set.insert(Matcher::text("textarea"));
        assert_eq!(set.len(), 2);
    }
}
