use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;

/// Turns a member identifier into its default setting name.
#[derive(Clone, Default)]
pub enum NamingPolicy {
    /// The identifier as written.
    #[default]
    Default,
    /// `UpperStorage`
    PascalCase,
    /// `upperStorage`
    CamelCase,
    /// `upper_storage`
    SnakeCase,
    /// `upper-storage`
    KebabCase,
    Custom(Arc<dyn Fn(&str) -> String + Send + Sync>),
}

impl NamingPolicy {
    pub fn custom(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        NamingPolicy::Custom(Arc::new(f))
    }

    /// Parses the names accepted by `#[config(naming = "...")]`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "default" => NamingPolicy::Default,
            "PascalCase" => NamingPolicy::PascalCase,
            "camelCase" => NamingPolicy::CamelCase,
            "snake_case" => NamingPolicy::SnakeCase,
            "kebab-case" => NamingPolicy::KebabCase,
            _ => return None,
        })
    }

    #[must_use]
    pub fn apply(&self, ident: &str) -> String {
        match self {
            NamingPolicy::Default => ident.into(),
            NamingPolicy::PascalCase => split_words(ident).iter().map(|w| capitalize(w)).collect(),
            NamingPolicy::CamelCase => split_words(ident)
                .iter()
                .enumerate()
                .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
                .collect(),
            NamingPolicy::SnakeCase => split_words(ident).join("_"),
            NamingPolicy::KebabCase => split_words(ident).join("-"),
            NamingPolicy::Custom(f) => f(ident),
        }
    }
}

impl fmt::Debug for NamingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingPolicy::Default => f.write_str("Default"),
            NamingPolicy::PascalCase => f.write_str("PascalCase"),
            NamingPolicy::CamelCase => f.write_str("CamelCase"),
            NamingPolicy::SnakeCase => f.write_str("SnakeCase"),
            NamingPolicy::KebabCase => f.write_str("KebabCase"),
            NamingPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Splits an identifier into lowercase words at `_`, `-` and lower-to-upper
/// case transitions. Digits stay attached to the word before them.
#[must_use]
pub fn split_words(ident: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in ident.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(core::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(core::mem::take(&mut current));
        }
        current.extend(c.to_lowercase());
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
