use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Render the placeholder for alias `key`, e.g. `${account_id}`.
pub fn alias_token(key: &str) -> String {
    format!("${{{key}}}")
}

/// Prefix/suffix policy and alias table used to rename resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRules {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

impl NamingRules {
    pub fn new(prefix: Option<&str>, suffix: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            suffix: suffix.map(str::to_owned),
            aliases: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_alias(mut self, key: &str, value: &str) -> Self {
        self.aliases.insert(key.to_owned(), value.to_owned());
        self
    }

    /// `(token, replacement)` pairs in alias-key order.
    pub fn alias_tokens(&self) -> impl Iterator<Item = (String, &str)> {
        self.aliases
            .iter()
            .map(|(key, value)| (alias_token(key), value.as_str()))
    }

    /// Substitute every alias token occurring anywhere in `input`.
    ///
    /// Used for rule strings (prefix, suffix), which are name fragments
    /// rather than whole values.
    pub fn resolve_aliases(&self, input: &str) -> String {
        self.alias_tokens()
            .fold(input.to_owned(), |acc, (token, value)| {
                if acc.contains(&token) {
                    acc.replace(&token, value)
                } else {
                    acc
                }
            })
    }

    /// `suffix(prefix(name))`; an unset or empty rule leaves the name unchanged.
    pub fn resolve_name(&self, name: &str) -> String {
        let mut resolved = String::new();
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            resolved.push_str(&self.resolve_aliases(prefix));
        }
        resolved.push_str(name);
        if let Some(suffix) = self.suffix.as_deref().filter(|s| !s.is_empty()) {
            resolved.push_str(&self.resolve_aliases(suffix));
        }
        resolved
    }
}
