//! Variable-list resolution: `k1=v1;k2=v2;` → [`Binding`].

use std::collections::BTreeSet;

use crate::error::StructuralError;
use crate::types::Binding;

/// Turns a directive's variable list into a [`Binding`].
///
/// Entries are separated by `;`. Blank entries are dropped. Each remaining
/// entry splits on its first `=`, so values may contain `=`. Both sides are
/// trimmed. A repeated key overwrites the earlier one, left to right.
#[derive(Debug, Clone, Default)]
pub struct BindingResolver {
    known_keys: Option<BTreeSet<String>>,
}

impl BindingResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict keys to `known`; anything else fails with `MalformedBinding`.
    pub fn with_known_keys<I, S>(known: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known_keys: Some(known.into_iter().map(Into::into).collect()),
        }
    }

    pub fn resolve(&self, vars: &str) -> Result<Binding, StructuralError> {
        let mut binding = Binding::new();
        for token in vars.split(';') {
            if token.trim().is_empty() {
                continue;
            }
            let (key, value) = token
                .split_once('=')
                .ok_or_else(|| StructuralError::binding(token, "expected `key=value`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(StructuralError::binding(token, "empty key"));
            }
            if let Some(known) = &self.known_keys {
                if !known.contains(key) {
                    return Err(StructuralError::binding(
                        token,
                        format!("unknown key `{key}`"),
                    ));
                }
            }
            if binding.get(key).is_some() {
                tracing::debug!("binding `{key}` repeated; later value wins");
            }
            binding.insert(key, value.trim());
        }
        Ok(binding)
    }
}

/// Resolve `vars` with no key restrictions.
pub fn resolve(vars: &str) -> Result<Binding, StructuralError> {
    BindingResolver::new().resolve(vars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(b: &Binding) -> Vec<(&str, &str)> {
        b.iter().collect()
    }

    #[test]
    fn parses_simple_list() {
        let b = resolve("a=1;b=2;").unwrap();
        assert_eq!(pairs(&b), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn resolution_is_deterministic() {
        assert_eq!(resolve("a=1;b=2;").unwrap(), resolve("a=1;b=2;").unwrap());
    }

    #[test]
    fn last_duplicate_wins() {
        let b = resolve("a=1;a=2;").unwrap();
        assert_eq!(pairs(&b), vec![("a", "2")]);
    }

    #[test]
    fn trailing_semicolon_is_optional() {
        assert_eq!(resolve("a=1;b=2").unwrap(), resolve("a=1;b=2;").unwrap());
    }

    #[test]
    fn empty_entries_are_dropped() {
        let b = resolve("a=1;;b=2;  ;").unwrap();
        assert_eq!(pairs(&b), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn empty_value_is_kept() {
        let b = resolve("key=;").unwrap();
        assert_eq!(b.get("key"), Some(""));
        let b = resolve(" key =   ").unwrap();
        assert_eq!(b.get("key"), Some(""));
    }

    #[test]
    fn value_may_contain_equals() {
        let b = resolve("expr=a==b;").unwrap();
        assert_eq!(b.get("expr"), Some("a==b"));
    }

    #[test]
    fn whitespace_is_trimmed() {
        let b = resolve(" ARR = matrix ; IsConst = True ;").unwrap();
        assert_eq!(b.get("ARR"), Some("matrix"));
        assert_eq!(b.get("IsConst"), Some("True"));
    }

    #[test]
    fn missing_equals_is_malformed() {
        let err = resolve("a=1;oops;").unwrap_err();
        assert!(matches!(err, StructuralError::MalformedBinding { ref token, .. } if token == "oops"));
    }

    #[test]
    fn empty_key_is_malformed() {
        let err = resolve(" =1;").unwrap_err();
        assert!(err.to_string().contains("empty key"), "got: {err}");
    }

    #[test]
    fn unknown_key_rejected_when_restricted() {
        let resolver = BindingResolver::with_known_keys(["a"]);
        assert!(resolver.resolve("a=1;").is_ok());
        let err = resolver.resolve("a=1;b=2;").unwrap_err();
        assert!(err.to_string().contains("unknown key `b`"), "got: {err}");
    }
}
