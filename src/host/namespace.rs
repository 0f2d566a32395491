//! Namespace storage shared by hosts.

use std::collections::HashMap;

use crate::host::Value;

/// Name → value bindings that live across invocations.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    bindings: HashMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    /// Iterates over every binding, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Scalar;

    #[test]
    fn test_set_overwrites() {
        let mut ns = Namespace::new();
        ns.set("x", Value::Scalar(Scalar::Int(1)));
        ns.set("x", Value::Scalar(Scalar::Int(2)));

        assert_eq!(ns.iter().count(), 1);
        assert_eq!(ns.get("x"), Some(&Value::Scalar(Scalar::Int(2))));
    }

    #[test]
    fn test_get_unbound() {
        let ns = Namespace::new();
        assert!(ns.get("x").is_none());
        assert_eq!(ns.iter().count(), 0);
    }
}
