use rustc_hash::FxHashMap;

use crate::runtime::value::Value;

/// The single global variable scope of a program run.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    variables: FxHashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the bound value. A binding to `None` reads as unbound.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name).filter(|value| !value.is_none())
    }

    pub fn set(&mut self, name: &str, value: Value) {
        match self.variables.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.variables.insert(name.to_string(), value);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Environment;
    use crate::runtime::value::Value;

    #[test]
    fn overwrites_and_hides_null_bindings() {
        let mut environment = Environment::new();
        environment.set("x", Value::Int(1.into()));
        environment.set("x", Value::Int(2.into()));
        assert_eq!(environment.get("x"), Some(&Value::Int(2.into())));
        assert_eq!(environment.len(), 1);

        environment.set("empty", Value::None);
        assert!(environment.contains("empty"));
        assert_eq!(environment.get("empty"), None);
        assert_eq!(environment.get("missing"), None);
    }
}
