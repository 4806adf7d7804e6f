//! The call payload handed to a wrapped function.
//!
//! Typed step variants keep their semantically meaningful slots as named
//! fields and derive a `CallArgs` on demand; the generic `FunctionStep`
//! stores one directly. Keyword order is insertion order (`IndexMap`), which
//! matters downstream when descriptors end up embedded in file names.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

/// Ordered positional arguments plus an insertion-ordered keyword mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keyword: IndexMap<String, Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_positional(&mut self, value: impl Into<Value>) -> &mut Self {
        self.positional.push(value.into());
        self
    }

    pub fn set_kwarg(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.positional.get(index).and_then(Value::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.keyword.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.keyword.get(name).and_then(Value::as_f64)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.keyword.get(name).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.keyword.get(name).and_then(Value::as_bool)
    }

    /// Names of string-valued slots currently holding the empty string.
    ///
    /// Path slots default to `""` until set or linked; any such slot makes
    /// the owning step not-ready. Non-string values (numeric parameters,
    /// nulls) always pass.
    pub fn empty_string_slots(&self) -> Vec<String> {
        let mut missing = Vec::new();
        for (idx, value) in self.positional.iter().enumerate() {
            if value.as_str().is_some_and(str::is_empty) {
                missing.push(format!("positional[{idx}]"));
            }
        }
        for (name, value) in &self.keyword {
            if value.as_str().is_some_and(str::is_empty) {
                missing.push(name.clone());
            }
        }
        missing
    }
}

impl fmt::Display for CallArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, value) in self.positional.iter().enumerate() {
            writeln!(f, "    [{idx}]: {value}")?;
        }
        for (name, value) in &self.keyword {
            writeln!(f, "    {name}: {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_string_slots_flags_only_empty_strings() {
        let mut args = CallArgs::new();
        args.push_positional("");
        args.push_positional("/data/in.nii.gz");
        args.set_kwarg("out_path", "");
        args.set_kwarg("half_life", json!(null));
        args.set_kwarg("w_size", 60.0);
        assert_eq!(args.empty_string_slots(), vec!["positional[0]", "out_path"]);
    }

    #[test]
    fn keyword_order_is_insertion_order() {
        let mut args = CallArgs::new();
        args.set_kwarg("b", 1).set_kwarg("a", 2).set_kwarg("c", 3);
        let keys: Vec<&str> = args.keyword.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
