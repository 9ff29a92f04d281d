use std::collections::HashSet;

use crate::translator::STANDARD_TYPES;

/// The set of words that currently name a type.
///
/// Names only ever get added while parsing; [`TypeNames::rollback`] exists
/// so a failed speculative parse can drop what it registered.
#[derive(Clone, Debug, Default)]
pub struct TypeNames {
    names: HashSet<String>,
    order: Vec<String>,
    standard: bool,
}

impl TypeNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set that also knows the type names the standard headers provide
    /// (`size_t`, `FILE`, `uint8_t`, ...). Those can still be registered
    /// again, e.g. through `#type FILE`.
    pub fn with_standard() -> Self {
        Self {
            standard: true,
            ..Self::default()
        }
    }

    /// Adds names known before parsing starts, ignoring repeats.
    pub fn supply<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if self.names.insert(name.clone()) {
                self.order.push(name);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name) || (self.standard && STANDARD_TYPES.contains(name))
    }

    /// Returns `false` when the name was already registered.
    pub fn register(&mut self, name: &str) -> bool {
        if !self.names.insert(name.to_string()) {
            return false;
        }
        self.order.push(name.to_string());
        true
    }

    pub fn checkpoint(&self) -> usize {
        self.order.len()
    }

    pub fn rollback(&mut self, checkpoint: usize) {
        for name in self.order.drain(checkpoint..) {
            self.names.remove(&name);
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn register_twice_is_refused() {
        let mut names = TypeNames::new();
        assert!(names.register("foo_t"));
        assert!(!names.register("foo_t"));
        assert!(names.contains("foo_t"));
    }

    #[test]
    fn rollback_drops_later_names_only() {
        let mut names = TypeNames::new();
        names.supply(["a_t", "b_t", "a_t"]);
        assert_eq!(names.len(), 2);
        let mark = names.checkpoint();
        names.register("c_t");
        names.rollback(mark);
        assert!(!names.contains("c_t"));
        assert!(names.contains("a_t") && names.contains("b_t"));
    }

    #[test]
    fn standard_names_are_known_but_not_registered() {
        let mut names = TypeNames::with_standard();
        assert!(names.contains("size_t"));
        assert!(names.contains("FILE"));
        assert!(!TypeNames::new().contains("size_t"));
        assert!(names.register("FILE"));
    }
}
