//! Unique object name generation
//!
//! Unnamed objects are called `<Class><n>`. The engine checkpoints the
//! counters before every forward evaluation and restores them on undo, so
//! undo followed by redo mints the same names again.

use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct UniqueNameGenerator {
    counters: HashMap<String, u64>,
    checkpoints: VecDeque<HashMap<String, u64>>,
}

impl UniqueNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next name for `prefix`: `prefix1`, `prefix2`, ...
    pub fn generate(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}{}", prefix, counter)
    }

    /// Next name for `prefix` that `is_taken` does not reject
    pub fn generate_unused(&mut self, prefix: &str, is_taken: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate = self.generate(prefix);
            if !is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Checkpoint the current counters
    pub fn push_state(&mut self) {
        self.checkpoints.push_back(self.counters.clone());
    }

    /// Restore the last checkpoint; no-op without one
    pub fn pop_state(&mut self) {
        if let Some(saved) = self.checkpoints.pop_back() {
            self.counters = saved;
        }
    }

    /// Drop the last checkpoint and keep the current counters
    pub fn discard_state(&mut self) {
        self.checkpoints.pop_back();
    }

    /// Forget the oldest checkpoint, once its evaluation left the history
    pub fn drop_oldest_checkpoint(&mut self) {
        self.checkpoints.pop_front();
    }

    pub fn num_checkpoints(&self) -> usize {
        self.checkpoints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_per_prefix() {
        let mut names = UniqueNameGenerator::new();
        assert_eq!(names.generate("C"), "C1");
        assert_eq!(names.generate("C"), "C2");
        assert_eq!(names.generate("D"), "D1");
    }

    #[test]
    fn test_pop_replays_names() {
        let mut names = UniqueNameGenerator::new();
        names.generate("C");
        names.push_state();
        assert_eq!(names.generate("C"), "C2");
        assert_eq!(names.generate("C"), "C3");
        names.pop_state();
        assert_eq!(names.generate("C"), "C2");
    }

    #[test]
    fn test_pop_without_checkpoint_is_noop() {
        let mut names = UniqueNameGenerator::new();
        names.generate("C");
        names.pop_state();
        assert_eq!(names.generate("C"), "C2");
        assert_eq!(names.num_checkpoints(), 0);
    }

    #[test]
    fn test_discard_and_drop_oldest_keep_counters() {
        let mut names = UniqueNameGenerator::new();
        names.push_state();
        names.generate("C");
        names.push_state();
        names.generate("C");
        names.push_state();

        names.drop_oldest_checkpoint();
        names.discard_state();
        assert_eq!(names.num_checkpoints(), 1);
        assert_eq!(names.generate("C"), "C3");

        // the remaining checkpoint is the one taken after C1
        names.pop_state();
        assert_eq!(names.generate("C"), "C2");
        names.drop_oldest_checkpoint();
        assert_eq!(names.num_checkpoints(), 0);
    }

    #[test]
    fn test_generate_unused_skips_taken() {
        let mut names = UniqueNameGenerator::new();
        let name = names.generate_unused("C", |n| n == "C1" || n == "C2");
        assert_eq!(name, "C3");
    }
}
