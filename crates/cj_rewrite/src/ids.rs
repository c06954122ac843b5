//! Temporary identifier generation.

/// Hands out `prefix$N` names from a counter owned by one rewrite.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `prefix$N` and bump the counter.
    pub fn generate(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}${}", self.next);
        self.next += 1;
        id
    }

    /// Start numbering from zero again.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_count_up_across_prefixes() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.generate("mod"), "mod$0");
        assert_eq!(ids.generate("mod"), "mod$1");
        assert_eq!(ids.generate("key"), "key$2");
    }

    #[test]
    fn reset_restarts_numbering() {
        let mut ids = IdGenerator::new();
        ids.generate("mod");
        ids.generate("mod");
        ids.reset();
        assert_eq!(ids.generate("mod"), "mod$0");
    }
}
