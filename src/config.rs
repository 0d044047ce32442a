//! Process-wide configuration for the semantic analyzer: the active
//! `#pragma pack` alignment ceiling and the x86-64 vs. i386 target flag.
//!
//! These mirror the small set of "process-wide bookkeeping variables"
//! established at invocation start and reset at the end of a run; a second
//! invocation on the same process re-initializes them via `SemanticConfig::new`
//! rather than carrying over state from the previous one.

#[derive(Debug, Clone, Copy)]
pub struct SemanticConfig {
    pack_alignment: Option<u32>,
    x86_64: bool,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        SemanticConfig {
            pack_alignment: None,
            x86_64: true,
        }
    }
}

impl SemanticConfig {
    pub fn new() -> Self {
        SemanticConfig::default()
    }

    /// `semantic_set_pack(n)`. `n == 0` clears the pack ceiling (natural
    /// alignment resumes).
    pub fn set_pack(&mut self, n: u32) {
        self.pack_alignment = if n == 0 { None } else { Some(n) };
    }

    pub fn pack_alignment(&self) -> Option<u32> {
        self.pack_alignment
    }

    /// `semantic_set_x86_64(flag)`.
    pub fn set_x86_64(&mut self, flag: bool) {
        self.x86_64 = flag;
    }

    pub fn x86_64(&self) -> bool {
        self.x86_64
    }

    pub fn pointer_size(&self) -> u32 {
        if self.x86_64 {
            8
        } else {
            4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_zero_clears_ceiling() {
        let mut cfg = SemanticConfig::new();
        cfg.set_pack(1);
        assert_eq!(cfg.pack_alignment(), Some(1));
        cfg.set_pack(0);
        assert_eq!(cfg.pack_alignment(), None);
    }

    #[test]
    fn x86_64_selects_pointer_size() {
        let mut cfg = SemanticConfig::new();
        cfg.set_x86_64(false);
        assert_eq!(cfg.pointer_size(), 4);
    }
}
