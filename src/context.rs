//! Per-block translation context (the translator's only mutable state).

use crate::config::CpuConfig;
use crate::window::WindowChecker;

/// How the current block's control flow has been left by the last emitted
/// instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Nothing jumped yet; the block driver may decode another instruction.
    Continue,
    /// PC was assigned a concrete value but no jump/exit was emitted yet.
    PcUpdated,
    /// A jump or exception was emitted; this block is done.
    Jumped,
}

/// Mutable state threaded through decoding of one basic block.
pub struct TranslationContext {
    pub pc: u32,
    /// `LEND` as it stood when the block began; loop-end checks compare
    /// against this snapshot, not a live read, matching the single-block
    /// granularity of the zero-overhead loop check.
    pub lend_snapshot: Option<u32>,
    pub termination: Termination,
    pub single_step: bool,
    pub window: WindowChecker,
    pub config: CpuConfig,
    insn_count: u32,
    max_insns: u32,
}

impl TranslationContext {
    pub fn new(pc: u32, config: CpuConfig, lend_snapshot: Option<u32>, max_insns: u32) -> Self {
        Self {
            pc,
            lend_snapshot,
            termination: Termination::Continue,
            single_step: false,
            window: WindowChecker::new(),
            config,
            insn_count: 0,
            max_insns,
        }
    }

    pub fn advance_pc(&mut self, len: u8) {
        self.pc = self.pc.wrapping_add(u32::from(len));
        self.insn_count += 1;
    }

    pub fn is_done(&self) -> bool {
        self.termination != Termination::Continue || self.insn_count >= self.max_insns
    }

    /// Any emission that may move `WINDOW_BASE`/`WINDOW_START` must call this.
    pub fn reset_used_window(&mut self) {
        self.window.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, Options};

    fn cfg() -> CpuConfig {
        CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false)
    }

    #[test]
    fn is_done_respects_max_insns() {
        let mut ctx = TranslationContext::new(0, cfg(), None, 2);
        assert!(!ctx.is_done());
        ctx.advance_pc(3);
        assert!(!ctx.is_done());
        ctx.advance_pc(3);
        assert!(ctx.is_done());
    }

    #[test]
    fn jumped_termination_marks_done_immediately() {
        let mut ctx = TranslationContext::new(0, cfg(), None, 1000);
        ctx.termination = Termination::Jumped;
        assert!(ctx.is_done());
    }
}
