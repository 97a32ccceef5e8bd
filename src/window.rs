//! Register-window bounds checking (C3), amortized per translation block.

use crate::config::{CpuConfig, Options};
use crate::helpers::HelperAbi;
use crate::ir::{Helper, IrBuilder, Temp};

/// Tracks the largest window quarter already validated in the current block.
///
/// Any emission that may perturb `WINDOW_BASE`/`WINDOW_START` must call
/// [`WindowChecker::reset`]; the next reference re-validates from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowChecker {
    used_window: u8,
}

impl WindowChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.used_window = 0;
    }

    /// Validates a single register reference `r` (0..=15), amortizing
    /// against the block's high-water mark.
    pub fn check1(&mut self, cfg: &CpuConfig, ir: &mut impl IrBuilder, pc_temp: Temp, r: u8) {
        self.check_quarter(cfg, ir, pc_temp, r / 4);
    }

    pub fn check2(&mut self, cfg: &CpuConfig, ir: &mut impl IrBuilder, pc_temp: Temp, r1: u8, r2: u8) {
        self.check_quarter(cfg, ir, pc_temp, r1.max(r2) / 4);
    }

    pub fn check3(
        &mut self,
        cfg: &CpuConfig,
        ir: &mut impl IrBuilder,
        pc_temp: Temp,
        r1: u8,
        r2: u8,
        r3: u8,
    ) {
        self.check_quarter(cfg, ir, pc_temp, r1.max(r2).max(r3) / 4);
    }

    fn check_quarter(&mut self, cfg: &CpuConfig, ir: &mut impl IrBuilder, pc_temp: Temp, quarter: u8) {
        if !cfg.has(Options::WINDOWED_REGISTER) {
            return;
        }
        if quarter <= self.used_window {
            return;
        }
        ir.call_helper(Helper::WindowCheck, &[pc_temp]);
        self.used_window = self.used_window.max(quarter);
    }
}

/// Equivalent check performed directly against host state, used by the
/// reference [`HelperAbi`] implementation in tests rather than emitted IR.
pub fn check_quarter_against_state(helpers: &mut impl HelperAbi, pc: u32, quarter: u8) {
    helpers.window_check(pc, quarter);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ByteOrder;
    use crate::ir::RecordingBuilder;

    fn cfg_with_windows() -> CpuConfig {
        CpuConfig::new(Options::WINDOWED_REGISTER, ByteOrder::Little, 32, 2, false)
    }

    #[test]
    fn first_reference_emits_check() {
        let cfg = cfg_with_windows();
        let mut ir = RecordingBuilder::new();
        let pc = ir.new_temp32();
        let mut checker = WindowChecker::new();
        checker.check1(&cfg, &mut ir, pc, 5);
        assert_eq!(
            ir.ops
                .iter()
                .filter(|op| matches!(op, crate::ir::IrOp::CallHelper(crate::ir::Helper::WindowCheck, _, _)))
                .count(),
            1
        );
    }

    #[test]
    fn amortizes_subsequent_lower_references() {
        let cfg = cfg_with_windows();
        let mut ir = RecordingBuilder::new();
        let pc = ir.new_temp32();
        let mut checker = WindowChecker::new();
        checker.check1(&cfg, &mut ir, pc, 12); // quarter 3
        checker.check1(&cfg, &mut ir, pc, 4); // quarter 1, already covered
        let calls = ir
            .ops
            .iter()
            .filter(|op| matches!(op, crate::ir::IrOp::CallHelper(crate::ir::Helper::WindowCheck, _, _)))
            .count();
        assert_eq!(calls, 1);
    }

    #[test]
    fn reset_forces_revalidation() {
        let cfg = cfg_with_windows();
        let mut ir = RecordingBuilder::new();
        let pc = ir.new_temp32();
        let mut checker = WindowChecker::new();
        checker.check1(&cfg, &mut ir, pc, 12);
        checker.reset();
        checker.check1(&cfg, &mut ir, pc, 4);
        let calls = ir
            .ops
            .iter()
            .filter(|op| matches!(op, crate::ir::IrOp::CallHelper(crate::ir::Helper::WindowCheck, _, _)))
            .count();
        assert_eq!(calls, 2);
    }

    #[test]
    fn elided_when_option_disabled() {
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut ir = RecordingBuilder::new();
        let pc = ir.new_temp32();
        let mut checker = WindowChecker::new();
        checker.check1(&cfg, &mut ir, pc, 15);
        assert!(ir
            .ops
            .iter()
            .all(|op| !matches!(op, crate::ir::IrOp::CallHelper(crate::ir::Helper::WindowCheck, _, _))));
    }
}
