//! Per-instruction timer bookkeeping (C6.7): `CCOUNT` advance and
//! `CCOMPARE[id]` equality checks, inlined so the block observes scheduled
//! timer interrupts without a helper round-trip per tick.

use crate::config::CpuConfig;
use crate::ir::{Cond, Global, Helper, IrBuilder};
use crate::registers::SR_CCOMPARE0;

/// Emits `CCOUNT += 1`, then for each configured `CCOMPARE[id]` an equality
/// branch to `timer_irq(id, active=1)`.
pub fn emit_timer_tick(cfg: &CpuConfig, ir: &mut impl IrBuilder) {
    let ccount = ir.new_temp32();
    ir.read_global(ccount, Global::Sr(crate::registers::SR_CCOUNT));
    let one = ir.new_temp32();
    ir.mov_i32(one, 1);
    let bumped = ir.new_temp32();
    ir.add(bumped, ccount, one);
    ir.write_global(Global::Sr(crate::registers::SR_CCOUNT), bumped);

    for id in 0..cfg.nccompare {
        let ccompare = ir.new_temp32();
        ir.read_global(ccompare, Global::Sr(SR_CCOMPARE0 + id));
        let skip = ir.new_label();
        ir.brcond(Cond::Ne, bumped, ccompare, skip);
        let id_temp = ir.new_temp32();
        ir.mov_i32(id_temp, i32::from(id));
        let active = ir.new_temp32();
        ir.mov_i32(active, 1);
        ir.call_helper(Helper::TimerIrq, &[id_temp, active]);
        ir.set_label(skip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ByteOrder;
    use crate::ir::{IrOp, RecordingBuilder};

    #[test]
    fn emits_one_compare_branch_per_configured_ccompare() {
        let cfg = CpuConfig::new(crate::config::Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut ir = RecordingBuilder::new();
        emit_timer_tick(&cfg, &mut ir);
        let branches = ir.ops.iter().filter(|op| matches!(op, IrOp::BrCond(..))).count();
        assert_eq!(branches, 2);
    }

    #[test]
    fn always_bumps_ccount() {
        let cfg = CpuConfig::new(crate::config::Options::empty(), ByteOrder::Little, 32, 0, false);
        let mut ir = RecordingBuilder::new();
        emit_timer_tick(&cfg, &mut ir);
        assert!(ir.ops.iter().any(|op| matches!(op, IrOp::Add(..))));
        assert!(ir.ops.iter().all(|op| !matches!(op, IrOp::BrCond(..))));
    }
}
