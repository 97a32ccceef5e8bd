//! Zero-overhead loop-end check (C6.6), emitted after every non-jumping
//! instruction whose fall-through lands on the block's `LEND` snapshot.

use crate::config::Options;
use crate::context::{TranslationContext, Termination};
use crate::ir::{Cond, Global, IrBuilder};
use crate::registers::{ps_fields, SR_LCOUNT, SR_LEND, SR_LBEG};

/// Emits the `PS.EXCM` / `LEND==pc` / `LCOUNT==0` / decrement-and-jump chain
/// if `ctx.pc` equals the loop-end snapshot taken at block entry.
///
/// A no-op if `LOOP` is disabled or the block's `lend_snapshot` doesn't match
/// the current PC; callers call this after every emitted instruction that
/// didn't already terminate the block.
pub fn emit_loop_end_check(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    if !ctx.config.has(Options::LOOP) {
        return;
    }
    let Some(lend) = ctx.lend_snapshot else {
        return;
    };
    if ctx.pc != lend {
        return;
    }
    if ctx.termination != Termination::Continue {
        return;
    }

    let ps = ir.new_temp32();
    ir.read_global(ps, Global::Sr(crate::registers::SR_PS));
    let excm_mask = ir.new_temp32();
    ir.mov_i32(excm_mask, 1 << ps_fields::EXCM_BIT);
    let excm = ir.new_temp32();
    ir.and(excm, ps, excm_mask);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let fallthrough = ir.new_label();
    ir.brcond(Cond::Ne, excm, zero, fallthrough);

    let lend_reg = ir.new_temp32();
    ir.read_global(lend_reg, Global::Sr(SR_LEND));
    let pc_val = ir.new_temp32();
    ir.mov_i32(pc_val, ctx.pc as i32);
    ir.brcond(Cond::Ne, lend_reg, pc_val, fallthrough);

    let lcount = ir.new_temp32();
    ir.read_global(lcount, Global::Sr(SR_LCOUNT));
    ir.brcond(Cond::Eq, lcount, zero, fallthrough);

    let one = ir.new_temp32();
    ir.mov_i32(one, 1);
    let decremented = ir.new_temp32();
    ir.sub(decremented, lcount, one);
    ir.write_global(Global::Sr(SR_LCOUNT), decremented);
    let lbeg = ir.new_temp32();
    ir.read_global(lbeg, Global::Sr(SR_LBEG));
    ir.write_global(Global::Pc, lbeg);
    ir.exit_tb();

    ir.set_label(fallthrough);
    let pc_val2 = ir.new_temp32();
    ir.mov_i32(pc_val2, ctx.pc as i32);
    ir.write_global(Global::Pc, pc_val2);
    ir.exit_tb();

    ctx.termination = Termination::Jumped;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig};
    use crate::ir::{IrOp, RecordingBuilder};

    fn ctx_with_lend(pc: u32, lend: u32) -> TranslationContext {
        TranslationContext::new(
            pc,
            CpuConfig::new(Options::LOOP, ByteOrder::Little, 32, 2, false),
            Some(lend),
            100,
        )
    }

    #[test]
    fn no_effect_when_pc_is_not_at_lend() {
        let mut ctx = ctx_with_lend(0x10, 0x20);
        let mut ir = RecordingBuilder::new();
        emit_loop_end_check(&mut ctx, &mut ir);
        assert!(ir.ops.is_empty());
        assert_eq!(ctx.termination, Termination::Continue);
    }

    #[test]
    fn emits_full_chain_at_lend() {
        let mut ctx = ctx_with_lend(0x20, 0x20);
        let mut ir = RecordingBuilder::new();
        emit_loop_end_check(&mut ctx, &mut ir);
        assert!(ir.ops.iter().any(|op| matches!(op, IrOp::Sub(..))));
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::WriteGlobal(Global::Sr(SR_LCOUNT), _))));
        assert_eq!(ctx.termination, Termination::Jumped);
    }

    #[test]
    fn disabled_without_loop_option() {
        let mut ctx = TranslationContext::new(
            0x20,
            CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false),
            Some(0x20),
            100,
        );
        let mut ir = RecordingBuilder::new();
        emit_loop_end_check(&mut ctx, &mut ir);
        assert!(ir.ops.is_empty());
    }
}
