//! Special-register access (C4): RSR/WSR/XSR with per-SR write handlers.

use crate::context::TranslationContext;
use crate::diagnostics::{DiagnosticKind, GuestException, TranslatorDiagnostic};
use crate::ir::{Global, Helper, IrBuilder, Temp};
use crate::registers::{named_sr, named_ur, NamedSr, NamedUr};

fn check_privilege(ctx: &TranslationContext, ir: &mut impl IrBuilder, pc_temp: Temp) {
    let ring = ir.new_temp32();
    ir.read_global(ring, Global::Sr(crate::registers::SR_PS));
    ir.shr_u_imm(ring, ring, crate::registers::ps_fields::RING_SHIFT);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let ok = ir.new_label();
    ir.brcond(crate::ir::Cond::Eq, ring, zero, ok);
    ir.raise_exception(GuestException::Privileged(ctx.pc));
    ir.set_label(ok);
    let _ = pc_temp;
}

/// `RSR sr, t`: reads a special register into `t`.
pub fn rsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    sr_index: u8,
    dst_global: Global,
) -> Result<(), TranslatorDiagnostic> {
    let Some(_name) = named_sr(sr_index) else {
        return Err(TranslatorDiagnostic::new(
            ctx.pc,
            (0, 0, 0),
            DiagnosticKind::UnimplementedSr(sr_index),
        )
        .emit());
    };
    if sr_index >= 64 {
        let pc_temp = ir.new_temp32();
        ir.mov_i32(pc_temp, ctx.pc as i32);
        check_privilege(ctx, ir, pc_temp);
    }
    let tmp = ir.new_temp32();
    ir.read_global(tmp, Global::Sr(sr_index));
    ir.write_global(dst_global, tmp);
    Ok(())
}

/// `WSR sr, t`: writes a special register from `t`, dispatching to the
/// per-SR side effect described in the component design.
pub fn wsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    sr_index: u8,
    src: Temp,
) -> Result<(), TranslatorDiagnostic> {
    let Some(name) = named_sr(sr_index) else {
        return Err(TranslatorDiagnostic::new(
            ctx.pc,
            (0, 0, 0),
            DiagnosticKind::UnimplementedSr(sr_index),
        )
        .emit());
    };
    if sr_index >= 64 {
        let pc_temp = ir.new_temp32();
        ir.mov_i32(pc_temp, ctx.pc as i32);
        check_privilege(ctx, ir, pc_temp);
    }

    match name {
        NamedSr::Lend => {
            ir.call_helper(Helper::WsrLend, &[src]);
        }
        NamedSr::WindowBase => {
            ir.call_helper(Helper::WsrWindowBase, &[src]);
            ctx.reset_used_window();
        }
        NamedSr::WindowStart => {
            ir.write_global(Global::Sr(sr_index), src);
            ctx.reset_used_window();
        }
        NamedSr::Ps => {
            ir.write_global(Global::Sr(sr_index), src);
            ctx.reset_used_window();
            ir.call_helper(Helper::CheckInterrupts, &[]);
        }
        NamedSr::Prid => {
            // read-only, write is a no-op
        }
        NamedSr::Ccompare0 | NamedSr::Ccompare1 | NamedSr::Ccompare2 => {
            ir.write_global(Global::Sr(sr_index), src);
            let id = ir.new_temp32();
            let which = match name {
                NamedSr::Ccompare0 => 0,
                NamedSr::Ccompare1 => 1,
                _ => 2,
            };
            ir.mov_i32(id, which);
            let zero = ir.new_temp32();
            ir.mov_i32(zero, 0);
            ir.call_helper(Helper::TimerIrq, &[id, zero]);
        }
        _ => {
            ir.write_global(Global::Sr(sr_index), src);
        }
    }
    Ok(())
}

/// `XSR sr, t`: exchange. Reads the old SR value into `t` before applying
/// the same write semantics as [`wsr`].
pub fn xsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    sr_index: u8,
    t_global: Global,
) -> Result<(), TranslatorDiagnostic> {
    let old = ir.new_temp32();
    ir.read_global(old, Global::Sr(sr_index));
    let new = ir.new_temp32();
    ir.read_global(new, t_global);
    wsr(ctx, ir, sr_index, new)?;
    ir.write_global(t_global, old);
    Ok(())
}

/// `RUR ur, t` / `WUR t, ur`: user-register access; no privilege gating.
pub fn rur(
    ctx: &TranslationContext,
    ir: &mut impl IrBuilder,
    ur_index: u8,
    dst_global: Global,
) -> Result<(), TranslatorDiagnostic> {
    if named_ur(ur_index).is_none() {
        return Err(TranslatorDiagnostic::new(
            ctx.pc,
            (0, 0, 0),
            DiagnosticKind::UnimplementedUr(ur_index),
        )
        .emit());
    }
    let tmp = ir.new_temp32();
    ir.read_global(tmp, Global::Ur(ur_index));
    ir.write_global(dst_global, tmp);
    Ok(())
}

pub fn wur(
    ctx: &TranslationContext,
    ir: &mut impl IrBuilder,
    ur_index: u8,
    src: Temp,
) -> Result<(), TranslatorDiagnostic> {
    if named_ur(ur_index).is_none() {
        return Err(TranslatorDiagnostic::new(
            ctx.pc,
            (0, 0, 0),
            DiagnosticKind::UnimplementedUr(ur_index),
        )
        .emit());
    }
    let _ = ctx;
    ir.write_global(Global::Ur(ur_index), src);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig, Options};
    use crate::ir::{IrOp, RecordingBuilder};

    fn ctx() -> TranslationContext {
        TranslationContext::new(
            0x100,
            CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false),
            None,
            100,
        )
    }

    #[test]
    fn rsr_on_unnamed_index_is_a_diagnostic_not_an_ir_effect() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        let before = ir.ops.len();
        let result = rsr(&mut ctx, &mut ir, 17, Global::R(4));
        assert!(result.is_err());
        assert_eq!(ir.ops.len(), before);
    }

    #[test]
    fn wsr_window_base_resets_used_window() {
        let mut ctx = ctx();
        let cfg = ctx.config;
        ctx.window.check1(&cfg, &mut RecordingBuilder::new(), Temp(0), 15);
        let mut ir = RecordingBuilder::new();
        let src = ir.new_temp32();
        wsr(&mut ctx, &mut ir, crate::registers::SR_WINDOW_BASE, src).unwrap();
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::CallHelper(Helper::WsrWindowBase, _, _))));
    }

    #[test]
    fn wsr_lend_calls_helper_instead_of_plain_copy() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        let src = ir.new_temp32();
        wsr(&mut ctx, &mut ir, crate::registers::SR_LEND, src).unwrap();
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::CallHelper(Helper::WsrLend, args, _) if args == &[src])));
    }
}
