//! Control-flow emitters: branches, calls, returns, loops, privileged ops.

use super::{BranchFields, Instruction, LoopKind};
use crate::config::Options;
use crate::context::{TranslationContext, Termination};
use crate::diagnostics::{DiagnosticKind, GuestException};
use crate::fields::{Bri12, Bri8, Call, Callx, RawWord};
use crate::ir::{Cond, Global, Helper, IrBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
    Eqz,
    Nez,
    Ltz,
    Gez,
}

impl BranchCond {
    fn to_ir_cond(self) -> Cond {
        match self {
            BranchCond::Eq | BranchCond::Eqz => Cond::Eq,
            BranchCond::Ne | BranchCond::Nez => Cond::Ne,
            BranchCond::Lt | BranchCond::Ltz => Cond::Lt,
            BranchCond::Ge | BranchCond::Gez => Cond::Ge,
            BranchCond::Ltu => Cond::Ltu,
            BranchCond::Geu => Cond::Geu,
        }
    }
}

pub(super) fn decode_si(word: RawWord) -> Result<Instruction, DiagnosticKind> {
    match word.op1() {
        0x0 => Ok(Instruction::Jx { s: crate::fields::Callx::decode(word).s }),
        0x1 => {
            let bri12 = Bri12::decode(word);
            let cond = match bri12.m {
                0 => BranchCond::Eqz,
                1 => BranchCond::Nez,
                2 => BranchCond::Ltz,
                _ => BranchCond::Gez,
            };
            Ok(Instruction::Branch {
                cond,
                fields: BranchFields::ImmOnly(bri12),
            })
        }
        0x8 => {
            let callx = Callx::decode(word);
            Ok(Instruction::Entry { s: callx.s, imm: u16::from(callx.m) })
        }
        0x9 => {
            let bri8 = Bri8::decode(word);
            let kind = match bri8.m {
                0 => LoopKind::Loop,
                1 => LoopKind::Loopnez,
                2 => LoopKind::Loopgtz,
                _ => return Err(DiagnosticKind::ReservedEncoding),
            };
            Ok(Instruction::Loop { kind, s: bri8.s, imm8: bri8.imm8 as u8 })
        }
        _ => Err(DiagnosticKind::NotYetImplemented("SI subtree BLTUI/BGEUI and reserved forms")),
    }
}

pub(super) fn decode_branch_long(word: RawWord) -> Instruction {
    let bri8 = Bri8::decode(word);
    let cond = match bri8.m {
        0 => BranchCond::Eq,
        1 => BranchCond::Ne,
        2 => BranchCond::Lt,
        3 => BranchCond::Ge,
        _ => BranchCond::Eq,
    };
    Instruction::Branch { cond, fields: BranchFields::TwoReg(bri8) }
}

pub(super) fn emit_branch(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    cond: BranchCond,
    fields: BranchFields,
) {
    let target = match fields {
        BranchFields::TwoReg(bri8) => {
            let a = read_reg(ir, bri8.r);
            let b = read_reg(ir, bri8.s);
            let taken = ir.new_label();
            ir.brcond(cond.to_ir_cond(), a, b, taken);
            emit_fallthrough_and_taken(ctx, ir, taken, ctx.pc.wrapping_add(3).wrapping_add(bri8.imm8 as u32))
        }
        BranchFields::OneRegImm { s, imm } => {
            let a = read_reg(ir, s);
            let taken = ir.new_label();
            ir.brcondi(cond.to_ir_cond(), a, 0, taken);
            emit_fallthrough_and_taken(ctx, ir, taken, ctx.pc.wrapping_add(3).wrapping_add(imm as u32))
        }
        BranchFields::ImmOnly(bri12) => {
            let s_temp = read_reg(ir, bri12.s);
            let zero = ir.new_temp32();
            ir.mov_i32(zero, 0);
            let taken = ir.new_label();
            ir.brcond(cond.to_ir_cond(), s_temp, zero, taken);
            emit_fallthrough_and_taken(
                ctx,
                ir,
                taken,
                ctx.pc.wrapping_add(3).wrapping_add(bri12.imm12 as u32),
            )
        }
    };
    let _ = target;
    ctx.termination = Termination::Jumped;
}

fn emit_fallthrough_and_taken(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    taken: crate::ir::Label,
    taken_pc: u32,
) -> u32 {
    let fallthrough_pc = ctx.pc.wrapping_add(3);
    let pc_temp = ir.new_temp32();
    ir.mov_i32(pc_temp, fallthrough_pc as i32);
    ir.write_global(Global::Pc, pc_temp);
    ir.exit_tb();
    ir.set_label(taken);
    let pc_temp2 = ir.new_temp32();
    ir.mov_i32(pc_temp2, taken_pc as i32);
    ir.write_global(Global::Pc, pc_temp2);
    ir.exit_tb();
    taken_pc
}

pub(super) fn emit_jx(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, s: u8) {
    let target = read_reg(ir, s);
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_call0(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, call: Call) {
    if call.n > 0 {
        let ps = ir.new_temp32();
        ir.read_global(ps, Global::Sr(crate::registers::SR_PS));
        let new_ps = ir.new_temp32();
        ir.deposit(
            new_ps,
            ps,
            crate::registers::ps_fields::CALLINC_SHIFT,
            crate::registers::ps_fields::CALLINC_LEN,
        );
        ir.write_global(Global::Sr(crate::registers::SR_PS), new_ps);
        let ret_pc = ir.new_temp32();
        let encoded = (u32::from(call.n) << 30) | (ctx.pc.wrapping_add(3) & 0x3fff_ffff);
        ir.mov_i32(ret_pc, encoded as i32);
        ir.write_global(Global::R(call.n << 2), ret_pc);
    } else {
        let ret_pc = ir.new_temp32();
        ir.mov_i32(ret_pc, ctx.pc.wrapping_add(3) as i32);
        ir.write_global(Global::R(0), ret_pc);
    }
    let target = ctx
        .pc
        .wrapping_add(3)
        .wrapping_add(call.offset as u32);
    let target_temp = ir.new_temp32();
    ir.mov_i32(target_temp, target as i32);
    ir.write_global(Global::Pc, target_temp);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_callxn(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, n: u8, callx: Callx) {
    if n > 0 {
        let ps = ir.new_temp32();
        ir.read_global(ps, Global::Sr(crate::registers::SR_PS));
        let new_ps = ir.new_temp32();
        ir.deposit(new_ps, ps, crate::registers::ps_fields::CALLINC_SHIFT, crate::registers::ps_fields::CALLINC_LEN);
        ir.write_global(Global::Sr(crate::registers::SR_PS), new_ps);
        let ret_pc = ir.new_temp32();
        let encoded = (u32::from(n) << 30) | (ctx.pc.wrapping_add(3) & 0x3fff_ffff);
        ir.mov_i32(ret_pc, encoded as i32);
        ir.write_global(Global::R(n << 2), ret_pc);
    }
    let target = read_reg(ir, callx.s);
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_ret(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    let target = read_reg(ir, 0);
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_retw(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    let pc_temp = ir.new_temp32();
    ir.mov_i32(pc_temp, ctx.pc as i32);
    let target = ir.call_helper(Helper::Retw, &[pc_temp]).expect("retw returns a PC");
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_entry(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, s: u8, imm: u16) {
    let pc_temp = ir.new_temp32();
    ir.mov_i32(pc_temp, ctx.pc as i32);
    let s_temp = ir.new_temp32();
    ir.mov_i32(s_temp, i32::from(s));
    let imm_temp = ir.new_temp32();
    ir.mov_i32(imm_temp, i32::from(imm));
    ir.call_helper(Helper::Entry, &[pc_temp, s_temp, imm_temp]);
    ctx.reset_used_window();
    ctx.advance_pc(3);
}

fn emit_privileged_return(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, epc_sr: u8) {
    let ps = ir.new_temp32();
    ir.read_global(ps, Global::Sr(crate::registers::SR_PS));
    let cleared = ir.new_temp32();
    ir.deposit(cleared, ps, crate::registers::ps_fields::EXCM_BIT, 1);
    ir.write_global(Global::Sr(crate::registers::SR_PS), cleared);
    let target = ir.new_temp32();
    ir.read_global(target, Global::Sr(epc_sr));
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_rfe(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    emit_privileged_return(ctx, ir, crate::registers::SR_EPC1);
}

pub(super) fn emit_rfde(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    let epc = if ctx.config.ndepc {
        crate::registers::SR_DEPC
    } else {
        crate::registers::SR_EPC1
    };
    emit_privileged_return(ctx, ir, epc);
}

fn emit_rfwx(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    let window_base = ir.new_temp32();
    ir.read_global(window_base, Global::Sr(crate::registers::SR_WINDOW_BASE));
    let one = ir.new_temp32();
    ir.mov_i32(one, 1);
    let mask_bit = ir.new_temp32();
    ir.shl(mask_bit, one, window_base);
    let window_start = ir.new_temp32();
    ir.read_global(window_start, Global::Sr(crate::registers::SR_WINDOW_START));
    let updated = ir.new_temp32();
    ir.xor(updated, window_start, mask_bit);
    ir.write_global(Global::Sr(crate::registers::SR_WINDOW_START), updated);
    ir.call_helper(Helper::RestoreOwb, &[]);
    ctx.reset_used_window();
    emit_privileged_return(ctx, ir, crate::registers::SR_EPC1);
}

pub(super) fn emit_rfwo(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    emit_rfwx(ctx, ir);
}

pub(super) fn emit_rfwu(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    emit_rfwx(ctx, ir);
}

pub(super) fn emit_rfi(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, s: u8) {
    let eps = crate::registers::SR_EPS2 + (s.saturating_sub(2));
    let epc = crate::registers::SR_EPC1 + (s.saturating_sub(1));
    let ps_val = ir.new_temp32();
    ir.read_global(ps_val, Global::Sr(eps));
    ir.write_global(Global::Sr(crate::registers::SR_PS), ps_val);
    let target = ir.new_temp32();
    ir.read_global(target, Global::Sr(epc));
    ir.write_global(Global::Pc, target);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_loop(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    kind: LoopKind,
    s: u8,
    imm8: u8,
) {
    let lend = ctx.pc.wrapping_add(u32::from(imm8)).wrapping_add(4);
    let lbeg = ctx.pc.wrapping_add(3);
    let count_src = read_reg(ir, s);
    let one = ir.new_temp32();
    ir.mov_i32(one, 1);
    let lcount = ir.new_temp32();
    ir.sub(lcount, count_src, one);
    ir.write_global(Global::Sr(crate::registers::SR_LCOUNT), lcount);
    let lbeg_temp = ir.new_temp32();
    ir.mov_i32(lbeg_temp, lbeg as i32);
    ir.write_global(Global::Sr(crate::registers::SR_LBEG), lbeg_temp);
    let lend_temp = ir.new_temp32();
    ir.mov_i32(lend_temp, lend as i32);
    ir.call_helper(Helper::WsrLend, &[lend_temp]);

    if matches!(kind, LoopKind::Loopnez | LoopKind::Loopgtz) {
        let zero = ir.new_temp32();
        ir.mov_i32(zero, 0);
        let enter = ir.new_label();
        let cond = if matches!(kind, LoopKind::Loopnez) {
            Cond::Ne
        } else {
            Cond::Gt
        };
        ir.brcond(cond, count_src, zero, enter);
        let skip_pc = ir.new_temp32();
        ir.mov_i32(skip_pc, lend as i32);
        ir.write_global(Global::Pc, skip_pc);
        ir.exit_tb();
        ir.set_label(enter);
    }

    let body_pc = ir.new_temp32();
    ir.mov_i32(body_pc, lbeg as i32);
    ir.write_global(Global::Pc, body_pc);
    ir.exit_tb();
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_waiti(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, s: u8) {
    let pc_temp = ir.new_temp32();
    ir.mov_i32(pc_temp, ctx.pc as i32);
    let level = ir.new_temp32();
    ir.mov_i32(level, i32::from(s));
    ir.call_helper(Helper::Waiti, &[pc_temp, level]);
    ctx.advance_pc(3);
}

pub(super) fn emit_syscall(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    ir.raise_exception(GuestException::Syscall(ctx.pc));
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_illegal(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    ir.raise_exception(GuestException::IllegalInstruction(ctx.pc));
    ctx.termination = Termination::Jumped;
}

pub(super) fn emit_simcall(ctx: &mut TranslationContext, ir: &mut impl IrBuilder) {
    ir.call_helper(Helper::Simcall, &[]);
    ctx.advance_pc(3);
}

pub(super) fn emit_rsil(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, t: u8, s: u8) {
    let ps = ir.new_temp32();
    ir.read_global(ps, Global::Sr(crate::registers::SR_PS));
    ir.write_global(Global::R(t), ps);
    let new_ps = ir.new_temp32();
    ir.deposit(
        new_ps,
        ps,
        crate::registers::ps_fields::INTLEVEL_SHIFT,
        crate::registers::ps_fields::INTLEVEL_LEN,
    );
    let level = ir.new_temp32();
    ir.mov_i32(level, i32::from(s));
    let final_ps = ir.new_temp32();
    ir.or(final_ps, new_ps, level);
    ir.write_global(Global::Sr(crate::registers::SR_PS), final_ps);
    ir.call_helper(Helper::CheckInterrupts, &[]);
    ctx.advance_pc(3);
}

pub(super) fn emit_rotw(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, imm: i8) {
    let delta = ir.new_temp32();
    ir.mov_i32(delta, i32::from(imm));
    ir.call_helper(Helper::Rotw, &[delta]);
    ctx.reset_used_window();
    ctx.advance_pc(3);
}

fn read_reg(ir: &mut impl IrBuilder, r: u8) -> crate::ir::Temp {
    let t = ir.new_temp32();
    ir.read_global(t, Global::R(r));
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig, Options};
    use crate::ir::{IrOp, RecordingBuilder};

    fn ctx_at(pc: u32) -> TranslationContext {
        TranslationContext::new(
            pc,
            CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false),
            None,
            100,
        )
    }

    #[test]
    fn loop_emits_lcount_lbeg_before_lend_helper() {
        let mut ctx = ctx_at(0x100);
        let mut ir = RecordingBuilder::new();
        emit_loop(&mut ctx, &mut ir, LoopKind::Loop, 3, 8);
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::WriteGlobal(Global::Sr(s), _) if *s == crate::registers::SR_LCOUNT)));
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::CallHelper(Helper::WsrLend, _, _))));
        assert_eq!(ctx.termination, Termination::Jumped);
    }

    #[test]
    fn syscall_raises_cause_and_terminates_block() {
        let mut ctx = ctx_at(0x10);
        let mut ir = RecordingBuilder::new();
        emit_syscall(&mut ctx, &mut ir);
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::RaiseException(GuestException::Syscall(_)))));
        assert_eq!(ctx.termination, Termination::Jumped);
    }

    #[test]
    fn call0_writes_return_address_before_jumping() {
        let mut ctx = ctx_at(0x1000);
        let mut ir = RecordingBuilder::new();
        emit_call0(&mut ctx, &mut ir, Call { n: 0, offset: 0x100 });
        let r0_write = ir
            .ops
            .iter()
            .position(|op| matches!(op, IrOp::WriteGlobal(Global::R(0), _)));
        let pc_write = ir
            .ops
            .iter()
            .position(|op| matches!(op, IrOp::WriteGlobal(Global::Pc, _)));
        assert!(r0_write.unwrap() < pc_write.unwrap());
    }
}
