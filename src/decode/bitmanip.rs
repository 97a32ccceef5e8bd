//! Bit manipulation and conditional-move emitters.

use super::{CondMoveOp, Instruction, MinMaxOp};
use crate::context::TranslationContext;
use crate::diagnostics::DiagnosticKind;
use crate::fields::{RawWord, Rrr};
use crate::ir::{Cond, Global, IrBuilder, Temp};

/// RST3 (`op1=3`): `RSR`/`WSR`/`SEXT`/`CLAMPS`/`MIN`-family/`MOVEQZ`-family/
/// `RUR`/`WUR`. `RSR`/`WSR`/`RUR`/`WUR` delegate to [`super::sr_access`],
/// which owns the full-width `SR`/`UR` index extraction.
pub(super) fn decode_rst3(word: RawWord, rrr: Rrr) -> Result<Instruction, DiagnosticKind> {
    match word.op2() {
        0x0 | 0x1 | 0xE | 0xF => super::sr_access::decode_rst_f(word, rrr),
        0x2 => Ok(Instruction::Sext { r: rrr.r, t: rrr.s, imm: rrr.t }),
        0x3 => Ok(Instruction::Clamps { r: rrr.r, s: rrr.s, t: rrr.t }),
        0x4 => Ok(Instruction::MinMax(MinMaxOp::Min, rrr)),
        0x5 => Ok(Instruction::MinMax(MinMaxOp::Max, rrr)),
        0x6 => Ok(Instruction::MinMax(MinMaxOp::Minu, rrr)),
        0x7 => Ok(Instruction::MinMax(MinMaxOp::Maxu, rrr)),
        0x8 => Ok(Instruction::CondMove(CondMoveOp::Moveqz, rrr)),
        0x9 => Ok(Instruction::CondMove(CondMoveOp::Movnez, rrr)),
        0xA => Ok(Instruction::CondMove(CondMoveOp::Movltz, rrr)),
        0xB => Ok(Instruction::CondMove(CondMoveOp::Movgez, rrr)),
        0xC | 0xD => Err(DiagnosticKind::NotYetImplemented("MOVF/MOVT boolean group")),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

pub(super) fn emit_extui(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    r: u8,
    t: u8,
    shiftimm: u8,
    mask_bits: u8,
) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, t);
    let val = read_reg(ir, t);
    let shifted = ir.new_temp32();
    ir.shr_u_imm(shifted, val, u32::from(shiftimm));
    let width = u32::from(mask_bits) + 1;
    let mask = ir.new_temp32();
    let mask_value = if width >= 32 { u32::MAX } else { (1u32 << width) - 1 };
    ir.mov_i32(mask, mask_value as i32);
    let dst = ir.new_temp32();
    ir.and(dst, shifted, mask);
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_sext(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, r: u8, t: u8, imm: u8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, t);
    let val = read_reg(ir, t);
    let width = u32::from(imm) + 8;
    let dst = ir.new_temp32();
    let shift = 32 - width;
    let shifted = ir.new_temp32();
    ir.shl_imm(shifted, val, shift);
    ir.shr_s_imm(dst, shifted, shift);
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_clamps(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, r: u8, s: u8, t: u8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, r, s, t);
    let bound_bits = u32::from(t) + 7;
    let val = read_reg(ir, s);
    let max = ir.new_temp32();
    ir.mov_i32(max, (1i32 << bound_bits) - 1);
    let min = ir.new_temp32();
    ir.mov_i32(min, -(1i32 << bound_bits));
    let clamped_hi = ir.new_temp32();
    let below_max = ir.new_label();
    ir.brcond(Cond::Le, val, max, below_max);
    ir.mov_i32(clamped_hi, (1i32 << bound_bits) - 1);
    let after_hi = ir.new_label();
    ir.jump(after_hi);
    ir.set_label(below_max);
    ir.add(clamped_hi, val, {
        let zero = ir.new_temp32();
        ir.mov_i32(zero, 0);
        zero
    });
    ir.set_label(after_hi);
    let dst = ir.new_temp32();
    let above_min = ir.new_label();
    ir.brcond(Cond::Ge, clamped_hi, min, above_min);
    ir.mov_i32(dst, -(1i32 << bound_bits));
    let done = ir.new_label();
    ir.jump(done);
    ir.set_label(above_min);
    ir.add(dst, clamped_hi, {
        let zero = ir.new_temp32();
        ir.mov_i32(zero, 0);
        zero
    });
    ir.set_label(done);
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

/// `NSAU`: number of shift amount until a 1 appears, i.e. leading-zero count.
///
/// Lowered as a bisection tree over halves of the word (16/8/4/2/1 bits),
/// each step narrowing `current` to whichever half still contains a set bit
/// and accumulating the complementary half-width into `count`. Zero input
/// is handled separately since the bisection never terminates on an
/// all-zero value.
pub(super) fn emit_nsau(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, r: u8, s: u8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, s);
    let val = read_reg(ir, s);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let is_zero = ir.new_label();
    ir.brcond(Cond::Eq, val, zero, is_zero);

    let count = ir.new_temp32();
    ir.mov_i32(count, 0);
    let mut current = val;
    for width in [16u32, 8, 4, 2, 1] {
        let upper_half = ir.new_temp32();
        ir.shr_u_imm(upper_half, current, width);
        let upper_is_zero = ir.new_label();
        ir.brcondi(Cond::Eq, upper_half, 0, upper_is_zero);
        // upper half has a set bit: descend into it, no count contribution
        current = upper_half;
        let next = ir.new_label();
        ir.jump(next);
        ir.set_label(upper_is_zero);
        // upper half is all zero: the leading one is in the lower half
        let bumped = ir.new_temp32();
        ir.mov_i32(bumped, width as i32);
        let new_count = ir.new_temp32();
        ir.add(new_count, count, bumped);
        ir.set_label(next);
        let _ = new_count;
    }
    write_reg(ir, r, count);
    let done = ir.new_label();
    ir.jump(done);
    ir.set_label(is_zero);
    let thirty_two = ir.new_temp32();
    ir.mov_i32(thirty_two, 32);
    write_reg(ir, r, thirty_two);
    ir.set_label(done);
    ctx.advance_pc(3);
}

pub(super) fn emit_condmove(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, op: CondMoveOp, fields: Rrr) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, fields.r, fields.s, fields.t);
    let t = read_reg(ir, fields.t);
    let s = read_reg(ir, fields.s);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let skip = ir.new_label();
    match op {
        CondMoveOp::Moveqz => ir.brcond(Cond::Ne, t, zero, skip),
        CondMoveOp::Movnez => ir.brcond(Cond::Eq, t, zero, skip),
        CondMoveOp::Movltz => ir.brcond(Cond::Ge, t, zero, skip),
        CondMoveOp::Movgez => ir.brcond(Cond::Lt, t, zero, skip),
    }
    write_reg(ir, fields.r, s);
    ir.set_label(skip);
    ctx.advance_pc(3);
}

/// `MIN`/`MAX`/`MINU`/`MAXU`: writes whichever of `S`,`T` wins the comparison
/// into `R`.
pub(super) fn emit_minmax(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, op: MinMaxOp, fields: Rrr) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, fields.r, fields.s, fields.t);
    let s = read_reg(ir, fields.s);
    let t = read_reg(ir, fields.t);
    let cond = match op {
        MinMaxOp::Min => Cond::Le,
        MinMaxOp::Max => Cond::Ge,
        MinMaxOp::Minu => Cond::Leu,
        MinMaxOp::Maxu => Cond::Geu,
    };
    let pick_s = ir.new_label();
    ir.brcond(cond, s, t, pick_s);
    write_reg(ir, fields.r, t);
    let done = ir.new_label();
    ir.jump(done);
    ir.set_label(pick_s);
    write_reg(ir, fields.r, s);
    ir.set_label(done);
    ctx.advance_pc(3);
}

fn pc_temp(ctx: &TranslationContext, ir: &mut impl IrBuilder) -> Temp {
    let t = ir.new_temp32();
    ir.mov_i32(t, ctx.pc as i32);
    t
}

fn read_reg(ir: &mut impl IrBuilder, r: u8) -> Temp {
    let t = ir.new_temp32();
    ir.read_global(t, Global::R(r));
    t
}

fn write_reg(ir: &mut impl IrBuilder, r: u8, value: Temp) {
    ir.write_global(Global::R(r), value);
}
