//! Arithmetic/logical, shift, and multiply/divide emitters.

use super::{Instruction, MulDivOp, ShiftImmOp, ShiftRegOp};
use crate::context::TranslationContext;
use crate::diagnostics::{DiagnosticKind, GuestException, TranslatorDiagnostic};
use crate::fields::{Rri8, Rrr};
use crate::ir::{Cond, Global, IrBuilder};

/// Straight three-operand arithmetic/logical opcodes sharing the RRR format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AluOp {
    And,
    Or,
    Xor,
    Add,
    Addx2,
    Addx4,
    Addx8,
    Sub,
    Subx2,
    Subx4,
    Subx8,
}

pub(super) fn decode_rst0(
    word: crate::fields::RawWord,
    rrr: Rrr,
) -> Result<Instruction, DiagnosticKind> {
    match word.op2() {
        0x0 => Err(DiagnosticKind::NotYetImplemented(
            "RST0 ST0 subtree (RET/CALLX0/WAITI/RSIL/SYSCALL, reached via their own dispatch paths)",
        )),
        0x1 => Ok(Instruction::Alu3(AluOp::And, rrr)),
        0x2 => Ok(Instruction::Alu3(AluOp::Or, rrr)),
        0x3 => Ok(Instruction::Alu3(AluOp::Xor, rrr)),
        0x4 => decode_st1(rrr),
        0x5 => Err(DiagnosticKind::NotYetImplemented("TLB instructions")),
        0x6 => match rrr.s {
            0x0 => Ok(Instruction::Neg { r: rrr.r, t: rrr.t }),
            0x1 => Ok(Instruction::Abs { r: rrr.r, t: rrr.t }),
            _ => Err(DiagnosticKind::ReservedEncoding),
        },
        0x7 => Err(DiagnosticKind::ReservedEncoding),
        0x8 => Ok(Instruction::Alu3(AluOp::Add, rrr)),
        0x9 => Ok(Instruction::Alu3(AluOp::Addx2, rrr)),
        0xA => Ok(Instruction::Alu3(AluOp::Addx4, rrr)),
        0xB => Ok(Instruction::Alu3(AluOp::Addx8, rrr)),
        0xC => Ok(Instruction::Alu3(AluOp::Sub, rrr)),
        0xD => Ok(Instruction::Alu3(AluOp::Subx2, rrr)),
        0xE => Ok(Instruction::Alu3(AluOp::Subx4, rrr)),
        0xF => Ok(Instruction::Alu3(AluOp::Subx8, rrr)),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

/// RST0 `op2=4` (ST1): dispatches on `RRR_R`. Only `ROTW` and `NSAU` have a
/// corresponding emitter today; the rest (`SSR`/`SSL`/`SSA8L`/`SSA8B`/`SSAI`/
/// `RER`/`WER`) are diagnosed and skipped.
fn decode_st1(rrr: Rrr) -> Result<Instruction, DiagnosticKind> {
    match rrr.r {
        0x8 => Ok(Instruction::Rotw {
            imm: crate::bits::sign_extend(u32::from(rrr.t), 4) as i8,
        }),
        0xF => Ok(Instruction::Nsau { r: rrr.t, s: rrr.s }),
        0x0..=0x4 | 0x6 | 0x7 | 0xE => {
            Err(DiagnosticKind::NotYetImplemented("ST1 SSR/SSL/SSA8L/SSA8B/SSAI/RER/WER/NSAu"))
        }
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

/// RST1 (`op1=1`): shift-immediate, `XSR`, shift-by-`SAR`, and 16-bit multiply.
pub(super) fn decode_rst1(
    word: crate::fields::RawWord,
    rrr: Rrr,
) -> Result<Instruction, DiagnosticKind> {
    match word.op2() {
        0x0 | 0x1 => Ok(Instruction::ShiftImm {
            op: ShiftImmOp::Slli,
            r: rrr.r,
            operand: rrr.s,
            amount: 32 - (rrr.t | ((word.op2() & 1) << 4)),
        }),
        0x2 | 0x3 => Ok(Instruction::ShiftImm {
            op: ShiftImmOp::Srai,
            r: rrr.r,
            operand: rrr.t,
            amount: rrr.s | ((word.op2() & 1) << 4),
        }),
        0x4 => Ok(Instruction::ShiftImm {
            op: ShiftImmOp::Srli,
            r: rrr.r,
            operand: rrr.t,
            amount: rrr.s,
        }),
        0x6 => Ok(Instruction::Xsr(crate::fields::Rsr::decode(word))),
        0x8 => Ok(Instruction::ShiftReg { op: ShiftRegOp::Src, r: rrr.r, s: rrr.s, t: rrr.t }),
        0x9 => Ok(Instruction::ShiftReg { op: ShiftRegOp::Srl, r: rrr.r, s: rrr.s, t: rrr.t }),
        0xA => Ok(Instruction::ShiftReg { op: ShiftRegOp::Sll, r: rrr.r, s: rrr.s, t: rrr.t }),
        0xB => Ok(Instruction::ShiftReg { op: ShiftRegOp::Sra, r: rrr.r, s: rrr.s, t: rrr.t }),
        0xC => Ok(Instruction::MulDiv(MulDivOp::Mul16u, rrr)),
        0xD => Ok(Instruction::MulDiv(MulDivOp::Mul16s, rrr)),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

/// RST2 (`op1=2`): 32-bit multiply/divide. Divide-by-zero guarding for
/// `op2>=12` is emitted by [`emit_muldiv`], not here.
pub(super) fn decode_rst2(
    word: crate::fields::RawWord,
    rrr: Rrr,
) -> Result<Instruction, DiagnosticKind> {
    match word.op2() {
        0x8 => Ok(Instruction::MulDiv(MulDivOp::Mull, rrr)),
        0xA => Ok(Instruction::MulDiv(MulDivOp::Muluh, rrr)),
        0xB => Ok(Instruction::MulDiv(MulDivOp::Mulsh, rrr)),
        0xC => Ok(Instruction::MulDiv(MulDivOp::Quou, rrr)),
        0xD => Ok(Instruction::MulDiv(MulDivOp::Quos, rrr)),
        0xE => Ok(Instruction::MulDiv(MulDivOp::Remu, rrr)),
        0xF => Ok(Instruction::MulDiv(MulDivOp::Rems, rrr)),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

pub(super) fn emit_alu3(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, op: AluOp, fields: Rrr) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, fields.r, fields.s, fields.t);
    let s = read_reg(ir, fields.s);
    let t = read_reg(ir, fields.t);
    let dst = ir.new_temp32();
    match op {
        AluOp::And => ir.and(dst, s, t),
        AluOp::Or => ir.or(dst, s, t),
        AluOp::Xor => ir.xor(dst, s, t),
        AluOp::Add => ir.add(dst, s, t),
        AluOp::Sub => ir.sub(dst, s, t),
        AluOp::Addx2 | AluOp::Addx4 | AluOp::Addx8 => {
            let shift = match op {
                AluOp::Addx2 => 1,
                AluOp::Addx4 => 2,
                _ => 3,
            };
            let shifted = ir.new_temp32();
            ir.shl_imm(shifted, s, shift);
            ir.add(dst, shifted, t);
        }
        AluOp::Subx2 | AluOp::Subx4 | AluOp::Subx8 => {
            let shift = match op {
                AluOp::Subx2 => 1,
                AluOp::Subx4 => 2,
                _ => 3,
            };
            let shifted = ir.new_temp32();
            ir.shl_imm(shifted, s, shift);
            ir.sub(dst, shifted, t);
        }
    }
    write_reg(ir, fields.r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_neg(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, r: u8, t: u8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, t);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let val = read_reg(ir, t);
    let dst = ir.new_temp32();
    ir.sub(dst, zero, val);
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_abs(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, r: u8, t: u8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, t);
    let val = read_reg(ir, t);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let neg = ir.new_temp32();
    ir.sub(neg, zero, val);
    let dst = ir.new_temp32();
    ir.mov_i32(dst, 0);
    let positive = ir.new_label();
    ir.brcond(Cond::Ge, val, zero, positive);
    write_reg(ir, r, neg);
    let done = ir.new_label();
    ir.jump(done);
    ir.set_label(positive);
    write_reg(ir, r, val);
    ir.set_label(done);
    ctx.advance_pc(3);
}

pub(super) fn emit_shift_imm(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    op: ShiftImmOp,
    r: u8,
    operand: u8,
    amount: u8,
) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, r, operand);
    let val = read_reg(ir, operand);
    let dst = ir.new_temp32();
    match op {
        ShiftImmOp::Slli => ir.shl_imm(dst, val, u32::from(amount)),
        ShiftImmOp::Srli => ir.shr_u_imm(dst, val, u32::from(amount)),
        ShiftImmOp::Srai => ir.shr_s_imm(dst, val, u32::from(amount)),
    }
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_shift_reg(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    op: ShiftRegOp,
    r: u8,
    s: u8,
    t: u8,
) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, r, s, t);
    let sar = ir.new_temp32();
    ir.read_global(sar, Global::Sr(crate::registers::SR_SAR));
    let dst = ir.new_temp32();
    match op {
        ShiftRegOp::Src => {
            let hi = read_reg(ir, s);
            let lo = read_reg(ir, t);
            let wide = ir.new_temp64();
            ir.concat_i32_i64(wide, lo, hi);
            let shifted = ir.new_temp64();
            ir.shr_u(shifted, wide, sar);
            ir.trunc_i64_i32(dst, shifted);
        }
        ShiftRegOp::Srl => {
            let val = read_reg(ir, t);
            ir.shr_u(dst, val, sar);
        }
        ShiftRegOp::Sll => {
            let val = read_reg(ir, s);
            let amount = ir.new_temp32();
            let thirty_two = ir.new_temp32();
            ir.mov_i32(thirty_two, 32);
            ir.sub(amount, thirty_two, sar);
            ir.shl(dst, val, amount);
        }
        ShiftRegOp::Sra => {
            let val = read_reg(ir, t);
            ir.shr_s(dst, val, sar);
        }
    }
    write_reg(ir, r, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_muldiv(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    op: MulDivOp,
    fields: Rrr,
) -> Result<(), TranslatorDiagnostic> {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check3(&ctx.config.clone(), ir, pc_temp, fields.r, fields.s, fields.t);
    let s = read_reg(ir, fields.s);
    let t = read_reg(ir, fields.t);
    let dst = ir.new_temp32();
    match op {
        MulDivOp::Mul16u => {
            let su = ir.new_temp32();
            let tu = ir.new_temp32();
            ir.ext16u(su, s);
            ir.ext16u(tu, t);
            ir.mul(dst, su, tu);
        }
        MulDivOp::Mul16s => {
            let ss = ir.new_temp32();
            let ts = ir.new_temp32();
            ir.ext16s(ss, s);
            ir.ext16s(ts, t);
            ir.mul(dst, ss, ts);
        }
        MulDivOp::Mull => ir.mul(dst, s, t),
        MulDivOp::Muluh => {
            let s64 = ir.new_temp64();
            let t64 = ir.new_temp64();
            ir.ext_i32_i64_u(s64, s);
            ir.ext_i32_i64_u(t64, t);
            let prod = ir.new_temp64();
            ir.mul(prod, s64, t64);
            let hi = ir.new_temp64();
            ir.shr_u_imm(hi, prod, 32);
            ir.trunc_i64_i32(dst, hi);
        }
        MulDivOp::Mulsh => {
            let s64 = ir.new_temp64();
            let t64 = ir.new_temp64();
            ir.ext_i32_i64_s(s64, s);
            ir.ext_i32_i64_s(t64, t);
            let prod = ir.new_temp64();
            ir.mul(prod, s64, t64);
            let hi = ir.new_temp64();
            ir.shr_s_imm(hi, prod, 32);
            ir.trunc_i64_i32(dst, hi);
        }
        MulDivOp::Quou => {
            emit_divzero_check(ctx, ir, t);
            ir.div_u(dst, s, t);
        }
        MulDivOp::Quos => {
            emit_divzero_check(ctx, ir, t);
            ir.div_s(dst, s, t);
        }
        MulDivOp::Remu => {
            emit_divzero_check(ctx, ir, t);
            ir.rem_u(dst, s, t);
        }
        MulDivOp::Rems => {
            emit_divzero_check(ctx, ir, t);
            ir.rem_s(dst, s, t);
        }
    }
    write_reg(ir, fields.r, dst);
    ctx.advance_pc(3);
    Ok(())
}

fn emit_divzero_check(ctx: &TranslationContext, ir: &mut impl IrBuilder, divisor: crate::ir::Temp) {
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let ok = ir.new_label();
    ir.brcond(Cond::Ne, divisor, zero, ok);
    ir.raise_exception(GuestException::IntegerDivideByZero(ctx.pc));
    ir.set_label(ok);
}

pub(super) fn emit_movi(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, t: u8, imm: i32) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check1(&ctx.config.clone(), ir, pc_temp, t);
    let dst = ir.new_temp32();
    ir.mov_i32(dst, imm);
    write_reg(ir, t, dst);
    ctx.advance_pc(3);
}

/// `ADDI at, as, imm8`: `RRI8_R` (0xC) only selects the opcode; the source is
/// `as` (`RRI8_S`) and the destination is `at` (`RRI8_T`).
pub(super) fn emit_addi(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, fields: Rri8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, fields.s, fields.t);
    let imm = ir.new_temp32();
    ir.mov_i32(imm, fields.imm8_se());
    let s = read_reg(ir, fields.s);
    let dst = ir.new_temp32();
    ir.add(dst, s, imm);
    write_reg(ir, fields.t, dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_addmi(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, fields: Rri8) {
    let pc_temp = pc_temp(ctx, ir);
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, fields.s, fields.t);
    let imm = ir.new_temp32();
    ir.mov_i32(imm, fields.imm8_se() << 8);
    let s = read_reg(ir, fields.s);
    let dst = ir.new_temp32();
    ir.add(dst, s, imm);
    write_reg(ir, fields.t, dst);
    ctx.advance_pc(3);
}

fn pc_temp(ctx: &TranslationContext, ir: &mut impl IrBuilder) -> crate::ir::Temp {
    let t = ir.new_temp32();
    ir.mov_i32(t, ctx.pc as i32);
    t
}

fn read_reg(ir: &mut impl IrBuilder, r: u8) -> crate::ir::Temp {
    let t = ir.new_temp32();
    ir.read_global(t, Global::R(r));
    t
}

fn write_reg(ir: &mut impl IrBuilder, r: u8, value: crate::ir::Temp) {
    ir.write_global(Global::R(r), value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig, Options};
    use crate::ir::{IrOp, RecordingBuilder};

    fn ctx() -> TranslationContext {
        TranslationContext::new(
            0x1000,
            CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false),
            None,
            100,
        )
    }

    #[test]
    fn add_instruction_emits_add_and_advances_pc() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        emit_alu3(&mut ctx, &mut ir, AluOp::Add, Rrr { r: 1, s: 2, t: 3 });
        assert!(ir.ops.iter().any(|op| matches!(op, IrOp::Add(_, _, _))));
        assert_eq!(ctx.pc, 0x1003);
    }

    #[test]
    fn quos_emits_divide_by_zero_guard_before_divide() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        emit_muldiv(&mut ctx, &mut ir, MulDivOp::Quos, Rrr { r: 1, s: 2, t: 3 }).unwrap();
        let guard_idx = ir.ops.iter().position(|op| matches!(op, IrOp::RaiseException(GuestException::IntegerDivideByZero(_))));
        let div_idx = ir.ops.iter().position(|op| matches!(op, IrOp::DivS(_, _, _)));
        assert!(guard_idx.is_some() && div_idx.is_some());
        assert!(guard_idx.unwrap() < div_idx.unwrap());
    }

    #[test]
    fn movi_writes_sign_extended_immediate() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        emit_movi(&mut ctx, &mut ir, 5, -1);
        assert!(ir.ops.iter().any(|op| matches!(op, IrOp::MovI32(_, -1))));
    }
}
