//! Instruction decoding and semantic IR emission (C5).
//!
//! Decoding is a pure function of `(config, three raw bytes, endianness)`:
//! [`decode`] turns a [`RawWord`] into an [`Instruction`] with no side
//! effects. Emission is the separate, effectful half: [`emit`] walks the
//! decoded value and lowers it into an [`IrBuilder`], consulting
//! [`TranslationContext`] for window/loop/privilege state.

mod arith;
mod bitmanip;
mod controlflow;
mod loadstore;
mod narrow;
mod sr_access;

use crate::config::Options;
use crate::context::TranslationContext;
use crate::diagnostics::{DiagnosticKind, TranslatorDiagnostic};
use crate::fields::{Bri12, Bri8, Call, Callx, Ri16, Rri8, Rrr, Rsr, RawWord};
use crate::ir::IrBuilder;

pub use arith::AluOp;
pub use controlflow::BranchCond;

/// A fully decoded Xtensa instruction, independent of any IR builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Alu3(AluOp, Rrr),
    Neg { r: u8, t: u8 },
    Abs { r: u8, t: u8 },
    ShiftImm { op: ShiftImmOp, r: u8, operand: u8, amount: u8 },
    ShiftReg { op: ShiftRegOp, r: u8, s: u8, t: u8 },
    MulDiv(MulDivOp, Rrr),
    Extui { r: u8, t: u8, shiftimm: u8, mask_bits: u8 },
    Sext { r: u8, t: u8, imm: u8 },
    Clamps { r: u8, s: u8, t: u8 },
    Nsau { r: u8, s: u8 },
    CondMove(CondMoveOp, Rrr),
    MinMax(MinMaxOp, Rrr),
    Load { op: loadstore::LoadOp, fields: Rri8 },
    Store { op: loadstore::StoreOp, fields: Rri8 },
    L32r(Ri16),
    S32c1i(Rri8),
    Cache(Rri8),
    Movi { t: u8, imm: i32 },
    Addi(Rri8),
    Addmi(Rri8),
    Branch { cond: BranchCond, fields: BranchFields },
    Jx { s: u8 },
    Call0 { call: Call },
    Callxn { n: u8, callx: Callx },
    Ret,
    Retw,
    Entry { s: u8, imm: u16 },
    Rfe,
    Rfde,
    Rfwo,
    Rfwu,
    Rfi { s: u8 },
    Loop { kind: LoopKind, s: u8, imm8: u8 },
    Waiti { s: u8 },
    Syscall,
    Illegal,
    Simcall,
    Rsil { t: u8, s: u8 },
    Rotw { imm: i8 },
    Rsr(Rsr),
    Wsr(Rsr),
    Xsr(Rsr),
    Rur { ur: u8, t: u8 },
    Wur { t: u8, ur: u8 },
    Narrow(narrow::NarrowInstruction),
    Nop,
    BreakInsn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftImmOp {
    Slli,
    Srai,
    Srli,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftRegOp {
    Src,
    Srl,
    Sll,
    Sra,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MulDivOp {
    Mul16u,
    Mul16s,
    Mull,
    Muluh,
    Mulsh,
    Quou,
    Quos,
    Remu,
    Rems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CondMoveOp {
    Moveqz,
    Movnez,
    Movltz,
    Movgez,
}

/// RST3 `MIN`/`MAX`/`MINU`/`MAXU`: picks the lesser/greater of `S`,`T` into `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinMaxOp {
    Min,
    Max,
    Minu,
    Maxu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopKind {
    Loop,
    Loopnez,
    Loopgtz,
}

/// Operands common to the BRI8/BRI12 branch families, unified for dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchFields {
    TwoReg(Bri8),
    OneRegImm { s: u8, imm: i32 },
    ImmOnly(Bri12),
}

/// Decodes one instruction at the current word. Returns the instruction and
/// its length in bytes, or a diagnostic for reserved/invalid encodings.
///
/// Pure: identical `(config.options(), word)` pairs always produce identical
/// results, satisfying the decoder-purity law.
pub fn decode(
    options: Options,
    word: RawWord,
    pc: u32,
) -> Result<(Instruction, u8), TranslatorDiagnostic> {
    let op0 = word.op0();
    let len = crate::fields::instruction_len(op0);
    let diag = |kind: DiagnosticKind| TranslatorDiagnostic::new(pc, (0, 0, 0), kind).emit();

    let instruction = match op0 {
        0x0 => decode_qrst(word).map_err(diag)?,
        0x1 => Instruction::L32r(Ri16::decode(word)),
        0x2 => decode_lsai(word).map_err(diag)?,
        0x4 => return Err(diag(DiagnosticKind::NotYetImplemented("MAC16"))),
        0x5 => decode_calln(word),
        0x6 => decode_si(word).map_err(diag)?,
        0x7 => decode_branch_long(word),
        0x8..=0xD => narrow::decode(word).map(Instruction::Narrow).map_err(diag)?,
        _ => return Err(diag(DiagnosticKind::InvalidOpcode)),
    };

    if !options.contains(Options::CODE_DENSITY) && len == 2 {
        return Err(diag(DiagnosticKind::DisabledOption));
    }

    Ok((instruction, len))
}

fn decode_qrst(word: RawWord) -> Result<Instruction, DiagnosticKind> {
    let rrr = Rrr::decode(word);
    match word.op1() {
        0x0 => arith::decode_rst0(word, rrr),
        0x1 => arith::decode_rst1(word, rrr),
        0x2 => arith::decode_rst2(word, rrr),
        0x3 => bitmanip::decode_rst3(word, rrr),
        0x4 | 0x5 => Ok(Instruction::Extui {
            r: rrr.r,
            t: rrr.t,
            shiftimm: rrr.s | ((word.op1() & 1) << 4),
            mask_bits: word.op2(),
        }),
        0x6 | 0x7 => Err(DiagnosticKind::ReservedEncoding),
        0x8 => Err(DiagnosticKind::NotYetImplemented("LSCX coprocessor load/store")),
        0x9 => Err(DiagnosticKind::NotYetImplemented("LSC4 (L32E/S32E, windowed register option)")),
        0xA..=0xF => Err(DiagnosticKind::NotYetImplemented("RST coprocessor/FP group")),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

fn decode_lsai(word: RawWord) -> Result<Instruction, DiagnosticKind> {
    loadstore::decode(word)
}

fn decode_calln(word: RawWord) -> Instruction {
    Instruction::Call0 { call: Call::decode(word) }
}

fn decode_si(word: RawWord) -> Result<Instruction, DiagnosticKind> {
    controlflow::decode_si(word)
}

fn decode_branch_long(word: RawWord) -> Instruction {
    controlflow::decode_branch_long(word)
}

/// Lowers a decoded instruction into IR, mutating `ctx` (pc advance,
/// window/loop bookkeeping, termination) as a side effect.
pub fn emit(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    instruction: &Instruction,
) -> Result<(), TranslatorDiagnostic> {
    match instruction {
        Instruction::Alu3(op, fields) => arith::emit_alu3(ctx, ir, *op, *fields),
        Instruction::Neg { r, t } => arith::emit_neg(ctx, ir, *r, *t),
        Instruction::Abs { r, t } => arith::emit_abs(ctx, ir, *r, *t),
        Instruction::ShiftImm { op, r, operand, amount } => {
            arith::emit_shift_imm(ctx, ir, *op, *r, *operand, *amount)
        }
        Instruction::ShiftReg { op, r, s, t } => arith::emit_shift_reg(ctx, ir, *op, *r, *s, *t),
        Instruction::MulDiv(op, fields) => arith::emit_muldiv(ctx, ir, *op, *fields)?,
        Instruction::Extui { r, t, shiftimm, mask_bits } => {
            bitmanip::emit_extui(ctx, ir, *r, *t, *shiftimm, *mask_bits)
        }
        Instruction::Sext { r, t, imm } => bitmanip::emit_sext(ctx, ir, *r, *t, *imm),
        Instruction::Clamps { r, s, t } => bitmanip::emit_clamps(ctx, ir, *r, *s, *t),
        Instruction::Nsau { r, s } => bitmanip::emit_nsau(ctx, ir, *r, *s),
        Instruction::CondMove(op, fields) => bitmanip::emit_condmove(ctx, ir, *op, *fields),
        Instruction::MinMax(op, fields) => bitmanip::emit_minmax(ctx, ir, *op, *fields),
        Instruction::Load { op, fields } => loadstore::emit_load(ctx, ir, *op, *fields),
        Instruction::Store { op, fields } => loadstore::emit_store(ctx, ir, *op, *fields),
        Instruction::L32r(fields) => loadstore::emit_l32r(ctx, ir, *fields),
        Instruction::S32c1i(fields) => loadstore::emit_s32c1i(ctx, ir, *fields),
        Instruction::Cache(_) => {}
        Instruction::Movi { t, imm } => arith::emit_movi(ctx, ir, *t, *imm),
        Instruction::Addi(fields) => arith::emit_addi(ctx, ir, *fields),
        Instruction::Addmi(fields) => arith::emit_addmi(ctx, ir, *fields),
        Instruction::Branch { cond, fields } => controlflow::emit_branch(ctx, ir, *cond, *fields),
        Instruction::Jx { s } => controlflow::emit_jx(ctx, ir, *s),
        Instruction::Call0 { call } => controlflow::emit_call0(ctx, ir, *call),
        Instruction::Callxn { n, callx } => controlflow::emit_callxn(ctx, ir, *n, *callx),
        Instruction::Ret => controlflow::emit_ret(ctx, ir),
        Instruction::Retw => controlflow::emit_retw(ctx, ir),
        Instruction::Entry { s, imm } => controlflow::emit_entry(ctx, ir, *s, *imm),
        Instruction::Rfe => controlflow::emit_rfe(ctx, ir),
        Instruction::Rfde => controlflow::emit_rfde(ctx, ir),
        Instruction::Rfwo => controlflow::emit_rfwo(ctx, ir),
        Instruction::Rfwu => controlflow::emit_rfwu(ctx, ir),
        Instruction::Rfi { s } => controlflow::emit_rfi(ctx, ir, *s),
        Instruction::Loop { kind, s, imm8 } => controlflow::emit_loop(ctx, ir, *kind, *s, *imm8),
        Instruction::Waiti { s } => controlflow::emit_waiti(ctx, ir, *s),
        Instruction::Syscall => controlflow::emit_syscall(ctx, ir),
        Instruction::Illegal => controlflow::emit_illegal(ctx, ir),
        Instruction::Simcall => controlflow::emit_simcall(ctx, ir),
        Instruction::Rsil { t, s } => controlflow::emit_rsil(ctx, ir, *t, *s),
        Instruction::Rotw { imm } => controlflow::emit_rotw(ctx, ir, *imm),
        Instruction::Rsr(fields) => sr_access::emit_rsr(ctx, ir, *fields)?,
        Instruction::Wsr(fields) => sr_access::emit_wsr(ctx, ir, *fields)?,
        Instruction::Xsr(fields) => sr_access::emit_xsr(ctx, ir, *fields)?,
        Instruction::Rur { ur, t } => sr_access::emit_rur(ctx, ir, *ur, *t)?,
        Instruction::Wur { t, ur } => sr_access::emit_wur(ctx, ir, *t, *ur)?,
        Instruction::Narrow(n) => narrow::emit(ctx, ir, n),
        Instruction::Nop | Instruction::BreakInsn => {}
    }
    Ok(())
}
