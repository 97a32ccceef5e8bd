//! RST_F dispatch: `RSR`/`WSR`/`XSR`/`RUR`/`WUR` decoding, delegating the
//! actual register-access semantics to [`crate::sr`].

use crate::context::TranslationContext;
use crate::diagnostics::{DiagnosticKind, TranslatorDiagnostic};
use crate::fields::{RawWord, Rrr, Rsr};
use crate::ir::{Global, IrBuilder};

use super::Instruction;

/// Dispatches the RST_F sub-opcode (`OP2`) into RSR/WSR/RUR/WUR. `XSR` lives
/// in the RST1 (`op1=1`) subtree, not here.
pub(super) fn decode_rst_f(word: RawWord, rrr: Rrr) -> Result<Instruction, DiagnosticKind> {
    match word.op2() {
        0x0 => Ok(Instruction::Rsr(Rsr::decode(word))),
        0x1 => Ok(Instruction::Wsr(Rsr::decode(word))),
        0xE => Ok(Instruction::Rur { ur: (rrr.s << 4) | rrr.t, t: rrr.r }),
        0xF => Ok(Instruction::Wur { t: rrr.t, ur: Rsr::decode(word).sr }),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

pub(super) fn emit_rsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    fields: Rsr,
) -> Result<(), TranslatorDiagnostic> {
    crate::sr::rsr(ctx, ir, fields.sr, Global::R(fields.t))?;
    ctx.advance_pc(3);
    Ok(())
}

pub(super) fn emit_wsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    fields: Rsr,
) -> Result<(), TranslatorDiagnostic> {
    let src = ir.new_temp32();
    ir.read_global(src, Global::R(fields.t));
    crate::sr::wsr(ctx, ir, fields.sr, src)?;
    ctx.advance_pc(3);
    Ok(())
}

pub(super) fn emit_xsr(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    fields: Rsr,
) -> Result<(), TranslatorDiagnostic> {
    crate::sr::xsr(ctx, ir, fields.sr, Global::R(fields.t))?;
    ctx.advance_pc(3);
    Ok(())
}

pub(super) fn emit_rur(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    ur: u8,
    t: u8,
) -> Result<(), TranslatorDiagnostic> {
    crate::sr::rur(ctx, ir, ur, Global::R(t))?;
    ctx.advance_pc(3);
    Ok(())
}

pub(super) fn emit_wur(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    t: u8,
    ur: u8,
) -> Result<(), TranslatorDiagnostic> {
    let src = ir.new_temp32();
    ir.read_global(src, Global::R(t));
    crate::sr::wur(ctx, ir, ur, src)?;
    ctx.advance_pc(3);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig, Options};
    use crate::ir::RecordingBuilder;

    fn ctx() -> TranslationContext {
        TranslationContext::new(
            0x10,
            CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false),
            None,
            100,
        )
    }

    #[test]
    fn decode_rst_f_distinguishes_rsr_and_wsr() {
        let rrr = Rrr { r: 0, s: 3, t: 4 };
        let rsr_word = RawWord(0);
        let wsr_word = RawWord(0x1 << 20);
        assert!(matches!(decode_rst_f(rsr_word, rrr), Ok(Instruction::Rsr(_))));
        assert!(matches!(decode_rst_f(wsr_word, rrr), Ok(Instruction::Wsr(_))));
    }

    #[test]
    fn emit_rsr_advances_pc_by_three() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        emit_rsr(&mut ctx, &mut ir, Rsr { sr: crate::registers::SR_LEND, t: 4 }).unwrap();
        assert_eq!(ctx.pc, 0x13);
    }
}
