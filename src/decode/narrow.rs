//! Narrow (16-bit, `CODE_DENSITY`) instruction forms.

use crate::context::{TranslationContext, Termination};
use crate::diagnostics::{DiagnosticKind, GuestException};
use crate::fields::RawWord;
use crate::ir::{Global, IrBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NarrowInstruction {
    L32iN { t: u8, s: u8, imm4: u8 },
    S32iN { t: u8, s: u8, imm4: u8 },
    AddN { r: u8, s: u8, t: u8 },
    AddiN { r: u8, s: u8, imm: i8 },
    MoviN { t: u8, imm: i8 },
    Beqz { s: u8, offset: u8 },
    Bnez { s: u8, offset: u8 },
    MovN { t: u8, s: u8 },
    RetN,
    RetwN,
    NopN,
    IllN,
    BreakN,
}

pub(super) fn decode(word: RawWord) -> Result<NarrowInstruction, DiagnosticKind> {
    let op0 = word.op0();
    let r = ((word.0 >> 12) & 0xF) as u8;
    let t = ((word.0 >> 4) & 0xF) as u8;
    let s = ((word.0 >> 8) & 0xF) as u8;
    let imm4 = r;

    match op0 {
        0x8 => Ok(NarrowInstruction::L32iN { t, s, imm4 }),
        0x9 => Ok(NarrowInstruction::S32iN { t, s, imm4 }),
        0xA => Ok(NarrowInstruction::AddN { r, s, t }),
        0xB => {
            let raw_imm = r;
            let imm = if raw_imm == 0 { -1i8 } else { raw_imm as i8 };
            Ok(NarrowInstruction::AddiN { r: t, s, imm })
        }
        0xC => {
            let raw_imm7 = ((word.0 >> 8) & 0x7F) as u8;
            let sign_bit = (word.0 >> 8) & 0x40 != 0;
            let imm = if sign_bit {
                (raw_imm7 as i8) | !0x7Fi8
            } else {
                raw_imm7 as i8
            };
            match r {
                0x0..=0xB | 0xD..=0xF => Ok(NarrowInstruction::MoviN { t, imm }),
                0xC => {
                    let offset = ((word.0 >> 8) & 0x3F) as u8;
                    if t & 0x8 != 0 {
                        Ok(NarrowInstruction::Bnez { s, offset })
                    } else {
                        Ok(NarrowInstruction::Beqz { s, offset })
                    }
                }
                _ => Err(DiagnosticKind::ReservedEncoding),
            }
        }
        0xD => match t {
            0xD => Ok(NarrowInstruction::MovN { t: r, s }),
            0x1 => Ok(NarrowInstruction::RetN),
            0x2 => Ok(NarrowInstruction::RetwN),
            0x0 if r == 0 && s == 0 => Ok(NarrowInstruction::BreakN),
            0x0 if r == 0 && s == 0xF => Ok(NarrowInstruction::NopN),
            0x0 if r == 0 && s == 0x6 => Ok(NarrowInstruction::IllN),
            _ => Err(DiagnosticKind::ReservedEncoding),
        },
        _ => Err(DiagnosticKind::InvalidOpcode),
    }
}

pub(super) fn emit(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, instr: &NarrowInstruction) {
    match instr {
        NarrowInstruction::L32iN { t, s, imm4 } => {
            let base = read_reg(ir, *s);
            let imm = ir.new_temp32();
            ir.mov_i32(imm, i32::from(*imm4) * 4);
            let addr = ir.new_temp32();
            ir.add(addr, base, imm);
            let dst = ir.new_temp32();
            ir.qemu_ld(dst, addr, crate::ir::MemOp::U32);
            ir.write_global(Global::R(*t), dst);
            ctx.advance_pc(2);
        }
        NarrowInstruction::S32iN { t, s, imm4 } => {
            let base = read_reg(ir, *s);
            let imm = ir.new_temp32();
            ir.mov_i32(imm, i32::from(*imm4) * 4);
            let addr = ir.new_temp32();
            ir.add(addr, base, imm);
            let value = read_reg(ir, *t);
            ir.qemu_st(addr, value, crate::ir::MemOp::U32);
            ctx.advance_pc(2);
        }
        NarrowInstruction::AddN { r, s, t } => {
            let s_val = read_reg(ir, *s);
            let t_val = read_reg(ir, *t);
            let dst = ir.new_temp32();
            ir.add(dst, s_val, t_val);
            ir.write_global(Global::R(*r), dst);
            ctx.advance_pc(2);
        }
        NarrowInstruction::AddiN { r, s, imm } => {
            let s_val = read_reg(ir, *s);
            let imm_temp = ir.new_temp32();
            ir.mov_i32(imm_temp, i32::from(*imm));
            let dst = ir.new_temp32();
            ir.add(dst, s_val, imm_temp);
            ir.write_global(Global::R(*r), dst);
            ctx.advance_pc(2);
        }
        NarrowInstruction::MoviN { t, imm } => {
            let dst = ir.new_temp32();
            ir.mov_i32(dst, i32::from(*imm));
            ir.write_global(Global::R(*t), dst);
            ctx.advance_pc(2);
        }
        NarrowInstruction::Beqz { s, offset } | NarrowInstruction::Bnez { s, offset } => {
            let val = read_reg(ir, *s);
            let zero = ir.new_temp32();
            ir.mov_i32(zero, 0);
            let taken = ir.new_label();
            let cond = if matches!(instr, NarrowInstruction::Beqz { .. }) {
                crate::ir::Cond::Eq
            } else {
                crate::ir::Cond::Ne
            };
            ir.brcond(cond, val, zero, taken);
            let fallthrough_pc = ctx.pc.wrapping_add(2);
            let pc_temp = ir.new_temp32();
            ir.mov_i32(pc_temp, fallthrough_pc as i32);
            ir.write_global(Global::Pc, pc_temp);
            ir.exit_tb();
            ir.set_label(taken);
            let target_pc = ctx.pc.wrapping_add(4).wrapping_add(u32::from(*offset));
            let pc_temp2 = ir.new_temp32();
            ir.mov_i32(pc_temp2, target_pc as i32);
            ir.write_global(Global::Pc, pc_temp2);
            ir.exit_tb();
            ctx.termination = Termination::Jumped;
        }
        NarrowInstruction::MovN { t, s } => {
            let val = read_reg(ir, *s);
            ir.write_global(Global::R(*t), val);
            ctx.advance_pc(2);
        }
        NarrowInstruction::RetN => {
            let target = read_reg(ir, 0);
            ir.write_global(Global::Pc, target);
            ir.exit_tb();
            ctx.termination = Termination::Jumped;
        }
        NarrowInstruction::RetwN => {
            let pc_temp = ir.new_temp32();
            ir.mov_i32(pc_temp, ctx.pc as i32);
            let target = ir
                .call_helper(crate::ir::Helper::Retw, &[pc_temp])
                .expect("retw returns a pc");
            ir.write_global(Global::Pc, target);
            ir.exit_tb();
            ctx.termination = Termination::Jumped;
        }
        NarrowInstruction::NopN => {
            ctx.advance_pc(2);
        }
        NarrowInstruction::IllN => {
            ir.raise_exception(GuestException::IllegalInstruction(ctx.pc));
            ctx.termination = Termination::Jumped;
        }
        NarrowInstruction::BreakN => {
            ir.raise_exception(GuestException::Debug(ctx.pc));
            ctx.termination = Termination::Jumped;
        }
    }
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
    use crate::ir::RecordingBuilder;

    fn ctx() -> TranslationContext {
        TranslationContext::new(
            0x200,
            CpuConfig::new(Options::CODE_DENSITY, ByteOrder::Little, 32, 2, false),
            None,
            100,
        )
    }

    #[test]
    fn narrow_forms_advance_pc_by_two() {
        let mut ctx = ctx();
        let mut ir = RecordingBuilder::new();
        emit(&mut ctx, &mut ir, &NarrowInstruction::NopN);
        assert_eq!(ctx.pc, 0x202);
    }

    #[test]
    fn addi_n_treats_imm_zero_as_minus_one() {
        let result = decode(RawWord(0xB_0_0_0));
        if let Ok(NarrowInstruction::AddiN { imm, .. }) = result {
            assert_eq!(imm, -1);
        }
    }
}
