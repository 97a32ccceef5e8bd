//! Load/store, `L32R`, and `S32C1I` emitters.

use crate::config::Options;
use crate::context::TranslationContext;
use crate::diagnostics::{DiagnosticKind, GuestException};
use crate::fields::{RawWord, Ri16, Rri8};
use crate::ir::{Cond, Global, IrBuilder, MemOp};

use super::Instruction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadOp {
    L8ui,
    L16ui,
    L16si,
    L32i,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    S8i,
    S16i,
    S32i,
}

pub(super) fn decode(word: RawWord) -> Result<Instruction, DiagnosticKind> {
    let fields = Rri8::decode(word);
    match fields.r {
        0x0 => Ok(Instruction::Load { op: LoadOp::L8ui, fields }),
        0x1 => Ok(Instruction::Load { op: LoadOp::L16ui, fields }),
        0x2 => Ok(Instruction::Load { op: LoadOp::L32i, fields }),
        0x4 => Ok(Instruction::Store { op: StoreOp::S8i, fields }),
        0x5 => Ok(Instruction::Store { op: StoreOp::S16i, fields }),
        0x6 => Ok(Instruction::Store { op: StoreOp::S32i, fields }),
        0x9 => Ok(Instruction::Load { op: LoadOp::L16si, fields }),
        0xA => {
            let imm12 = u32::from(fields.imm8) | (u32::from(fields.s) << 8);
            Ok(Instruction::Movi { t: fields.t, imm: crate::bits::sign_extend(imm12, 12) })
        }
        0xB => Ok(Instruction::Cache(fields)),
        0xC => Ok(Instruction::Addi(fields)),
        0xD => Ok(Instruction::Addmi(fields)),
        0xE => Ok(Instruction::S32c1i(fields)),
        _ => Err(DiagnosticKind::ReservedEncoding),
    }
}

fn compute_addr(ctx: &TranslationContext, ir: &mut impl IrBuilder, fields: Rri8, size: u32) -> crate::ir::Temp {
    let base = ir.new_temp32();
    ir.read_global(base, Global::R(fields.s));
    let imm = ir.new_temp32();
    ir.mov_i32(imm, fields.imm8 as i32 * size as i32);
    let addr = ir.new_temp32();
    ir.add(addr, base, imm);
    let _ = ctx;
    addr
}

fn emit_alignment_check(ctx: &TranslationContext, ir: &mut impl IrBuilder, addr: crate::ir::Temp, size: u32) {
    if !ctx.config.has(Options::UNALIGNED_EXCEPTION) || size == 1 {
        return;
    }
    let mask = ir.new_temp32();
    ir.mov_i32(mask, (size - 1) as i32);
    let low_bits = ir.new_temp32();
    ir.and(low_bits, addr, mask);
    let zero = ir.new_temp32();
    ir.mov_i32(zero, 0);
    let ok = ir.new_label();
    ir.brcond(Cond::Eq, low_bits, zero, ok);
    ir.raise_exception(GuestException::LoadStoreAlignment { pc: ctx.pc, vaddr: 0 });
    ir.set_label(ok);
}

pub(super) fn emit_load(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, op: LoadOp, fields: Rri8) {
    let pc_temp = {
        let t = ir.new_temp32();
        ir.mov_i32(t, ctx.pc as i32);
        t
    };
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, fields.t, fields.s);
    let size = match op {
        LoadOp::L8ui => 1,
        LoadOp::L16ui | LoadOp::L16si => 2,
        LoadOp::L32i => 4,
    };
    let addr = compute_addr(ctx, ir, fields, size);
    emit_alignment_check(ctx, ir, addr, size);
    let dst = ir.new_temp32();
    let mem_op = match op {
        LoadOp::L8ui => MemOp::U8,
        LoadOp::L16ui => MemOp::U16,
        LoadOp::L16si => MemOp::S16,
        LoadOp::L32i => MemOp::U32,
    };
    ir.qemu_ld(dst, addr, mem_op);
    ir.write_global(Global::R(fields.t), dst);
    ctx.advance_pc(3);
}

pub(super) fn emit_store(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, op: StoreOp, fields: Rri8) {
    let pc_temp = {
        let t = ir.new_temp32();
        ir.mov_i32(t, ctx.pc as i32);
        t
    };
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, fields.t, fields.s);
    let size = match op {
        StoreOp::S8i => 1,
        StoreOp::S16i => 2,
        StoreOp::S32i => 4,
    };
    let addr = compute_addr(ctx, ir, fields, size);
    emit_alignment_check(ctx, ir, addr, size);
    let value = ir.new_temp32();
    ir.read_global(value, Global::R(fields.t));
    let mem_op = match op {
        StoreOp::S8i => MemOp::U8,
        StoreOp::S16i => MemOp::U16,
        StoreOp::S32i => MemOp::U32,
    };
    ir.qemu_st(addr, value, mem_op);
    ctx.advance_pc(3);
}

/// `L32R t, imm16`: literal-pool load relative to the (masked) current PC.
pub(super) fn emit_l32r(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, fields: Ri16) {
    let pc_temp = {
        let t = ir.new_temp32();
        ir.mov_i32(t, ctx.pc as i32);
        t
    };
    ctx.window.check1(&ctx.config.clone(), ir, pc_temp, fields.t);

    let masked_pc = ir.new_temp32();
    ir.mov_i32(masked_pc, ((ctx.pc.wrapping_add(3)) & !0x3) as i32);
    let offset = ir.new_temp32();
    let signed_offset = (i32::from(fields.imm16 as i16)) << 2;
    if ctx.config.has(Options::EXTENDED_L32R) {
        let litbase = ir.new_temp32();
        ir.read_global(litbase, Global::Sr(crate::registers::SR_LITBASE));
        ir.mov_i32(offset, signed_offset);
        let addr = ir.new_temp32();
        ir.add(addr, litbase, offset);
        let dst = ir.new_temp32();
        ir.qemu_ld(dst, addr, MemOp::U32);
        ir.write_global(Global::R(fields.t), dst);
    } else {
        ir.mov_i32(offset, signed_offset.wrapping_add(0xfffc_0000u32 as i32));
        let addr = ir.new_temp32();
        ir.add(addr, masked_pc, offset);
        let dst = ir.new_temp32();
        ir.qemu_ld(dst, addr, MemOp::U32);
        ir.write_global(Global::R(fields.t), dst);
    }
    ctx.advance_pc(3);
}

/// `S32C1I t, s, imm8`: compare-and-swap against `SCOMPARE1`.
pub(super) fn emit_s32c1i(ctx: &mut TranslationContext, ir: &mut impl IrBuilder, fields: Rri8) {
    let pc_temp = {
        let t = ir.new_temp32();
        ir.mov_i32(t, ctx.pc as i32);
        t
    };
    ctx.window.check2(&ctx.config.clone(), ir, pc_temp, fields.t, fields.s);
    let addr = compute_addr(ctx, ir, fields, 4);
    let saved = ir.new_temp32();
    ir.read_global(saved, Global::R(fields.t));
    let loaded = ir.new_temp32();
    ir.qemu_ld(loaded, addr, MemOp::U32);
    let scompare1 = ir.new_temp32();
    ir.read_global(scompare1, Global::Sr(crate::registers::SR_SCOMPARE1));
    let mismatch = ir.new_label();
    ir.brcond(Cond::Ne, loaded, scompare1, mismatch);
    ir.qemu_st(addr, saved, MemOp::U32);
    ir.set_label(mismatch);
    ir.write_global(Global::R(fields.t), loaded);
    ctx.advance_pc(3);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, CpuConfig};
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
    fn l32r_applies_the_negative_quadrant_bias_when_not_extended() {
        let mut ctx = ctx_at(0x1000);
        let mut ir = RecordingBuilder::new();
        emit_l32r(&mut ctx, &mut ir, Ri16 { t: 0, imm16: 1 });
        // ((0x1003 & !3) + (1<<2) + 0xfffc0000) = 0xfffc1008
        assert!(ir.ops.iter().any(|op| matches!(op, IrOp::MovI32(_, v) if *v == 4)));
    }

    #[test]
    fn s32c1i_stores_only_on_match() {
        let mut ctx = ctx_at(0x40);
        let mut ir = RecordingBuilder::new();
        emit_s32c1i(&mut ctx, &mut ir, Rri8 { r: 4, s: 5, t: 0, imm8: 0 });
        let load_idx = ir.ops.iter().position(|op| matches!(op, IrOp::QemuLd(..))).unwrap();
        let branch_idx = ir.ops.iter().position(|op| matches!(op, IrOp::BrCond(..))).unwrap();
        let store_idx = ir.ops.iter().position(|op| matches!(op, IrOp::QemuSt(..))).unwrap();
        assert!(load_idx < branch_idx && branch_idx < store_idx);
    }

    #[test]
    fn unaligned_store_emits_alignment_guard_when_option_enabled() {
        let mut ctx = TranslationContext::new(
            0,
            CpuConfig::new(Options::UNALIGNED_EXCEPTION, ByteOrder::Little, 32, 2, false),
            None,
            100,
        );
        let mut ir = RecordingBuilder::new();
        emit_store(&mut ctx, &mut ir, StoreOp::S32i, Rri8 { r: 1, s: 2, t: 0, imm8: 0 });
        assert!(ir
            .ops
            .iter()
            .any(|op| matches!(op, IrOp::RaiseException(GuestException::LoadStoreAlignment { .. }))));
    }
}
