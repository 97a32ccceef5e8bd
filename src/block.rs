//! Basic-block translation driver (C6): decode-emit loop, loop-end and timer
//! bookkeeping, and the `max_insns` fallback.

use crate::config::CpuConfig;
use crate::context::{TranslationContext, Termination};
use crate::decode::{decode, emit};
use crate::diagnostics::TranslatorDiagnostic;
use crate::fields::RawWord;
use crate::ir::{Global, IrBuilder};
use crate::loop_end::emit_loop_end_check;
use crate::timer::emit_timer_tick;

/// Reads guest code bytes one at a time, mirroring `ldub_code(addr)`.
pub trait GuestCodeReader {
    fn read_byte(&mut self, addr: u32) -> u8;
}

/// One instruction's worth of outcome, surfaced to callers that want
/// per-instruction PC metadata (`gen_intermediate_code_pc`).
#[derive(Debug, Clone, Copy)]
pub struct EmittedInsn {
    pub pc: u32,
    pub len: u8,
}

/// Translates one basic block starting at `ctx.pc`, driving `decode`/`emit`
/// until [`TranslationContext::is_done`], honoring the zero-overhead loop
/// and timer checks after each instruction.
///
/// Returns the PCs of every instruction actually emitted, in order; this is
/// the data `gen_intermediate_code_pc` layers source-PC metadata on top of.
/// Diagnostics encountered along the way are logged (never fatal) and the
/// driver simply continues to the next instruction.
pub fn translate_block(
    ctx: &mut TranslationContext,
    ir: &mut impl IrBuilder,
    reader: &mut impl GuestCodeReader,
) -> Vec<EmittedInsn> {
    let mut emitted = Vec::new();

    while !ctx.is_done() {
        let pc = ctx.pc;
        let b0 = reader.read_byte(pc);
        let b1 = reader.read_byte(pc.wrapping_add(1));
        let word_len_hint_byte2 = if crate::fields::instruction_len(
            RawWord::read::<crate::fields::LittleEndian>(b0, b1, 0).op0(),
        ) == 3
        {
            reader.read_byte(pc.wrapping_add(2))
        } else {
            0
        };

        let word = match ctx.config.byte_order() {
            crate::config::ByteOrder::Little => {
                RawWord::read::<crate::fields::LittleEndian>(b0, b1, word_len_hint_byte2)
            }
            crate::config::ByteOrder::Big => {
                RawWord::read::<crate::fields::BigEndian>(b0, b1, word_len_hint_byte2)
            }
        };

        ir.debug_insn_start(pc);
        emit_timer_tick(&ctx.config, ir);

        match decode(ctx.config.options(), word, pc) {
            Ok((instruction, len)) => {
                if emit(ctx, ir, &instruction).is_ok() {
                    emitted.push(EmittedInsn { pc, len });
                }
            }
            Err(diag) => {
                log_and_skip(&diag);
                ctx.advance_pc(crate::fields::instruction_len(word.op0()));
            }
        }

        if ctx.single_step && ctx.termination == Termination::Continue {
            ir.raise_exception(crate::diagnostics::GuestException::Debug(ctx.pc));
            ctx.termination = Termination::Jumped;
        }

        if ctx.termination == Termination::Continue {
            emit_loop_end_check(ctx, ir);
        }
    }

    if ctx.termination == Termination::Continue {
        let pc_temp = ir.new_temp32();
        ir.mov_i32(pc_temp, ctx.pc as i32);
        ir.write_global(Global::Pc, pc_temp);
        ir.exit_tb();
    }

    emitted
}

fn log_and_skip(diag: &TranslatorDiagnostic) {
    log::warn!("{diag}");
}

/// Resolves how code bytes are read based on static configuration; kept
/// separate from [`translate_block`] so the hot decode loop doesn't have to
/// re-check the byte order per instruction at the `RawWord` call site.
pub fn cpu_config_byte_order(cfg: &CpuConfig) -> crate::config::ByteOrder {
    cfg.byte_order()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, Options};
    use crate::ir::RecordingBuilder;

    struct FixedMemory(Vec<u8>);

    impl GuestCodeReader for FixedMemory {
        fn read_byte(&mut self, addr: u32) -> u8 {
            *self.0.get(addr as usize).unwrap_or(&0)
        }
    }

    #[test]
    fn single_add_terminates_with_max_insns_fallback() {
        // ADD a1, a2, a3: bytes 10 13 80
        let mut mem = FixedMemory(vec![0x10, 0x13, 0x80]);
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut ctx = TranslationContext::new(0, cfg, None, 1);
        let mut ir = RecordingBuilder::new();
        let emitted = translate_block(&mut ctx, &mut ir, &mut mem);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].pc, 0);
        assert_eq!(emitted[0].len, 3);
        assert!(ir.ops.iter().any(|op| matches!(op, crate::ir::IrOp::ExitTb)));
    }

    #[test]
    fn reserved_encoding_is_skipped_without_halting() {
        // OP0=0, OP1=0x6 is a reserved RST6 group.
        let mut mem = FixedMemory(vec![0x00, 0x60, 0x00, 0x10, 0x13, 0x80]);
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut ctx = TranslationContext::new(0, cfg, None, 2);
        let mut ir = RecordingBuilder::new();
        let emitted = translate_block(&mut ctx, &mut ir, &mut mem);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].pc, 3);
    }
}
