//! Guest-to-IR translator for a 32-bit Xtensa CPU.
//!
//! Decodes one basic block of Xtensa machine code at a time and lowers it
//! into the host-independent [`ir::IrBuilder`] contract, reproducing the
//! architectural effects a dynamic-binary-translation engine needs to JIT
//! against its own host backend. The IR builder and [`helpers::HelperAbi`]
//! are both external collaborators: this crate only defines the traits and
//! ships reference implementations for its own tests.

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod bits;
pub mod block;
pub mod config;
pub mod context;
pub mod decode;
pub mod diagnostics;
pub mod dump;
pub mod fields;
pub mod helpers;
pub mod ir;
pub mod loop_end;
pub mod registers;
pub mod sr;
pub mod state;
pub mod timer;
pub mod window;

use block::{translate_block, EmittedInsn, GuestCodeReader};
use config::CpuConfig;
use context::TranslationContext;
use ir::IrBuilder;

/// A guest PC paired with the IR-op index it corresponds to, used for
/// precise exception-PC recovery (`restore_state_to_opc`).
#[derive(Debug, Clone, Copy)]
pub struct PcMetadata {
    pub ir_op_index: usize,
    pub pc: u32,
}

/// Translates one basic block starting at `pc`, producing no per-instruction
/// PC metadata beyond what the IR's own `debug_insn_start` markers carry.
pub fn gen_intermediate_code(
    pc: u32,
    config: CpuConfig,
    lend_snapshot: Option<u32>,
    max_insns: u32,
    ir: &mut impl IrBuilder,
    reader: &mut impl GuestCodeReader,
) -> Vec<EmittedInsn> {
    let mut ctx = TranslationContext::new(pc, config, lend_snapshot, max_insns);
    translate_block(&mut ctx, ir, reader)
}

/// Like [`gen_intermediate_code`], but also returns a source-PC table keyed
/// by the IR-op index at which each instruction's lowering began — the data
/// a precise-exception-PC recovery pass needs.
pub fn gen_intermediate_code_pc(
    pc: u32,
    config: CpuConfig,
    lend_snapshot: Option<u32>,
    max_insns: u32,
    ir: &mut impl IrBuilder,
    reader: &mut impl GuestCodeReader,
) -> (Vec<EmittedInsn>, Vec<PcMetadata>) {
    let mut ctx = TranslationContext::new(pc, config, lend_snapshot, max_insns);
    let emitted = translate_block(&mut ctx, ir, reader);
    let metadata = emitted
        .iter()
        .enumerate()
        .map(|(i, insn)| PcMetadata { ir_op_index: i, pc: insn.pc })
        .collect();
    (emitted, metadata)
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
    fn gen_intermediate_code_pc_tracks_one_entry_per_emitted_instruction() {
        let mut mem = FixedMemory(vec![0x10, 0x13, 0x80]); // ADD a1, a2, a3
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut ir = RecordingBuilder::new();
        let (emitted, metadata) = gen_intermediate_code_pc(0, cfg, None, 1, &mut ir, &mut mem);
        assert_eq!(emitted.len(), metadata.len());
        assert_eq!(metadata[0].pc, 0);
    }
}
