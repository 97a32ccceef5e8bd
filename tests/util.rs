use xtensa_xlate::block::{translate_block, GuestCodeReader};
use xtensa_xlate::config::{ByteOrder, CpuConfig, Options};
use xtensa_xlate::context::TranslationContext;
use xtensa_xlate::ir::{IrOp, RecordingBuilder};

/// Fixed guest memory backing a [`GuestCodeReader`]; reads past the end
/// return zero, matching a block that trails off into padding.
pub struct FixedMemory(pub Vec<u8>);

impl GuestCodeReader for FixedMemory {
    fn read_byte(&mut self, addr: u32) -> u8 {
        *self.0.get(addr as usize).unwrap_or(&0)
    }
}

/// Translates one block of `bytes` starting at `pc` under `options`, with a
/// generous instruction cap, and returns the recorded IR ops.
pub fn translate(pc: u32, options: Options, bytes: Vec<u8>) -> Vec<IrOp> {
    translate_with_config(CpuConfig::new(options, ByteOrder::Little, 32, 2, false), pc, None, bytes)
}

pub fn translate_with_config(
    config: CpuConfig,
    pc: u32,
    lend_snapshot: Option<u32>,
    bytes: Vec<u8>,
) -> Vec<IrOp> {
    let mut ctx = TranslationContext::new(pc, config, lend_snapshot, 64);
    let mut ir = RecordingBuilder::new();
    let mut mem = FixedMemory(bytes);
    translate_block(&mut ctx, &mut ir, &mut mem);
    ir.ops
}
