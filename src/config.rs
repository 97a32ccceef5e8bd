//! Static CPU configuration (C2 gating data).

use bitflags::bitflags;

use crate::fields::{BigEndian, Endianness, LittleEndian};

bitflags! {
    /// Optional ISA extensions a given core instance may or may not implement.
    ///
    /// An instruction that requires an option not present here reports a
    /// [`crate::diagnostics::DiagnosticKind::DisabledOption`] and emits no IR
    /// effects beyond the PC advance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Options: u32 {
        const WINDOWED_REGISTER      = 1 << 0;
        const LOOP                   = 1 << 1;
        const EXCEPTION              = 1 << 2;
        const INTERRUPT              = 1 << 3;
        const HIGH_PRIORITY_INTERRUPT = 1 << 4;
        const MMU                    = 1 << 5;
        const MP_SYNCHRO             = 1 << 6;
        const EXTENDED_L32R          = 1 << 7;
        const CODE_DENSITY           = 1 << 8;
        const BOOLEAN                = 1 << 9;
        const FP_COPROCESSOR         = 1 << 10;
        const COPROCESSOR            = 1 << 11;
        const MAC16                  = 1 << 12;
        const IMUL16                 = 1 << 13;
        const IMUL32                 = 1 << 14;
        const IDIV32                 = 1 << 15;
        const MISC_OP                = 1 << 16;
        const UNALIGNED_EXCEPTION    = 1 << 17;
        const DCACHE                 = 1 << 18;
        const ICACHE                 = 1 << 19;
        const DCACHE_INDEX_LOCK      = 1 << 20;
        const ICACHE_INDEX_LOCK      = 1 << 21;
    }
}

/// Byte order used when assembling an instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

/// Immutable per-CPU-instance configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuConfig {
    options: Options,
    byte_order: ByteOrder,
    /// Number of physical address registers backing the windowed file.
    pub nareg: u8,
    /// Number of implemented `CCOMPARE` timer-compare registers (0..=3).
    pub nccompare: u8,
    /// Selects `DEPC` (true) vs. `EPC1` (false) as the `RFDE` return address.
    pub ndepc: bool,
}

impl CpuConfig {
    /// Builds a configuration; `nccompare` is clamped to the architectural max of 3.
    pub fn new(options: Options, byte_order: ByteOrder, nareg: u8, nccompare: u8, ndepc: bool) -> Self {
        Self {
            options,
            byte_order,
            nareg,
            nccompare: nccompare.min(3),
            ndepc,
        }
    }

    /// Whether `option` is enabled on this core.
    pub const fn has(&self, option: Options) -> bool {
        self.options.contains(option)
    }

    pub const fn options(&self) -> Options {
        self.options
    }

    pub const fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Assembles a raw instruction word according to the configured byte order.
    pub fn assemble_word(&self, b0: u8, b1: u8, b2: u8) -> u32 {
        match self.byte_order {
            ByteOrder::Little => LittleEndian::assemble(b0, b1, b2),
            ByteOrder::Big => BigEndian::assemble(b0, b1, b2),
        }
    }
}
