//! Translator diagnostics (host-visible, non-fatal) and architectural
//! exceptions (guest-visible, carried in emitted IR).

use thiserror::Error;

/// A non-fatal condition observed while decoding one instruction.
///
/// Diagnostics never abort translation: the block driver always advances
/// past the faulting instruction and continues to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("{kind} at pc=0x{pc:08x} (bytes {b0:02x} {b1:02x} {b2:02x})")]
pub struct TranslatorDiagnostic {
    pub pc: u32,
    pub b0: u8,
    pub b1: u8,
    pub b2: u8,
    pub kind: DiagnosticKind,
}

impl TranslatorDiagnostic {
    pub fn new(pc: u32, bytes: (u8, u8, u8), kind: DiagnosticKind) -> Self {
        Self {
            pc,
            b0: bytes.0,
            b1: bytes.1,
            b2: bytes.2,
            kind,
        }
    }

    /// Logs this diagnostic through the `log` facade and returns it for
    /// callers that also want to record it (e.g. in tests).
    pub fn emit(self) -> Self {
        match self.kind {
            DiagnosticKind::NotYetImplemented(_) | DiagnosticKind::ReservedEncoding => {
                log::warn!("{self}");
            }
            _ => log::trace!("{self}"),
        }
        self
    }
}

/// Kind of non-fatal translator diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DiagnosticKind {
    #[error("unimplemented special register {0}")]
    UnimplementedSr(u8),
    #[error("unimplemented user register {0}")]
    UnimplementedUr(u8),
    #[error("not yet implemented: {0}")]
    NotYetImplemented(&'static str),
    #[error("reserved instruction encoding")]
    ReservedEncoding,
    #[error("invalid opcode")]
    InvalidOpcode,
    #[error("instruction requires a disabled option")]
    DisabledOption,
}

/// Architectural exception causes, carried in IR as exits from the
/// generated block. Each is paired with the guest PC captured at emit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum GuestException {
    #[error("illegal instruction at pc=0x{0:08x}")]
    IllegalInstruction(u32),
    #[error("syscall at pc=0x{0:08x}")]
    Syscall(u32),
    #[error("privileged instruction at pc=0x{0:08x}")]
    Privileged(u32),
    #[error("unaligned load/store at pc=0x{pc:08x}, vaddr=0x{vaddr:08x}")]
    LoadStoreAlignment { pc: u32, vaddr: u32 },
    #[error("integer divide by zero at pc=0x{0:08x}")]
    IntegerDivideByZero(u32),
    #[error("register window overflow at pc=0x{pc:08x}, quarter={quarter}")]
    WindowOverflow { pc: u32, quarter: u8 },
    #[error("register window underflow at pc=0x{pc:08x}, quarter={quarter}")]
    WindowUnderflow { pc: u32, quarter: u8 },
    #[error("debug exception at pc=0x{0:08x}")]
    Debug(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display_includes_pc_and_bytes() {
        let d = TranslatorDiagnostic::new(0x1000, (0x10, 0x13, 0x80), DiagnosticKind::InvalidOpcode);
        assert_eq!(
            d.to_string(),
            "invalid opcode at pc=0x00001000 (bytes 10 13 80)"
        );
    }

    #[test]
    fn guest_exception_display_carries_cause_and_pc() {
        assert_eq!(
            GuestException::IntegerDivideByZero(0x40).to_string(),
            "integer divide by zero at pc=0x00000040"
        );
        assert_eq!(
            GuestException::LoadStoreAlignment { pc: 4, vaddr: 5 }.to_string(),
            "unaligned load/store at pc=0x00000004, vaddr=0x00000005"
        );
    }
}
