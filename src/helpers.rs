//! The helper ABI contract consumed by the instruction emitters.
//!
//! These are host-language routines too complex or mode-dependent to inline
//! as IR; the translator only ever references them by name through
//! [`crate::ir::Helper`] call sites. [`NullHelpers`] documents the expected
//! signatures for this crate's own tests; it performs no real computation.

/// Documents the helper ABI signatures. Not called directly by the
/// translator — IR lowering goes through [`crate::ir::IrBuilder::call_helper`]
/// — but kept as a trait so a host implementation and a test stand-in share
/// one contract.
pub trait HelperAbi {
    fn exception(&mut self, excp: u32);
    fn exception_cause(&mut self, pc: u32, cause: u32);
    fn exception_cause_vaddr(&mut self, pc: u32, cause: u32, vaddr: u32);
    fn check_interrupts(&mut self);
    fn wsr_lend(&mut self, value: u32);
    fn wsr_windowbase(&mut self, value: u32);
    fn window_check(&mut self, pc: u32, quarter: u8);
    fn retw(&mut self, pc: u32) -> u32;
    fn entry(&mut self, pc: u32, s: u8, imm: u32);
    fn rotw(&mut self, delta: i8);
    fn restore_owb(&mut self);
    fn movsp(&mut self, pc: u32);
    fn timer_irq(&mut self, id: u8, active: bool);
    fn waiti(&mut self, pc: u32, intlevel: u8);
    fn simcall(&mut self);
}

/// No-op reference implementation used by this crate's own test suite.
#[derive(Debug, Default)]
pub struct NullHelpers {
    pub calls: Vec<&'static str>,
}

impl HelperAbi for NullHelpers {
    fn exception(&mut self, _excp: u32) {
        self.calls.push("exception");
    }

    fn exception_cause(&mut self, _pc: u32, _cause: u32) {
        self.calls.push("exception_cause");
    }

    fn exception_cause_vaddr(&mut self, _pc: u32, _cause: u32, _vaddr: u32) {
        self.calls.push("exception_cause_vaddr");
    }

    fn check_interrupts(&mut self) {
        self.calls.push("check_interrupts");
    }

    fn wsr_lend(&mut self, _value: u32) {
        self.calls.push("wsr_lend");
    }

    fn wsr_windowbase(&mut self, _value: u32) {
        self.calls.push("wsr_windowbase");
    }

    fn window_check(&mut self, _pc: u32, _quarter: u8) {
        self.calls.push("window_check");
    }

    fn retw(&mut self, pc: u32) -> u32 {
        self.calls.push("retw");
        pc
    }

    fn entry(&mut self, _pc: u32, _s: u8, _imm: u32) {
        self.calls.push("entry");
    }

    fn rotw(&mut self, _delta: i8) {
        self.calls.push("rotw");
    }

    fn restore_owb(&mut self) {
        self.calls.push("restore_owb");
    }

    fn movsp(&mut self, _pc: u32) {
        self.calls.push("movsp");
    }

    fn timer_irq(&mut self, _id: u8, _active: bool) {
        self.calls.push("timer_irq");
    }

    fn waiti(&mut self, _pc: u32, _intlevel: u8) {
        self.calls.push("waiti");
    }

    fn simcall(&mut self) {
        self.calls.push("simcall");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_helpers_record_call_names() {
        let mut h = NullHelpers::default();
        h.entry(0x1000, 2, 0x10);
        h.retw(0x2000);
        assert_eq!(h.calls, vec!["entry", "retw"]);
    }
}
