//! The IR builder contract consumed by the instruction emitters (C5).
//!
//! The real compiler living on the other side of this trait — the thing
//! that turns [`IrOp`] sequences into host machine code — is out of scope
//! here, exactly as the external IR builder is out of scope for the system
//! this crate implements. [`RecordingBuilder`] is a reference
//! implementation good enough to make the emitters independently testable.

use crate::diagnostics::GuestException;

/// Opaque handle to a 32- or 64-bit temporary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Temp(pub u32);

/// Opaque handle to a branch target within the current block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub u32);

/// Comparison used by conditional branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Ltu,
    Leu,
    Gtu,
    Geu,
}

/// A CPU-state global a temporary can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Global {
    Pc,
    R(u8),
    Sr(u8),
    Ur(u8),
}

/// Guest memory access width for `qemu_ld`/`qemu_st`-style operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemOp {
    U8,
    U16,
    S16,
    U32,
}

/// Typed helper-call identifier; argument values are passed as a slice of
/// temporaries by the caller, in ABI order described in [`crate::helpers::HelperAbi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Helper {
    Exception,
    ExceptionCause,
    ExceptionCauseVaddr,
    CheckInterrupts,
    WsrLend,
    WsrWindowBase,
    WindowCheck,
    Retw,
    Entry,
    Rotw,
    RestoreOwb,
    Movsp,
    TimerIrq,
    Waiti,
    Simcall,
}

/// The contract an IR builder must satisfy for this translator to emit into.
///
/// Implementors are free to batch, fuse, or directly JIT these calls; the
/// emitters in `decode/` only ever see this trait.
pub trait IrBuilder {
    fn new_temp32(&mut self) -> Temp;
    fn new_temp64(&mut self) -> Temp;

    fn mov_i32(&mut self, dst: Temp, imm: i32);
    fn mov_i64(&mut self, dst: Temp, imm: i64);

    fn read_global(&mut self, dst: Temp, global: Global);
    fn write_global(&mut self, global: Global, src: Temp);

    fn add(&mut self, dst: Temp, a: Temp, b: Temp);
    fn sub(&mut self, dst: Temp, a: Temp, b: Temp);
    fn mul(&mut self, dst: Temp, a: Temp, b: Temp);
    fn div_s(&mut self, dst: Temp, a: Temp, b: Temp);
    fn div_u(&mut self, dst: Temp, a: Temp, b: Temp);
    fn rem_s(&mut self, dst: Temp, a: Temp, b: Temp);
    fn rem_u(&mut self, dst: Temp, a: Temp, b: Temp);
    fn and(&mut self, dst: Temp, a: Temp, b: Temp);
    fn or(&mut self, dst: Temp, a: Temp, b: Temp);
    fn xor(&mut self, dst: Temp, a: Temp, b: Temp);
    fn andc(&mut self, dst: Temp, a: Temp, b: Temp);

    fn shl(&mut self, dst: Temp, a: Temp, amount: Temp);
    fn shr_u(&mut self, dst: Temp, a: Temp, amount: Temp);
    fn shr_s(&mut self, dst: Temp, a: Temp, amount: Temp);
    fn shl_imm(&mut self, dst: Temp, a: Temp, amount: u32);
    fn shr_u_imm(&mut self, dst: Temp, a: Temp, amount: u32);
    fn shr_s_imm(&mut self, dst: Temp, a: Temp, amount: u32);

    fn ext8s(&mut self, dst: Temp, src: Temp);
    fn ext16s(&mut self, dst: Temp, src: Temp);
    fn ext8u(&mut self, dst: Temp, src: Temp);
    fn ext16u(&mut self, dst: Temp, src: Temp);
    fn ext_i32_i64_s(&mut self, dst: Temp, src: Temp);
    fn ext_i32_i64_u(&mut self, dst: Temp, src: Temp);
    fn trunc_i64_i32(&mut self, dst: Temp, src: Temp);
    fn concat_i32_i64(&mut self, dst: Temp, low: Temp, high: Temp);

    fn deposit(&mut self, dst: Temp, value: Temp, offset: u32, width: u32);

    fn new_label(&mut self) -> Label;
    fn set_label(&mut self, label: Label);
    fn brcond(&mut self, cond: Cond, a: Temp, b: Temp, target: Label);
    fn brcondi(&mut self, cond: Cond, a: Temp, imm: i32, target: Label);
    fn jump(&mut self, target: Label);

    fn qemu_ld(&mut self, dst: Temp, addr: Temp, op: MemOp);
    fn qemu_st(&mut self, addr: Temp, value: Temp, op: MemOp);

    fn call_helper(&mut self, helper: Helper, args: &[Temp]) -> Option<Temp>;

    fn raise_exception(&mut self, exc: GuestException);

    fn exit_tb(&mut self);
    fn debug_insn_start(&mut self, pc: u32);
    fn io_start(&mut self);
    fn io_end(&mut self);
}

/// One recorded IR operation, as produced by [`RecordingBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum IrOp {
    NewTemp32(Temp),
    NewTemp64(Temp),
    MovI32(Temp, i32),
    MovI64(Temp, i64),
    ReadGlobal(Temp, Global),
    WriteGlobal(Global, Temp),
    Add(Temp, Temp, Temp),
    Sub(Temp, Temp, Temp),
    Mul(Temp, Temp, Temp),
    DivS(Temp, Temp, Temp),
    DivU(Temp, Temp, Temp),
    RemS(Temp, Temp, Temp),
    RemU(Temp, Temp, Temp),
    And(Temp, Temp, Temp),
    Or(Temp, Temp, Temp),
    Xor(Temp, Temp, Temp),
    Andc(Temp, Temp, Temp),
    Shl(Temp, Temp, Temp),
    ShrU(Temp, Temp, Temp),
    ShrS(Temp, Temp, Temp),
    ShlImm(Temp, Temp, u32),
    ShrUImm(Temp, Temp, u32),
    ShrSImm(Temp, Temp, u32),
    Ext8s(Temp, Temp),
    Ext16s(Temp, Temp),
    Ext8u(Temp, Temp),
    Ext16u(Temp, Temp),
    ExtI32I64S(Temp, Temp),
    ExtI32I64U(Temp, Temp),
    TruncI64I32(Temp, Temp),
    ConcatI32I64(Temp, Temp, Temp),
    Deposit(Temp, Temp, u32, u32),
    NewLabel(Label),
    SetLabel(Label),
    BrCond(Cond, Temp, Temp, Label),
    BrCondI(Cond, Temp, i32, Label),
    Jump(Label),
    QemuLd(Temp, Temp, MemOp),
    QemuSt(Temp, Temp, MemOp),
    CallHelper(Helper, Vec<Temp>, Option<Temp>),
    RaiseException(GuestException),
    ExitTb,
    DebugInsnStart(u32),
    IoStart,
    IoEnd,
}

/// In-memory IR builder: records every emitted operation for inspection.
///
/// This is the reference implementation used by this crate's own test
/// suite; a production DBT engine supplies its own [`IrBuilder`].
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    pub ops: Vec<IrOp>,
    next_temp: u32,
    next_label: u32,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IrBuilder for RecordingBuilder {
    fn new_temp32(&mut self) -> Temp {
        let t = Temp(self.next_temp);
        self.next_temp += 1;
        self.ops.push(IrOp::NewTemp32(t));
        t
    }

    fn new_temp64(&mut self) -> Temp {
        let t = Temp(self.next_temp);
        self.next_temp += 1;
        self.ops.push(IrOp::NewTemp64(t));
        t
    }

    fn mov_i32(&mut self, dst: Temp, imm: i32) {
        self.ops.push(IrOp::MovI32(dst, imm));
    }

    fn mov_i64(&mut self, dst: Temp, imm: i64) {
        self.ops.push(IrOp::MovI64(dst, imm));
    }

    fn read_global(&mut self, dst: Temp, global: Global) {
        self.ops.push(IrOp::ReadGlobal(dst, global));
    }

    fn write_global(&mut self, global: Global, src: Temp) {
        self.ops.push(IrOp::WriteGlobal(global, src));
    }

    fn add(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Add(dst, a, b));
    }

    fn sub(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Sub(dst, a, b));
    }

    fn mul(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Mul(dst, a, b));
    }

    fn div_s(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::DivS(dst, a, b));
    }

    fn div_u(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::DivU(dst, a, b));
    }

    fn rem_s(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::RemS(dst, a, b));
    }

    fn rem_u(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::RemU(dst, a, b));
    }

    fn and(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::And(dst, a, b));
    }

    fn or(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Or(dst, a, b));
    }

    fn xor(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Xor(dst, a, b));
    }

    fn andc(&mut self, dst: Temp, a: Temp, b: Temp) {
        self.ops.push(IrOp::Andc(dst, a, b));
    }

    fn shl(&mut self, dst: Temp, a: Temp, amount: Temp) {
        self.ops.push(IrOp::Shl(dst, a, amount));
    }

    fn shr_u(&mut self, dst: Temp, a: Temp, amount: Temp) {
        self.ops.push(IrOp::ShrU(dst, a, amount));
    }

    fn shr_s(&mut self, dst: Temp, a: Temp, amount: Temp) {
        self.ops.push(IrOp::ShrS(dst, a, amount));
    }

    fn shl_imm(&mut self, dst: Temp, a: Temp, amount: u32) {
        self.ops.push(IrOp::ShlImm(dst, a, amount));
    }

    fn shr_u_imm(&mut self, dst: Temp, a: Temp, amount: u32) {
        self.ops.push(IrOp::ShrUImm(dst, a, amount));
    }

    fn shr_s_imm(&mut self, dst: Temp, a: Temp, amount: u32) {
        self.ops.push(IrOp::ShrSImm(dst, a, amount));
    }

    fn ext8s(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::Ext8s(dst, src));
    }

    fn ext16s(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::Ext16s(dst, src));
    }

    fn ext8u(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::Ext8u(dst, src));
    }

    fn ext16u(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::Ext16u(dst, src));
    }

    fn ext_i32_i64_s(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::ExtI32I64S(dst, src));
    }

    fn ext_i32_i64_u(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::ExtI32I64U(dst, src));
    }

    fn trunc_i64_i32(&mut self, dst: Temp, src: Temp) {
        self.ops.push(IrOp::TruncI64I32(dst, src));
    }

    fn concat_i32_i64(&mut self, dst: Temp, low: Temp, high: Temp) {
        self.ops.push(IrOp::ConcatI32I64(dst, low, high));
    }

    fn deposit(&mut self, dst: Temp, value: Temp, offset: u32, width: u32) {
        self.ops.push(IrOp::Deposit(dst, value, offset, width));
    }

    fn new_label(&mut self) -> Label {
        let l = Label(self.next_label);
        self.next_label += 1;
        self.ops.push(IrOp::NewLabel(l));
        l
    }

    fn set_label(&mut self, label: Label) {
        self.ops.push(IrOp::SetLabel(label));
    }

    fn brcond(&mut self, cond: Cond, a: Temp, b: Temp, target: Label) {
        self.ops.push(IrOp::BrCond(cond, a, b, target));
    }

    fn brcondi(&mut self, cond: Cond, a: Temp, imm: i32, target: Label) {
        self.ops.push(IrOp::BrCondI(cond, a, imm, target));
    }

    fn jump(&mut self, target: Label) {
        self.ops.push(IrOp::Jump(target));
    }

    fn qemu_ld(&mut self, dst: Temp, addr: Temp, op: MemOp) {
        self.ops.push(IrOp::QemuLd(dst, addr, op));
    }

    fn qemu_st(&mut self, addr: Temp, value: Temp, op: MemOp) {
        self.ops.push(IrOp::QemuSt(addr, value, op));
    }

    fn call_helper(&mut self, helper: Helper, args: &[Temp]) -> Option<Temp> {
        let ret = self.new_temp32();
        self.ops
            .push(IrOp::CallHelper(helper, args.to_vec(), Some(ret)));
        Some(ret)
    }

    fn raise_exception(&mut self, exc: GuestException) {
        self.ops.push(IrOp::RaiseException(exc));
    }

    fn exit_tb(&mut self) {
        self.ops.push(IrOp::ExitTb);
    }

    fn debug_insn_start(&mut self, pc: u32) {
        self.ops.push(IrOp::DebugInsnStart(pc));
    }

    fn io_start(&mut self) {
        self.ops.push(IrOp::IoStart);
    }

    fn io_end(&mut self) {
        self.ops.push(IrOp::IoEnd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_builder_assigns_increasing_temp_ids() {
        let mut b = RecordingBuilder::new();
        let t0 = b.new_temp32();
        let t1 = b.new_temp32();
        assert_eq!(t0, Temp(0));
        assert_eq!(t1, Temp(1));
    }

    #[test]
    fn call_helper_records_args_and_returns_a_temp() {
        let mut b = RecordingBuilder::new();
        let a = b.new_temp32();
        let ret = b.call_helper(Helper::Entry, &[a]);
        assert!(ret.is_some());
        assert!(matches!(b.ops.last(), Some(IrOp::CallHelper(Helper::Entry, args, Some(_))) if args == &[a]));
    }
}
