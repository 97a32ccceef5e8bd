#[cfg(test)]
mod util;

use xtensa_xlate::config::Options;
use xtensa_xlate::diagnostics::GuestException;
use xtensa_xlate::ir::{Global, IrOp};

use util::translate;

#[test]
fn add_writes_sum_of_the_two_source_registers() {
    // ADD a1, a2, a3: bytes 30 12 80 (little-endian layout)
    let ops = translate(0, Options::empty(), vec![0x30, 0x12, 0x80]);

    let s = ops
        .iter()
        .find_map(|op| match op {
            IrOp::ReadGlobal(t, Global::R(2)) => Some(*t),
            _ => None,
        })
        .expect("reads R2");
    let t = ops
        .iter()
        .find_map(|op| match op {
            IrOp::ReadGlobal(t, Global::R(3)) => Some(*t),
            _ => None,
        })
        .expect("reads R3");
    assert!(ops.iter().any(|op| matches!(op, IrOp::Add(_, a, b) if *a == s && *b == t)));
    assert!(ops.iter().any(|op| matches!(op, IrOp::WriteGlobal(Global::R(1), _))));
}

#[test]
fn movi_n_loads_the_sign_extended_immediate() {
    // MOVI.N a5, -1: narrow form, requires CODE_DENSITY
    let ops = translate(0, Options::CODE_DENSITY, vec![0x5C, 0x7F]);
    assert!(ops.iter().any(|op| matches!(op, IrOp::MovI32(_, -1))));
    assert!(ops.iter().any(|op| matches!(op, IrOp::WriteGlobal(Global::R(5), _))));
}

#[test]
fn l32r_computes_the_effective_address_from_the_masked_pc_and_literal_base() {
    // L32R a0, imm16=1 at pc=0x1000: EA = ((pc+3)&~3) + (imm16<<2) + 0xfffc0000
    let word = (1u32 << 8) | 0x1; // imm16 field occupies bits 8..24, t=0 in bits 4..8
    let b0 = 0x1; // op0 = 1 (L32R)
    let b1 = (word >> 8) as u8;
    let b2 = (word >> 16) as u8;
    let ops = translate(0x1000, Options::empty(), vec![b0, b1, b2]);
    // masked_pc = (0x1003 & !3) = 0x1000; offset = (1<<2) + 0xfffc0000, folded as i32.
    assert!(ops.iter().any(|op| matches!(op, IrOp::MovI32(_, 0x1000))));
    assert!(ops.iter().any(|op| matches!(op, IrOp::MovI32(_, v) if *v == 4i32.wrapping_add(0xfffc_0000u32 as i32))));
    assert!(ops.iter().any(|op| matches!(op, IrOp::QemuLd(_, _, _))));
}

#[test]
fn quos_guards_the_divide_with_a_zero_check_before_dividing() {
    // QUOS a1, a2, a3: op0=0, op1=0x2 (RST2), op2=0xD, r=1 s=2 t=3
    let b0 = 0x30;
    let b1 = 0x12;
    let b2 = 0xD2;
    let ops = translate(0, Options::empty(), vec![b0, b1, b2]);
    let guard = ops
        .iter()
        .position(|op| matches!(op, IrOp::RaiseException(GuestException::IntegerDivideByZero(_))))
        .expect("emits a divide-by-zero guard");
    let divide = ops
        .iter()
        .position(|op| matches!(op, IrOp::DivS(_, _, _)))
        .expect("emits the signed divide");
    assert!(guard < divide);
}

#[test]
fn s32c1i_only_stores_back_when_the_loaded_value_matches_scompare1() {
    // S32C1I a4, a5, 0: op0=2, sub-op r=0xE, t=4 (dest), s=5 (base), imm8=0
    let b0 = 0x42;
    let b1 = 0xE5;
    let b2 = 0x00;
    let ops = translate(0, Options::empty(), vec![b0, b1, b2]);
    assert!(ops.iter().any(|op| matches!(op, IrOp::QemuLd(_, _, _))));
    let store = ops.iter().position(|op| matches!(op, IrOp::QemuSt(_, _, _)));
    let label = ops.iter().position(|op| matches!(op, IrOp::SetLabel(_)));
    assert!(store.is_some());
    assert!(store.unwrap() < label.unwrap());
}

#[test]
fn loop_sets_up_lcount_lbeg_and_lend_then_jumps() {
    // LOOP a3, +9: op0=6, SI subtree op1=9 (loop family), m=0 (plain LOOP), s=3
    let b0 = 0x06;
    let b1 = 0x03;
    let b2 = 0x09;
    let ops = translate_loop(b0, b1, b2);
    assert!(ops.iter().any(|op| matches!(op, IrOp::WriteGlobal(Global::Sr(s), _) if *s == xtensa_xlate::registers::SR_LCOUNT)));
    assert!(ops.iter().any(|op| matches!(op, IrOp::WriteGlobal(Global::Sr(s), _) if *s == xtensa_xlate::registers::SR_LBEG)));
    assert!(ops.iter().any(|op| matches!(op, IrOp::CallHelper(xtensa_xlate::ir::Helper::WsrLend, _, _))));
}

fn translate_loop(b0: u8, b1: u8, b2: u8) -> Vec<IrOp> {
    translate(0, Options::LOOP, vec![b0, b1, b2])
}
