//! CPU state dump formatting (§4.8), mirroring `cpu_dump_state`.

use core::fmt;

use crate::config::CpuConfig;
use crate::registers::{
    NUMBER_OF_REGISTERS, SR_CCOMPARE0, SR_CCOUNT, SR_CPENABLE, SR_DEPC, SR_EXCCAUSE, SR_EXCVADDR,
    SR_INTCLEAR, SR_INTENABLE, SR_INTSET, SR_LBEG, SR_LCOUNT, SR_LEND, SR_LITBASE, SR_PRID, SR_PS,
    SR_SAR, SR_SCOMPARE1, SR_WINDOW_BASE, SR_WINDOW_START, UR_FCR, UR_FSR, UR_THREADPTR,
};
use crate::state::CpuState;

const NAMED_SR_ORDER: &[(u8, &str)] = &[
    (SR_LBEG, "LBEG"),
    (SR_LEND, "LEND"),
    (SR_LCOUNT, "LCOUNT"),
    (SR_SAR, "SAR"),
    (SR_LITBASE, "LITBASE"),
    (SR_SCOMPARE1, "SCOMPARE1"),
    (SR_WINDOW_BASE, "WINDOWBASE"),
    (SR_WINDOW_START, "WINDOWSTART"),
    (SR_PS, "PS"),
    (SR_EXCCAUSE, "EXCCAUSE"),
    (SR_EXCVADDR, "EXCVADDR"),
    (SR_CCOUNT, "CCOUNT"),
    (SR_PRID, "PRID"),
    (SR_DEPC, "DEPC"),
    (SR_INTSET, "INTSET"),
    (SR_INTCLEAR, "INTCLEAR"),
    (SR_INTENABLE, "INTENABLE"),
    (SR_CPENABLE, "CPENABLE"),
    (SR_CCOMPARE0, "CCOMPARE0"),
    (SR_CCOMPARE0 + 1, "CCOMPARE1"),
    (SR_CCOMPARE0 + 2, "CCOMPARE2"),
];

const NAMED_UR_ORDER: &[(u8, &str)] = &[
    (UR_THREADPTR, "THREADPTR"),
    (UR_FCR, "FCR"),
    (UR_FSR, "FSR"),
];

/// Pretty-prints architectural state into `out`, 4 entries per line.
///
/// The consuming engine picks its own sink; this crate never assumes stdout
/// or a particular logger is available.
pub fn dump_state(state: &CpuState, config: &CpuConfig, out: &mut dyn fmt::Write) -> fmt::Result {
    writeln!(out, "PC={:08x}", state.pc)?;

    write_named_sr_block(state, out)?;
    writeln!(out)?;
    write_named_ur_block(state, out)?;
    writeln!(out)?;
    write_four_per_line(out, "A", NUMBER_OF_REGISTERS, |i| state.r[i])?;
    writeln!(out)?;
    write_four_per_line(out, "AR", config.nareg as usize, |i| state.ar[i])?;

    Ok(())
}

fn write_named_sr_block(state: &CpuState, out: &mut dyn fmt::Write) -> fmt::Result {
    let mut col = 0;
    for (index, name) in NAMED_SR_ORDER {
        write!(out, "{}={:08x}", name, state.sr(*index))?;
        col += 1;
        if col % 4 == 0 {
            writeln!(out)?;
        } else {
            write!(out, " ")?;
        }
    }
    if col % 4 != 0 {
        writeln!(out)?;
    }
    Ok(())
}

fn write_named_ur_block(state: &CpuState, out: &mut dyn fmt::Write) -> fmt::Result {
    let mut col = 0;
    for (index, name) in NAMED_UR_ORDER {
        write!(out, "{}={:08x}", name, state.ur(*index))?;
        col += 1;
        if col % 4 == 0 {
            writeln!(out)?;
        } else {
            write!(out, " ")?;
        }
    }
    if col % 4 != 0 {
        writeln!(out)?;
    }
    Ok(())
}

fn write_four_per_line(
    out: &mut dyn fmt::Write,
    prefix: &str,
    count: usize,
    value_at: impl Fn(usize) -> u32,
) -> fmt::Result {
    for i in 0..count {
        write!(out, "{}{:02}={:08x}", prefix, i, value_at(i))?;
        if (i + 1) % 4 == 0 {
            writeln!(out)?;
        } else {
            write!(out, " ")?;
        }
    }
    if count % 4 != 0 {
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ByteOrder, Options};

    #[test]
    fn dump_includes_pc_and_headers() {
        let mut state = CpuState::new(32);
        state.pc = 0x4000;
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut buf = String::new();
        dump_state(&state, &cfg, &mut buf).unwrap();
        assert!(buf.starts_with("PC=00004000\n"));
        assert!(buf.contains("LBEG=00000000"));
        assert!(buf.contains("A00=00000000"));
        assert!(buf.contains("AR00=00000000"));
    }

    #[test]
    fn a_registers_wrap_every_four_columns() {
        let state = CpuState::new(32);
        let cfg = CpuConfig::new(Options::empty(), ByteOrder::Little, 32, 2, false);
        let mut buf = String::new();
        dump_state(&state, &cfg, &mut buf).unwrap();
        let a_line = buf.lines().find(|l| l.starts_with("A00=")).unwrap();
        assert_eq!(a_line.split(' ').count(), 4);
    }
}
