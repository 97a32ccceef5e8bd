/*!
Xtensa register definitions.

Only a sparse, named subset of the 256-entry special-register (SR) and
user-register (UR) files is architecturally meaningful; every other index
is reported as unimplemented and never materialized, per
[`crate::diagnostics::DiagnosticKind::UnimplementedSr`].
*/

/// One of the 16 windowed address registers, `A0..A15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Register(pub u8);

/// Number of windowed address registers visible at any one time.
pub const NUMBER_OF_REGISTERS: usize = 16;

/// Named special registers. Index values match the Xtensa SR number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedSr {
    Lbeg,
    Lend,
    Lcount,
    Sar,
    Litbase,
    Scompare1,
    WindowBase,
    WindowStart,
    Ps,
    Epc1,
    Epc2,
    Epc3,
    Epc4,
    Epc5,
    Epc6,
    Epc7,
    Depc,
    Eps2,
    Eps3,
    Eps4,
    Eps5,
    Eps6,
    Eps7,
    Excsave1,
    Excsave2,
    Excsave3,
    Excsave4,
    Excsave5,
    Excsave6,
    Excsave7,
    Cpenable,
    Intset,
    Intclear,
    Intenable,
    Exccause,
    Ccount,
    Prid,
    Excvaddr,
    Ccompare0,
    Ccompare1,
    Ccompare2,
}

/// SR index of `LEND` (block-end loop address).
pub const SR_LEND: u8 = 1;
/// SR index of `LCOUNT`.
pub const SR_LCOUNT: u8 = 2;
/// SR index of `SAR`, the shift-amount register.
pub const SR_SAR: u8 = 3;
/// SR index of `LBEG`.
pub const SR_LBEG: u8 = 0;
/// SR index of `WINDOW_BASE`.
pub const SR_WINDOW_BASE: u8 = 72;
/// SR index of `WINDOW_START`.
pub const SR_WINDOW_START: u8 = 73;
/// SR index of `PS`, the processor-state register.
pub const SR_PS: u8 = 230;
/// SR index of `PRID`.
pub const SR_PRID: u8 = 235;
/// SR index of `CCOMPARE0`; `CCOMPARE1`/`CCOMPARE2` follow contiguously.
pub const SR_CCOMPARE0: u8 = 240;
/// SR index of `EPC1`; `EPC2..EPC7` follow contiguously.
pub const SR_EPC1: u8 = 177;
/// SR index of `DEPC`.
pub const SR_DEPC: u8 = 192;
/// SR index of `EXCCAUSE`.
pub const SR_EXCCAUSE: u8 = 232;
/// SR index of `EXCVADDR`.
pub const SR_EXCVADDR: u8 = 238;
/// SR index of `CCOUNT`.
pub const SR_CCOUNT: u8 = 234;
/// SR index of `SCOMPARE1`.
pub const SR_SCOMPARE1: u8 = 12;
/// SR index of `LITBASE`.
pub const SR_LITBASE: u8 = 5;
/// SR index of `EPS2`; `EPS3..EPS7` follow contiguously.
pub const SR_EPS2: u8 = 194;
/// SR index of `EXCSAVE1`; `EXCSAVE2..EXCSAVE7` follow contiguously.
pub const SR_EXCSAVE1: u8 = 209;
/// SR index of `INTSET`.
pub const SR_INTSET: u8 = 226;
/// SR index of `INTCLEAR`.
pub const SR_INTCLEAR: u8 = 227;
/// SR index of `INTENABLE`.
pub const SR_INTENABLE: u8 = 228;
/// SR index of `CPENABLE`.
pub const SR_CPENABLE: u8 = 224;

/// Resolves an SR index to its architectural name, if any is assigned.
pub const fn named_sr(index: u8) -> Option<NamedSr> {
    Some(match index {
        SR_LBEG => NamedSr::Lbeg,
        SR_LEND => NamedSr::Lend,
        SR_LCOUNT => NamedSr::Lcount,
        SR_SAR => NamedSr::Sar,
        SR_LITBASE => NamedSr::Litbase,
        SR_SCOMPARE1 => NamedSr::Scompare1,
        SR_WINDOW_BASE => NamedSr::WindowBase,
        SR_WINDOW_START => NamedSr::WindowStart,
        SR_PS => NamedSr::Ps,
        SR_PRID => NamedSr::Prid,
        SR_DEPC => NamedSr::Depc,
        SR_EXCCAUSE => NamedSr::Exccause,
        SR_EXCVADDR => NamedSr::Excvaddr,
        SR_CCOUNT => NamedSr::Ccount,
        SR_CPENABLE => NamedSr::Cpenable,
        SR_INTSET => NamedSr::Intset,
        SR_INTCLEAR => NamedSr::Intclear,
        SR_INTENABLE => NamedSr::Intenable,
        SR_CCOMPARE0 => NamedSr::Ccompare0,
        x if x == SR_CCOMPARE0 + 1 => NamedSr::Ccompare1,
        x if x == SR_CCOMPARE0 + 2 => NamedSr::Ccompare2,
        SR_EPC1 => NamedSr::Epc1,
        x if x == SR_EPC1 + 1 => NamedSr::Epc2,
        x if x == SR_EPC1 + 2 => NamedSr::Epc3,
        x if x == SR_EPC1 + 3 => NamedSr::Epc4,
        x if x == SR_EPC1 + 4 => NamedSr::Epc5,
        x if x == SR_EPC1 + 5 => NamedSr::Epc6,
        x if x == SR_EPC1 + 6 => NamedSr::Epc7,
        SR_EPS2 => NamedSr::Eps2,
        x if x == SR_EPS2 + 1 => NamedSr::Eps3,
        x if x == SR_EPS2 + 2 => NamedSr::Eps4,
        x if x == SR_EPS2 + 3 => NamedSr::Eps5,
        x if x == SR_EPS2 + 4 => NamedSr::Eps6,
        x if x == SR_EPS2 + 5 => NamedSr::Eps7,
        SR_EXCSAVE1 => NamedSr::Excsave1,
        x if x == SR_EXCSAVE1 + 1 => NamedSr::Excsave2,
        x if x == SR_EXCSAVE1 + 2 => NamedSr::Excsave3,
        x if x == SR_EXCSAVE1 + 3 => NamedSr::Excsave4,
        x if x == SR_EXCSAVE1 + 4 => NamedSr::Excsave5,
        x if x == SR_EXCSAVE1 + 5 => NamedSr::Excsave6,
        x if x == SR_EXCSAVE1 + 6 => NamedSr::Excsave7,
        _ => return None,
    })
}

/// Named user registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedUr {
    Threadptr,
    Fcr,
    Fsr,
}

/// UR index of `THREADPTR`.
pub const UR_THREADPTR: u8 = 231;
/// UR index of `FCR`.
pub const UR_FCR: u8 = 232;
/// UR index of `FSR`.
pub const UR_FSR: u8 = 233;

/// Resolves a UR index to its architectural name, if any is assigned.
pub const fn named_ur(index: u8) -> Option<NamedUr> {
    Some(match index {
        UR_THREADPTR => NamedUr::Threadptr,
        UR_FCR => NamedUr::Fcr,
        UR_FSR => NamedUr::Fsr,
        _ => return None,
    })
}

/// Bit layout of the `PS` special register.
pub mod ps_fields {
    pub const EXCM_BIT: u32 = 4;
    pub const RING_SHIFT: u32 = 6;
    pub const RING_LEN: u32 = 2;
    pub const INTLEVEL_SHIFT: u32 = 0;
    pub const INTLEVEL_LEN: u32 = 4;
    pub const CALLINC_SHIFT: u32 = 16;
    pub const CALLINC_LEN: u32 = 2;

    pub const fn excm(ps: u32) -> bool {
        (ps >> EXCM_BIT) & 1 != 0
    }

    pub const fn ring(ps: u32) -> u32 {
        (ps >> RING_SHIFT) & ((1 << RING_LEN) - 1)
    }

    pub const fn with_callinc(ps: u32, n: u32) -> u32 {
        let mask = ((1 << CALLINC_LEN) - 1) << CALLINC_SHIFT;
        (ps & !mask) | ((n << CALLINC_SHIFT) & mask)
    }

    pub const fn with_intlevel(ps: u32, level: u32) -> u32 {
        let mask = ((1 << INTLEVEL_LEN) - 1) << INTLEVEL_SHIFT;
        (ps & !mask) | ((level << INTLEVEL_SHIFT) & mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_sr_resolves_loop_registers() {
        assert_eq!(named_sr(SR_LBEG), Some(NamedSr::Lbeg));
        assert_eq!(named_sr(SR_LEND), Some(NamedSr::Lend));
        assert_eq!(named_sr(SR_LCOUNT), Some(NamedSr::Lcount));
    }

    #[test]
    fn unnamed_sr_is_none() {
        assert_eq!(named_sr(17), None);
    }

    #[test]
    fn ccompare_indices_are_contiguous() {
        assert_eq!(named_sr(SR_CCOMPARE0), Some(NamedSr::Ccompare0));
        assert_eq!(named_sr(SR_CCOMPARE0 + 1), Some(NamedSr::Ccompare1));
        assert_eq!(named_sr(SR_CCOMPARE0 + 2), Some(NamedSr::Ccompare2));
    }

    #[test]
    fn ps_field_helpers_round_trip() {
        let ps = ps_fields::with_intlevel(0, 3);
        assert_eq!(ps_fields::ring(ps), 0);
        assert!(!ps_fields::excm(ps));
        let ps = ps_fields::with_callinc(ps, 2);
        assert_eq!((ps >> ps_fields::CALLINC_SHIFT) & 0b11, 2);
    }
}
