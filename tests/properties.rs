use proptest::prelude::*;

use xtensa_xlate::config::Options;
use xtensa_xlate::decode::decode;
use xtensa_xlate::fields::{instruction_len, LittleEndian, RawWord, Rri8, B4CONST, B4CONSTU};

proptest! {
    #[test]
    fn decode_is_pure_for_any_word(b0: u8, b1: u8, b2: u8, pc: u32) {
        let word = RawWord::read::<LittleEndian>(b0, b1, b2);
        let a = decode(Options::empty(), word, pc);
        let b = decode(Options::empty(), word, pc);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn instruction_length_follows_op0_for_any_word(b0: u8, b1: u8, b2: u8) {
        let word = RawWord::read::<LittleEndian>(b0, b1, b2);
        let len = instruction_len(word.op0());
        if word.op0() >= 8 {
            prop_assert_eq!(len, 2);
        } else {
            prop_assert_eq!(len, 3);
        }
    }

    #[test]
    fn imm8_se_sign_extension_law(imm8: u8) {
        // imm8 occupies bits 16..24 of the word, i.e. the whole of `b2` under
        // the little-endian assembly rule.
        let word = RawWord::read::<LittleEndian>(0, 0, imm8);
        let sign_extended = Rri8::decode(word).imm8_se();
        let bit7 = (imm8 >> 7) & 1;
        for n in 8..32 {
            let bit_n = (sign_extended as u32 >> n) & 1;
            prop_assert_eq!(bit_n, u32::from(bit7));
        }
    }
}

#[test]
fn b4const_and_b4constu_irregular_entries_are_regression_critical() {
    assert_eq!(B4CONST[0], -1);
    assert_eq!(B4CONSTU[0], 32768);
    assert_eq!(B4CONSTU[1], 65536);
    assert_eq!(B4CONST[1..9], [1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(B4CONST[9..], [10, 12, 16, 32, 64, 128, 256]);
}
