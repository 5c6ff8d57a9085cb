use std::ops::RangeInclusive;

/// Helpers to read and manipulate single bits and bit fields of an integer.
///
/// Bit indexes go from lsb to msb (right to left), so `0` is the least
/// significant bit and ranges are inclusive on both ends.
pub trait Bits: Copy + Sized {
    /// Width of the implementing type, in bits.
    const BITS_COUNT: u8;

    fn is_bit_on(&self, bit_idx: u8) -> bool;

    fn set_bit(&mut self, bit_idx: u8, value: bool);

    /// Extracts the field in `bits_range` and moves it to position 0.
    fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self;

    /// Replaces the field in `bits_range` with the low bits of `value`.
    fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self);

    fn get_byte(&self, byte_nth: u8) -> u8;

    fn set_byte(&mut self, byte_nth: u8, value: u8);

    /// Returns a sign-extended copy of the value.
    /// `number_of_bits` is the width of the two's complement value stored
    /// in the low bits.
    fn sign_extended(&self, number_of_bits: u8) -> Self;

    fn is_bit_off(&self, bit_idx: u8) -> bool {
        !self.is_bit_on(bit_idx)
    }

    fn get_bit(&self, bit_idx: u8) -> bool {
        self.is_bit_on(bit_idx)
    }

    fn set_bit_on(&mut self, bit_idx: u8) {
        self.set_bit(bit_idx, true);
    }

    fn set_bit_off(&mut self, bit_idx: u8) {
        self.set_bit(bit_idx, false);
    }
}

macro_rules! impl_bits {
    ($($unsigned:ty => $signed:ty),* $(,)?) => {$(
        impl Bits for $unsigned {
            const BITS_COUNT: u8 = <$unsigned>::BITS as u8;

            fn is_bit_on(&self, bit_idx: u8) -> bool {
                debug_assert!(bit_idx < Self::BITS_COUNT);
                (*self >> bit_idx) & 1 == 1
            }

            fn set_bit(&mut self, bit_idx: u8, value: bool) {
                debug_assert!(bit_idx < Self::BITS_COUNT);
                let mask: $unsigned = 1 << bit_idx;
                if value {
                    *self |= mask;
                } else {
                    *self &= !mask;
                }
            }

            fn get_bits(&self, bits_range: RangeInclusive<u8>) -> Self {
                let (start, end) = (*bits_range.start(), *bits_range.end());
                debug_assert!(start <= end && end < Self::BITS_COUNT);

                let length = end - start + 1;
                let value = *self >> start;
                if length == Self::BITS_COUNT {
                    value
                } else {
                    value & ((1 << length) - 1)
                }
            }

            fn set_bits(&mut self, bits_range: RangeInclusive<u8>, value: Self) {
                let (start, end) = (*bits_range.start(), *bits_range.end());
                debug_assert!(start <= end && end < Self::BITS_COUNT);

                let length = end - start + 1;
                let field_mask: $unsigned = if length == Self::BITS_COUNT {
                    <$unsigned>::MAX
                } else {
                    (1 << length) - 1
                };

                *self = (*self & !(field_mask << start)) | ((value & field_mask) << start);
            }

            fn get_byte(&self, byte_nth: u8) -> u8 {
                debug_assert!(byte_nth < Self::BITS_COUNT / 8);
                (*self >> (byte_nth * 8)) as u8
            }

            fn set_byte(&mut self, byte_nth: u8, value: u8) {
                debug_assert!(byte_nth < Self::BITS_COUNT / 8);
                let shift = byte_nth * 8;
                *self = (*self & !(<$unsigned>::from(u8::MAX) << shift))
                    | (<$unsigned>::from(value) << shift);
            }

            fn sign_extended(&self, number_of_bits: u8) -> Self {
                debug_assert!(number_of_bits > 0);
                if number_of_bits >= Self::BITS_COUNT {
                    return *self;
                }

                // Move the sign bit of the field up to the msb, then let the
                // arithmetic shift replicate it on the way back down.
                let unused = Self::BITS_COUNT - number_of_bits;
                (((*self << unused) as $signed) >> unused) as $unsigned
            }
        }
    )*};
}

impl_bits!(u8 => i8, u16 => i16, u32 => i32, u64 => i64);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_is_on() {
        let b = 0b1_1001_1101_u32;
        assert!(b.is_bit_on(0));
        assert!(!b.is_bit_on(1));
        assert!(b.is_bit_on(2));
        assert!(b.is_bit_on(3));
        assert!(b.is_bit_on(8));
        assert!(!b.is_bit_on(31));
    }

    #[test]
    fn test_is_off() {
        let b = 0b1_1001_1101_u32;
        assert!(!b.is_bit_off(0));
        assert!(b.is_bit_off(1));
        assert!(b.is_bit_off(31));
    }

    #[test]
    fn test_set_on_and_off() {
        let mut b = 0b1_1001_1101_u32;
        b.set_bit_on(1);
        b.set_bit_on(11);
        b.set_bit_off(0);
        assert_eq!(b, 0b1001_1001_1110);
    }

    #[test]
    #[should_panic]
    fn invalid_index() {
        let b = 0u32;
        b.is_bit_on(32);
    }

    #[test]
    fn get_bits() {
        let b = 0b10_1100_1110_u32;
        assert_eq!(b.get_bits(0..=3), 0b1110);
        assert_eq!(b.get_bits(1..=1), 0b1);
        assert_eq!(b.get_bits(4..=7), 0b1100);
        assert_eq!(b.get_bits(8..=9), 0b10);
        assert_eq!(b.get_bits(0..=31), 0b10_1100_1110);
        assert_eq!(b.get_bits(28..=31), 0b0);
        assert_eq!(u32::MAX.get_bits(31..=31), 1);
    }

    #[test]
    fn set_bits_keeps_the_rest() {
        let mut b = 0xFFFF_FFFF_u32;
        b.set_bits(8..=15, 0x12);
        assert_eq!(b, 0xFFFF_12FF);

        b.set_bits(0..=31, 7);
        assert_eq!(b, 7);

        // Only the low bits of the value land in the field.
        b.set_bits(4..=7, 0xAB);
        assert_eq!(b, 0xB7);
    }

    #[test]
    fn set_then_get_bits_on_random_fields() {
        for _ in 0..64 {
            let mut value = rand::random::<u32>();
            let start = rand::random::<u8>() % 32;
            let end = start + rand::random::<u8>() % (32 - start);
            let field = rand::random::<u32>();

            value.set_bits(start..=end, field);

            let width = u32::from(end - start + 1);
            let expected = if width == 32 { field } else { field & ((1 << width) - 1) };
            assert_eq!(value.get_bits(start..=end), expected);
        }
    }

    #[test]
    fn get_and_set_byte() {
        let mut b: u32 = 0x0122_0448;

        assert_eq!(b.get_byte(0), 0x48);
        assert_eq!(b.get_byte(1), 0x04);
        assert_eq!(b.get_byte(2), 0x22);
        assert_eq!(b.get_byte(3), 0x01);

        b.set_byte(3, 0xAA);
        assert_eq!(b, 0xAA22_0448);
        b.set_byte(0, 0x00);
        assert_eq!(b, 0xAA22_0400);
    }

    #[test]
    #[should_panic]
    fn get_byte_panic() {
        0_u32.get_byte(4);
    }

    #[test]
    fn check_sign_extended() {
        let a: u32 = 0b1001; // -7 in i4
        assert_eq!(a.sign_extended(4) as i32, -7);

        let b: u32 = 0b0111;
        assert_eq!(b.sign_extended(4), 7);

        assert_eq!(0x80_u32.sign_extended(8), 0xFFFF_FF80);
        assert_eq!(0x7FFF_u32.sign_extended(16), 0x7FFF);
        assert_eq!(0x00FF_FFFF_u32.sign_extended(24), u32::MAX);
    }
}
