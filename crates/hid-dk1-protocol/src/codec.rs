//! Little-endian field decoders and the DK1 21-bit packed sample triple.
//!
//! The tracker packs each accelerometer or gyroscope triple into 8 bytes:
//!
//! | Field | Bits | Source bytes                                  |
//! |-------|------|-----------------------------------------------|
//! | x     | 21   | `b0[7:0] b1[7:0] b2[7:3]`                     |
//! | y     | 21   | `b2[2:0] b3[7:0] b4[7:0] b5[7:6]`             |
//! | z     | 21   | `b5[5:0] b6[7:0] b7[7:1]`                     |
//!
//! Each field is a big-endian-ordered two's complement value and the lowest
//! bit of `b7` is unused.

/// Smallest value a 21-bit two's complement field can hold.
pub const S21_MIN: i32 = -(1 << 20);

/// Largest value a 21-bit two's complement field can hold.
pub const S21_MAX: i32 = (1 << 20) - 1;

const S21_MASK: u32 = 0x1F_FFFF;

#[inline]
pub fn decode_u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

#[inline]
pub fn decode_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

#[inline]
pub fn decode_u32_le(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

/// Reinterpret a little-endian 32-bit pattern as an IEEE-754 float.
///
/// This is a bit cast, not a numeric conversion: `0x3F80_0000` decodes to `1.0`.
#[inline]
pub fn decode_f32_le(bytes: [u8; 4]) -> f32 {
    f32::from_bits(decode_u32_le(bytes))
}

#[inline]
fn sign_extend_21(raw: u32) -> i32 {
    (((raw & S21_MASK) << 11) as i32) >> 11
}

/// Unpack three sign-extended 21-bit fields from an 8-byte DK1 sample block.
pub fn unpack_triple_s21(bytes: &[u8; 8]) -> (i32, i32, i32) {
    let [b0, b1, b2, b3, b4, b5, b6, b7] = (*bytes).map(u32::from);

    let x = (b0 << 13) | (b1 << 5) | ((b2 & 0xF8) >> 3);
    let y = ((b2 & 0x07) << 18) | (b3 << 10) | (b4 << 2) | ((b5 & 0xC0) >> 6);
    let z = ((b5 & 0x3F) << 15) | (b6 << 7) | (b7 >> 1);

    (sign_extend_21(x), sign_extend_21(y), sign_extend_21(z))
}

/// Pack three values into the 8-byte DK1 sample block layout.
///
/// Values outside `S21_MIN..=S21_MAX` are truncated to their low 21 bits,
/// exactly as the device firmware would.
pub fn pack_triple_s21(x: i32, y: i32, z: i32) -> [u8; 8] {
    let x = (x as u32) & S21_MASK;
    let y = (y as u32) & S21_MASK;
    let z = (z as u32) & S21_MASK;

    [
        (x >> 13) as u8,
        (x >> 5) as u8,
        (((x & 0x1F) << 3) | (y >> 18)) as u8,
        (y >> 10) as u8,
        (y >> 2) as u8,
        (((y & 0x03) << 6) | (z >> 15)) as u8,
        (z >> 7) as u8,
        ((z & 0x7F) << 1) as u8,
    ]
}
