//! Perceptual volume ramp.
//!
//! Maps the linear 0–255 knob position to an 8-bit output gain. The table
//! approximates `(n / 64)^4` and was tuned by ear against a square wave, so
//! it is kept verbatim rather than computed: the loudness curve is part of
//! the device's observable behaviour.

/// Number of knob positions.
pub const RAMP_SIZE: usize = 256;

#[rustfmt::skip]
pub static VOLUME_RAMP: [u8; RAMP_SIZE] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,   0,
      1,   1,   1,   1,   1,   1,   1,   1,   1,   1,   1,   1,   1,   2,   2,   2,
      2,   2,   2,   2,   2,   3,   3,   3,   3,   3,   3,   4,   4,   4,   4,   4,
      5,   5,   5,   5,   5,   6,   6,   6,   6,   7,   7,   7,   8,   8,   8,   9,
      9,   9,  10,  10,  10,  11,  11,  11,  12,  12,  13,  13,  14,  14,  15,  15,
     16,  16,  17,  17,  18,  18,  19,  19,  20,  20,  21,  22,  22,  23,  24,  24,
     25,  26,  27,  27,  28,  29,  30,  30,  31,  32,  33,  34,  35,  36,  37,  38,
     39,  40,  41,  42,  43,  44,  45,  46,  47,  48,  49,  50,  52,  53,  54,  55,
     57,  58,  59,  61,  62,  63,  65,  66,  68,  69,  71,  72,  74,  76,  77,  79,
     81,  82,  84,  86,  87,  89,  91,  93,  95,  97,  99, 101, 103, 105, 107, 109,
    111, 113, 115, 118, 120, 122, 125, 127, 129, 132, 134, 137, 139, 142, 144, 147,
    150, 152, 155, 158, 161, 163, 166, 169, 172, 175, 178, 181, 184, 188, 191, 194,
    197, 201, 204, 207, 211, 214, 218, 221, 225, 229, 232, 236, 240, 244, 248, 255,
];

/// Output gain for a knob position.
#[inline(always)]
pub fn gain(level: u8) -> u8 {
    VOLUME_RAMP[level as usize]
}
