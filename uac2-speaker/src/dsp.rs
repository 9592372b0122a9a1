//! Software gain for little-endian PCM.
//!
//! The device normally hands the gain to the I2S driver, which scales in
//! hardware. These helpers do the same on the CPU for sinks that have no
//! hardware volume (host simulation, tests, boards driving a plain DAC).

/// Scale one sample by `gain / 255`. 255 is unity, 0 is silence.
#[inline(always)]
pub fn scale_sample(sample: i32, gain: u8) -> i32 {
    if gain == u8::MAX {
        return sample;
    }
    // |sample * gain / 255| <= |sample|, so this cannot overflow
    ((sample as i64 * gain as i64) / 255) as i32
}

/// Scale packed little-endian samples in place.
///
/// `subslot` is the container size in bytes: 2 for 16-bit formats, 4 for
/// 24/32-bit formats. A trailing partial sample is left untouched.
pub fn scale_pcm(data: &mut [u8], subslot: usize, gain: u8) {
    if gain == u8::MAX {
        return;
    }
    match subslot {
        2 => {
            for chunk in data.chunks_exact_mut(2) {
                let s = i16::from_le_bytes([chunk[0], chunk[1]]) as i32;
                let out = scale_sample(s, gain) as i16;
                chunk.copy_from_slice(&out.to_le_bytes());
            }
        }
        4 => {
            for chunk in data.chunks_exact_mut(4) {
                let s = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                chunk.copy_from_slice(&scale_sample(s, gain).to_le_bytes());
            }
        }
        _ => debug_assert!(false, "unsupported subslot size {}", subslot),
    }
}
