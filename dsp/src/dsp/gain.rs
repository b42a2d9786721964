//! Terminal digital gain and saturation stage.
//!
//! Scales S18Q16 samples by an unsigned U16Q8 gain, rounds, truncates to
//! Q15 and hard-clamps to the signed 16-bit range. This is the only stage
//! in the chain that saturates: anything upstream relies on the S18Q16
//! guard bits, but past this point overshoot has nowhere to go and must
//! clip rather than wrap.

use crate::rnd_shr;

/// Apply digital gain to one block, saturating into `out_samps` (S16Q15).
///
/// Panics if `out_samps` is shorter than `in_samps`.
pub fn apply_digital_gain(in_samps: &[i32], diggain: u16, out_samps: &mut [i16]) {
    assert!(out_samps.len() >= in_samps.len());

    for (x, y) in in_samps.iter().zip(out_samps.iter_mut()) {
        // S18Q16 * U16Q8 = S34Q24, held in the wide accumulator
        let acc = *x as i64 * diggain as i64;
        // Q24 -> Q15, round half-up, then clamp instead of wrapping
        *y = rnd_shr(acc, 9).clamp(i16::MIN as i64, i16::MAX as i64) as i16;
    }
}
