//! Build-time configuration of the capture front-end.
//!
//! Everything here is fixed by the hardware clocking (1.024 MHz PDM bit
//! clock shared by two microphones, 20 ms capture frames) and by the filter
//! designs baked into the reference front-end. Nothing is negotiated at
//! runtime.

use crate::cic::CIC_DECIMATION;

/// 1-bit samples per millisecond across both channels at a 1.024 MHz bit
/// clock.
pub const NUM_INSAMP_PER_MS: usize = 1024;
/// Capture frame duration.
pub const NUM_MS_PER_FRAME: usize = 20;

/// Packed 32-bit input words per channel per frame.
pub const IN_FRAME_WORDS_PER_CH: usize = NUM_INSAMP_PER_MS / 32 / 2 * NUM_MS_PER_FRAME;

/// FIR1/FIR2 decimation factor.
pub const FIR_DECIMATION: usize = 2;

/// CIC output samples per frame (both channels, hardware word order).
pub const CIC_OUT_FRAME_LEN: usize = NUM_INSAMP_PER_MS * NUM_MS_PER_FRAME / CIC_DECIMATION;
/// FIR stage 1 output samples per frame.
pub const FIR1_OUT_FRAME_LEN: usize = CIC_OUT_FRAME_LEN / FIR_DECIMATION;
/// FIR stage 2 output samples per frame.
pub const FIR2_OUT_FRAME_LEN: usize = FIR1_OUT_FRAME_LEN / FIR_DECIMATION;
/// PCM samples per frame after the digital gain stage.
pub const DIGGAIN_OUT_FRAME_LEN: usize = FIR2_OUT_FRAME_LEN;

/// Output sample rate, for file export.
pub const OUT_SAMPLE_RATE_HZ: u32 = (DIGGAIN_OUT_FRAME_LEN * 1000 / NUM_MS_PER_FRAME) as u32;

pub const FIR1_NUM_COEFS: usize = 15;
pub const FIR2_NUM_COEFS: usize = 58;

/// FIR stage 1 tap table (S16Q15), halfband-style lowpass.
pub static FIR1_COEFS: [i16; FIR1_NUM_COEFS] = [
    -98, 0, 609, 0, -2288, 0, 9968, 16386, 9968, 0, -2288, 0, 609, 0, -98,
];

/// FIR stage 2 tap table (S16Q15), final anti-alias lowpass.
pub static FIR2_COEFS: [i16; FIR2_NUM_COEFS] = [
    -4, 2, 10, -3, -27, -2, 51, 15, -89, -50, 135, 114, -185, -222, 226, 386, -241, -623, 198,
    947, -56, -1396, -266, 2043, 959, -3164, -2809, 6281, 16481, 16481, 6281, -2809, -3164, 959,
    2043, -266, -1396, -56, 947, 198, -623, -241, 386, 226, -222, -185, 114, 135, -50, -89, 15,
    51, -2, -27, -3, 10, 2, -4,
];

/// 1.0 (0 dB) in U16Q8.
pub const UNITY_DIGGAIN: u16 = 1 << 8;
/// Default digital gain, 10.0 (+20 dB) in U16Q8.
pub const DEFAULT_DIGGAIN: u16 = 10 << 8;
