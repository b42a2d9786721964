//! Per-frame driver for the full capture chain.
//!
//! A [`Pipeline`] owns every stage instance and every intermediate frame
//! buffer: construct it once at startup and call
//! [`Pipeline::process_frame`] with each completed DMA frame. Processing is
//! single-threaded and non-reentrant; a frame is either fully applied to the
//! filter state or not started, and the caller must not hand over a buffer
//! the capture hardware is still writing.

use log::{debug, trace};

use crate::cic::CicDecimator;
use crate::config::{
    CIC_OUT_FRAME_LEN, DIGGAIN_OUT_FRAME_LEN, FIR1_COEFS, FIR1_NUM_COEFS, FIR1_OUT_FRAME_LEN,
    FIR2_COEFS, FIR2_NUM_COEFS, FIR2_OUT_FRAME_LEN, IN_FRAME_WORDS_PER_CH,
};
use crate::fir::DecimatingFir;
use crate::gain::apply_digital_gain;
use crate::iir::{BiquadCascadeDf1, BiquadCascadeDf2};

/// FIR stage 1 as configured for the capture chain.
pub type Fir1 = DecimatingFir<FIR1_NUM_COEFS, { FIR1_NUM_COEFS + 2 }>;
/// FIR stage 2 as configured for the capture chain.
pub type Fir2 = DecimatingFir<FIR2_NUM_COEFS, { FIR2_NUM_COEFS + 2 }>;

/// Block filter seam for the optional conditioning slot between FIR2 and
/// the digital gain.
pub trait SampleFilter {
    /// Filter one block; `out_samps` must be at least `in_samps.len()`.
    fn process_block(&mut self, in_samps: &[i32], out_samps: &mut [i32]);
}

impl<const SECTIONS: usize> SampleFilter for BiquadCascadeDf1<SECTIONS> {
    fn process_block(&mut self, in_samps: &[i32], out_samps: &mut [i32]) {
        self.process(in_samps, out_samps);
    }
}

impl<const SECTIONS: usize> SampleFilter for BiquadCascadeDf2<SECTIONS> {
    fn process_block(&mut self, in_samps: &[i32], out_samps: &mut [i32]) {
        self.process(in_samps, out_samps);
    }
}

/// No-op conditioning: passes FIR2 output straight to the gain stage.
pub struct Bypass;

impl SampleFilter for Bypass {
    fn process_block(&mut self, in_samps: &[i32], out_samps: &mut [i32]) {
        out_samps[..in_samps.len()].copy_from_slice(in_samps);
    }
}

/// The complete front-end: CIC -> FIR1 -> FIR2 -> conditioning -> gain.
pub struct Pipeline<F: SampleFilter = Bypass> {
    cic: CicDecimator,
    fir1: Fir1,
    fir2: Fir2,
    conditioning: F,
    diggain: u16,
    frames_processed: u32,
    cic_frame: [i32; CIC_OUT_FRAME_LEN],
    fir1_frame: [i32; FIR1_OUT_FRAME_LEN],
    fir2_frame: [i32; FIR2_OUT_FRAME_LEN],
    cond_frame: [i32; FIR2_OUT_FRAME_LEN],
}

impl Pipeline<Bypass> {
    /// Pipeline without the conditioning stage (the stock capture
    /// configuration).
    pub fn new(diggain: u16) -> Self {
        Self::with_conditioning(Bypass, diggain)
    }
}

impl<F: SampleFilter> Pipeline<F> {
    pub fn with_conditioning(conditioning: F, diggain: u16) -> Self {
        debug!(
            "pipeline: {} words/ch/frame, fir {}+{} taps, diggain {}/256",
            IN_FRAME_WORDS_PER_CH, FIR1_NUM_COEFS, FIR2_NUM_COEFS, diggain
        );
        Self {
            cic: CicDecimator::new(),
            fir1: Fir1::new(&FIR1_COEFS),
            fir2: Fir2::new(&FIR2_COEFS),
            conditioning,
            diggain,
            frames_processed: 0,
            cic_frame: [0; CIC_OUT_FRAME_LEN],
            fir1_frame: [0; FIR1_OUT_FRAME_LEN],
            fir2_frame: [0; FIR2_OUT_FRAME_LEN],
            cond_frame: [0; FIR2_OUT_FRAME_LEN],
        }
    }

    /// Run one complete capture frame through the chain.
    ///
    /// Buffer lengths are fixed by the array types, so the decimation
    /// bookkeeping (320 word pairs -> 1280 -> 640 -> 320 samples) cannot
    /// drift out of step with the configuration.
    pub fn process_frame(
        &mut self,
        left: &[u32; IN_FRAME_WORDS_PER_CH],
        right: &[u32; IN_FRAME_WORDS_PER_CH],
        out_samps: &mut [i16; DIGGAIN_OUT_FRAME_LEN],
    ) {
        self.cic.process_words(left, right, &mut self.cic_frame);
        self.fir1.process(&self.cic_frame, &mut self.fir1_frame);
        self.fir2.process(&self.fir1_frame, &mut self.fir2_frame);
        self.conditioning
            .process_block(&self.fir2_frame, &mut self.cond_frame);
        apply_digital_gain(&self.cond_frame, self.diggain, out_samps);

        self.frames_processed = self.frames_processed.wrapping_add(1);
        trace!("frame {} done", self.frames_processed);
    }

    /// Frames run through the pipeline since construction.
    pub fn frames_processed(&self) -> u32 {
        self.frames_processed
    }

    pub fn diggain(&self) -> u16 {
        self.diggain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_DIGGAIN, UNITY_DIGGAIN};
    use crate::iir::BiquadCoefs;

    const ZEROS: [u32; IN_FRAME_WORDS_PER_CH] = [0; IN_FRAME_WORDS_PER_CH];
    const ONES: [u32; IN_FRAME_WORDS_PER_CH] = [0xFFFF_FFFF; IN_FRAME_WORDS_PER_CH];

    #[test]
    fn frame_counter_advances() {
        let mut p = Pipeline::new(DEFAULT_DIGGAIN);
        let mut out = [0i16; DIGGAIN_OUT_FRAME_LEN];
        assert_eq!(p.frames_processed(), 0);
        p.process_frame(&ZEROS, &ZEROS, &mut out);
        p.process_frame(&ZEROS, &ZEROS, &mut out);
        assert_eq!(p.frames_processed(), 2);
    }

    #[test]
    fn dc_one_input_saturates_positive() {
        // Constant +1 PDM reaches the CIC's full DC gain (1.0 in S18Q16);
        // any gain >= 1.0 must clip the terminal stage at +full-scale.
        let mut p = Pipeline::new(UNITY_DIGGAIN);
        let mut out = [0i16; DIGGAIN_OUT_FRAME_LEN];
        p.process_frame(&ONES, &ONES, &mut out);
        p.process_frame(&ONES, &ONES, &mut out);
        assert!(out.iter().all(|&s| s == 32767), "settled DC must clip high");
    }

    #[test]
    fn dc_zero_input_saturates_negative() {
        let mut p = Pipeline::new(UNITY_DIGGAIN);
        let mut out = [0i16; DIGGAIN_OUT_FRAME_LEN];
        p.process_frame(&ZEROS, &ZEROS, &mut out);
        p.process_frame(&ZEROS, &ZEROS, &mut out);
        assert!(out.iter().all(|&s| s == -32768), "settled DC must clip low");
    }

    #[test]
    fn pipelines_are_deterministic() {
        let left: [u32; IN_FRAME_WORDS_PER_CH] =
            core::array::from_fn(|i| (i as u32).wrapping_mul(0x9E37_79B9));
        let right: [u32; IN_FRAME_WORDS_PER_CH] =
            core::array::from_fn(|i| (i as u32).wrapping_mul(0x85EB_CA6B) ^ 0xFFFF);
        let mut a = Pipeline::new(DEFAULT_DIGGAIN);
        let mut b = Pipeline::new(DEFAULT_DIGGAIN);
        let mut out_a = [0i16; DIGGAIN_OUT_FRAME_LEN];
        let mut out_b = [0i16; DIGGAIN_OUT_FRAME_LEN];
        for _ in 0..3 {
            a.process_frame(&left, &right, &mut out_a);
            b.process_frame(&left, &right, &mut out_b);
            assert_eq!(out_a[..], out_b[..]);
        }
    }

    #[test]
    fn conditioning_slot_accepts_a_biquad_cascade() {
        static FLAT: [BiquadCoefs; 1] = [BiquadCoefs {
            a1: 0,
            a2: 0,
            b0: 1 << 14,
            b1: 0,
            b2: 0,
        }];
        // G = 0.5 and b0 = 0.5 give a net 0.25x ahead of the gain stage
        let iir = crate::iir::BiquadCascadeDf2::new(&FLAT, 0x8000, 0);
        let mut conditioned = Pipeline::with_conditioning(iir, UNITY_DIGGAIN);
        let mut plain = Pipeline::new(UNITY_DIGGAIN);

        let left: [u32; IN_FRAME_WORDS_PER_CH] =
            core::array::from_fn(|i| if i % 3 == 0 { 0xF0F0_F0F0 } else { 0x0F0F_0F0F });
        let mut out_c = [0i16; DIGGAIN_OUT_FRAME_LEN];
        let mut out_p = [0i16; DIGGAIN_OUT_FRAME_LEN];
        conditioned.process_frame(&left, &left, &mut out_c);
        plain.process_frame(&left, &left, &mut out_p);

        // attenuated path stays within a rounding step of out/4
        for (i, (&c, &p)) in out_c.iter().zip(out_p.iter()).enumerate() {
            let expect = p as i32 / 4;
            assert!(
                (c as i32 - expect).abs() <= 3,
                "sample {i}: conditioned {c} vs {expect}"
            );
        }
    }
}
