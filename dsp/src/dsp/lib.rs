#![cfg_attr(not(feature = "std"), no_std)]

//! Fixed-point front-end for a two-channel digital (PDM) microphone.
//!
//! Converts the packed 1-bit stream delivered by the serial-audio DMA into
//! gain-adjusted 16-bit PCM, entirely in integer arithmetic: a decimate-by-16
//! CIC, two decimate-by-2 FIR stages, an optional biquad cascade and a final
//! digital gain with saturation. Every stage carries its filter state across
//! frames, so a [`pipeline::Pipeline`] can be fed one capture frame at a time.
//!
//! Sample data is S18Q16 in an `i32` (16 fractional bits, two guard bits over
//! the nominal 16-bit audio range), coefficients are S16Q15 in an `i16`, and
//! intermediate sums are kept in an `i64` standing in for the DSP's 40-bit
//! accumulator.

pub mod cic;
pub mod config;
pub mod fir;
pub mod gain;
pub mod iir;
pub mod pipeline;

/// Round-half-up quantizer used at every stage boundary: add the half-LSB
/// bias, then arithmetic-shift right. The bias is unconditional, so exact
/// ties round toward +infinity for negative accumulators too. This matches
/// the reference hardware and must not be made symmetric.
#[inline(always)]
pub(crate) fn rnd_shr(acc: i64, shift: u32) -> i64 {
    (acc + (1i64 << (shift - 1))) >> shift
}
