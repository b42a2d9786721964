//! Block-decimating FIR engine, decimation factor fixed at 2.
//!
//! Two instances of [`DecimatingFir`] run in series in the pipeline (15 and
//! 58 taps) to bring the CIC output down to the base sample rate. The delay
//! line persists across frames so filtering is continuous at frame
//! boundaries.
//!
//! The kernel walks the circular delay line with two cursors, "leading" and
//! "lagging", one decimation period apart, computing two output samples per
//! outer pass. That is purely a throughput layout; each output is still the
//! plain convolution of the tap set with the most recent `TAPS` stored
//! samples. Per pass, three raw samples are pushed before the tap loops and
//! one after, consuming four inputs for two outputs.
//!
//! Products are S18Q16 x S16Q15 accumulated at Q31 in an `i64`; each sum is
//! rounded half-up and shifted right by 15 to return to S18Q16. No
//! saturation here -- the two guard bits absorb transient overshoot.

use crate::rnd_shr;

/// Streaming decimate-by-2 FIR over a caller-fixed tap table.
///
/// `DEPTH` must equal `TAPS + 2`: the two extra slots are the slack the
/// two-outputs-per-pass cursor layout needs. Both parameters are explicit
/// because the delay array length cannot be derived from `TAPS` on stable
/// Rust; construction fails to compile if they disagree.
#[derive(Clone)]
pub struct DecimatingFir<const TAPS: usize, const DEPTH: usize> {
    coefs: &'static [i16; TAPS],
    /// Circular delay line; cursor positions are 1-based.
    delay: [i32; DEPTH],
    /// 1-based position of the oldest stored sample, always in `[1, DEPTH]`.
    /// Read at the start of a call, written back at the end, so one frame's
    /// state transition is atomic.
    oldest: usize,
}

impl<const TAPS: usize, const DEPTH: usize> DecimatingFir<TAPS, DEPTH> {
    const DEPTH_MATCHES_TAPS: () = assert!(DEPTH == TAPS + 2, "delay depth must be TAPS + 2");
    const MIN_TAPS: () = assert!(TAPS >= 2, "need at least 2 taps");

    pub const fn new(coefs: &'static [i16; TAPS]) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::DEPTH_MATCHES_TAPS;
        #[allow(clippy::let_unit_value)]
        let _ = Self::MIN_TAPS;
        Self {
            coefs,
            delay: [0; DEPTH],
            oldest: 1,
        }
    }

    /// 1-based position of the oldest stored sample.
    pub fn oldest_index(&self) -> usize {
        self.oldest
    }

    #[inline(always)]
    fn inc_wrap(idx: usize) -> usize {
        if idx == DEPTH {
            1
        } else {
            idx + 1
        }
    }

    #[inline(always)]
    fn dec_wrap(idx: usize) -> usize {
        if idx == 1 {
            DEPTH
        } else {
            idx - 1
        }
    }

    /// Filter and decimate one block, producing `in_samps.len() / 2` output
    /// samples. `in_samps.len()` must be a multiple of 4 (two outputs per
    /// pass at decimation 2).
    pub fn process(&mut self, in_samps: &[i32], out_samps: &mut [i32]) -> usize {
        debug_assert!(in_samps.len() % 4 == 0);
        let num_out = in_samps.len() / 2;
        assert!(out_samps.len() >= num_out);

        let mut lag = self.oldest;
        let mut lead = Self::dec_wrap(lag);

        let mut in_idx = 0;
        let mut out_idx = 0;
        for _ in 0..num_out / 2 {
            // One raw sample lands at the lagging cursor...
            self.delay[lag - 1] = in_samps[in_idx];
            // ...and two at the leading cursor, one decimation period ahead.
            self.delay[lead - 1] = in_samps[in_idx + 1];
            lead = Self::dec_wrap(lead);
            self.delay[lead - 1] = in_samps[in_idx + 2];
            in_idx += 3;

            // Both convolutions walk from their cursor toward older samples.
            // The cursors stay parked on the last tap position: that slot
            // holds the oldest sample, which the next push overwrites.
            let mut acc_lag: i64 = 0;
            let mut acc_lead: i64 = 0;
            for (i, &c) in self.coefs.iter().enumerate() {
                acc_lag += self.delay[lag - 1] as i64 * c as i64;
                acc_lead += self.delay[lead - 1] as i64 * c as i64;
                if i < TAPS - 1 {
                    lag = Self::inc_wrap(lag);
                    lead = Self::inc_wrap(lead);
                }
            }

            // Q31 -> S18Q16, round half-up, truncate; lagging output first
            out_samps[out_idx] = rnd_shr(acc_lag, 15) as i32;
            out_samps[out_idx + 1] = rnd_shr(acc_lead, 15) as i32;
            out_idx += 2;

            // Final raw sample replaces the oldest at the lagging cursor
            self.delay[lag - 1] = in_samps[in_idx];
            in_idx += 1;
            lag = Self::dec_wrap(lag);
        }

        self.oldest = lag;
        num_out
    }
}
