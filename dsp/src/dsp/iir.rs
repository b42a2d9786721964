//! Optional conditioning stage: a cascade of second-order IIR sections in
//! Direct Form I or Direct Form II.
//!
//! Both realizations implement the same transfer function but round at
//! different points, so their outputs agree only to within a small
//! fixed-point error bound -- they are deliberately kept as two distinct
//! types rather than a runtime switch.
//!
//! Coefficients are stored as S16Q15 words but interpreted with an
//! additional integer wordlength `coef_iwl`: each coefficient is effectively
//! S16Q(15 - iwl), which widens the representable gain range without
//! changing the 16-bit storage. The accumulator left-shifts are derived from
//! `coef_iwl`, so retuning coefficient scaling needs no code change.
//!
//! An unsigned U16Q16 input gain is applied ahead of the first section. No
//! saturation is performed anywhere in this stage; the S18Q16 guard bits are
//! assumed to provide the headroom.

use crate::rnd_shr;

/// Coefficients for one biquad section, S16Q(15 - iwl).
///
/// `y(n) = b0*x(n) + b1*x(n-1) + b2*x(n-2) - a1*y(n-1) - a2*y(n-2)`
///
/// Five independent words per section; the two forms consume them in
/// different orders internally, which named fields make irrelevant.
#[derive(Clone, Copy, Debug)]
pub struct BiquadCoefs {
    pub a1: i16,
    pub a2: i16,
    pub b0: i16,
    pub b1: i16,
    pub b2: i16,
}

#[derive(Clone, Copy, Default)]
struct Df2Delay {
    /// d(n-1)
    d1: i32,
    /// d(n-2)
    d2: i32,
}

/// Direct Form II cascade: two shared delay words per section.
///
/// Per section, `d(n) = x(n) - a1*d(n-1) - a2*d(n-2)` followed by
/// `y(n) = b0*d(n) + b1*d(n-1) + b2*d(n-2)`. The accumulator carries Q32
/// between sections; `d(n)` is quantized back to S18Q16 when stored.
#[derive(Clone)]
pub struct BiquadCascadeDf2<const SECTIONS: usize> {
    coefs: &'static [BiquadCoefs; SECTIONS],
    delay: [Df2Delay; SECTIONS],
    /// U16Q16 gain applied to x(n) before the first section.
    in_gain: u16,
    coef_iwl: u32,
}

impl<const SECTIONS: usize> BiquadCascadeDf2<SECTIONS> {
    const AT_LEAST_ONE_SECTION: () = assert!(SECTIONS >= 1);

    pub const fn new(coefs: &'static [BiquadCoefs; SECTIONS], in_gain: u16, coef_iwl: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::AT_LEAST_ONE_SECTION;
        Self {
            coefs,
            delay: [Df2Delay { d1: 0, d2: 0 }; SECTIONS],
            in_gain,
            coef_iwl,
        }
    }

    pub fn process(&mut self, in_samps: &[i32], out_samps: &mut [i32]) {
        assert!(out_samps.len() >= in_samps.len());
        // S18Q16 x S16Q(15-iwl) products sit at Q(31-iwl); one extra bit
        // aligns them to the Q32 accumulator opened by the U16Q16 gain.
        let shift = 1 + self.coef_iwl;

        for (x, y) in in_samps.iter().zip(out_samps.iter_mut()) {
            // acc = G * x(n), S18Q16 * U16Q16 = Q32
            let mut acc = *x as i64 * self.in_gain as i64;

            for (sec, c) in self.delay.iter_mut().zip(self.coefs.iter()) {
                // d(n) = x(n) - a1*d(n-1) - a2*d(n-2)
                acc -= (sec.d1 as i64 * c.a1 as i64) << shift;
                acc -= (sec.d2 as i64 * c.a2 as i64) << shift;
                let dn = rnd_shr(acc, 16) as i32; // Q32 -> S18Q16

                // y(n) = b0*d(n) + b1*d(n-1) + b2*d(n-2), rebuilt at Q32
                acc = (sec.d2 as i64 * c.b2 as i64) << shift;
                acc += (dn as i64 * c.b0 as i64) << shift;
                acc += (sec.d1 as i64 * c.b1 as i64) << shift;

                sec.d2 = sec.d1;
                sec.d1 = dn;
            }

            *y = rnd_shr(acc, 16) as i32;
        }
    }

    pub fn reset(&mut self) {
        self.delay = [Df2Delay::default(); SECTIONS];
    }
}

#[derive(Clone, Copy, Default)]
struct Df1Delay {
    /// x(n-1)
    x1: i32,
    /// x(n-2)
    x2: i32,
    /// y(n-1)
    y1: i32,
    /// y(n-2)
    y2: i32,
}

/// Direct Form I cascade: separate feed-forward and feedback delay words
/// per section. Rounds the gained input to S18Q16 before the first section
/// and each section output back to S18Q16, so its quantization noise
/// profile differs from Direct Form II.
#[derive(Clone)]
pub struct BiquadCascadeDf1<const SECTIONS: usize> {
    coefs: &'static [BiquadCoefs; SECTIONS],
    delay: [Df1Delay; SECTIONS],
    in_gain: u16,
    coef_iwl: u32,
}

impl<const SECTIONS: usize> BiquadCascadeDf1<SECTIONS> {
    const AT_LEAST_ONE_SECTION: () = assert!(SECTIONS >= 1);

    pub const fn new(coefs: &'static [BiquadCoefs; SECTIONS], in_gain: u16, coef_iwl: u32) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::AT_LEAST_ONE_SECTION;
        Self {
            coefs,
            delay: [Df1Delay {
                x1: 0,
                x2: 0,
                y1: 0,
                y2: 0,
            }; SECTIONS],
            in_gain,
            coef_iwl,
        }
    }

    pub fn process(&mut self, in_samps: &[i32], out_samps: &mut [i32]) {
        assert!(out_samps.len() >= in_samps.len());
        // Here the accumulator sits at Q(31 - iwl) + iwl = Q31
        let shift = self.coef_iwl;

        for (x, y) in in_samps.iter().zip(out_samps.iter_mut()) {
            // G*x(n) at Q32, immediately quantized to an S18Q16 working
            // sample -- the form-I structure feeds a stored x into the taps
            let acc = *x as i64 * self.in_gain as i64;
            let mut t = rnd_shr(acc, 16) as i32;

            for (sec, c) in self.delay.iter_mut().zip(self.coefs.iter()) {
                let mut acc = (t as i64 * c.b0 as i64) << shift;
                acc += (sec.x1 as i64 * c.b1 as i64) << shift;
                acc += (sec.x2 as i64 * c.b2 as i64) << shift;
                sec.x2 = sec.x1;
                sec.x1 = t;

                acc -= (sec.y1 as i64 * c.a1 as i64) << shift;
                acc -= (sec.y2 as i64 * c.a2 as i64) << shift;
                let out = rnd_shr(acc, 15) as i32; // Q31 -> S18Q16
                sec.y2 = sec.y1;
                sec.y1 = out;
                t = out;
            }

            *y = t;
        }
    }

    pub fn reset(&mut self) {
        self.delay = [Df1Delay::default(); SECTIONS];
    }
}
