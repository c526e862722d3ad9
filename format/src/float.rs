//! Narrow float formats the pixel codec needs beyond `f32`/`f64`.
//!
//! `half::f16` already gives us a correctly-rounded binary16; the unsigned
//! 10/11/14-bit floats used by packed HDR formats (`B10G11R11_UFLOAT_PACK32`,
//! `E5B9G9R9_UFLOAT_PACK32`'s mantissa lanes) have no crate, so this module
//! implements the same generic truncate/extend algorithm the original
//! driver inherited from LLVM's `compiler-rt` (`CPVulkanBase/FloatFormat.h`):
//! break the source into sign/exponent/significand, reinterpret-shift into
//! the destination layout, round to nearest with ties-to-even.
pub use half::f16 as Half;

/// Round-to-nearest-even truncation of an IEEE-754 `f32` bit pattern into an
/// unsigned (no sign bit) float with the given exponent/mantissa widths.
/// Used for the `UFloat` channels of packed HDR formats.
pub fn truncate_unsigned(bits: u32, exponent_bits: u32, mantissa_bits: u32) -> u16 {
    const SRC_SIG_BITS: u32 = 23;
    const SRC_EXP_BITS: u32 = 8;
    let src_exp_bias = (1u32 << SRC_EXP_BITS) / 2 - 1;
    let src_inf_exp = (1u32 << SRC_EXP_BITS) - 1;

    let dst_exp_bias = (1u32 << exponent_bits) / 2 - 1;
    let dst_inf_exp = (1u32 << exponent_bits) - 1;

    let src_min_normal = 1u32 << SRC_SIG_BITS;
    let src_significand_mask = src_min_normal - 1;
    let src_infinity = src_inf_exp << SRC_SIG_BITS;
    let src_sign_mask = 1u32 << (SRC_SIG_BITS + SRC_EXP_BITS);
    let src_abs_mask = src_sign_mask - 1;
    let round_mask = (1u32 << (SRC_SIG_BITS - mantissa_bits)) - 1;
    let halfway = 1u32 << (SRC_SIG_BITS - mantissa_bits - 1);
    let src_qnan = 1u32 << (SRC_SIG_BITS - 1);
    let src_nan_code = src_qnan - 1;

    let underflow_exponent = src_exp_bias + 1 - dst_exp_bias;
    let overflow_exponent = src_exp_bias + dst_inf_exp - dst_exp_bias;
    let underflow = underflow_exponent << SRC_SIG_BITS;
    let overflow = overflow_exponent << SRC_SIG_BITS;

    let dst_qnan = 1u16 << (mantissa_bits - 1);
    let dst_nan_code = dst_qnan - 1;

    let a_abs = bits & src_abs_mask;
    // unsigned destination: any negative input flushes to zero, matching
    // the convention used for the RGB lanes of packed HDR formats.
    if bits & src_sign_mask != 0 {
        return 0;
    }

    let abs_result: u16;
    if a_abs.wrapping_sub(underflow) < a_abs.wrapping_sub(overflow) {
        let mut result = (a_abs >> (SRC_SIG_BITS - mantissa_bits)) as u16;
        result = result.wrapping_sub(((src_exp_bias - dst_exp_bias) << mantissa_bits) as u16);
        let round_bits = a_abs & round_mask;
        if round_bits > halfway {
            result = result.wrapping_add(1);
        } else if round_bits == halfway {
            result = result.wrapping_add(result & 1);
        }
        abs_result = result;
    } else if a_abs > src_infinity {
        let mut result = (dst_inf_exp as u16) << mantissa_bits;
        result |= dst_qnan;
        result |= (((a_abs & src_nan_code) >> (SRC_SIG_BITS - mantissa_bits)) as u16) & dst_nan_code;
        abs_result = result;
    } else if a_abs >= overflow {
        abs_result = (dst_inf_exp as u16) << mantissa_bits;
    } else {
        let a_exp = a_abs >> SRC_SIG_BITS;
        let shift = src_exp_bias as i32 - dst_exp_bias as i32 - a_exp as i32 + 1;
        let significand = (bits & src_significand_mask) | src_min_normal;
        if shift > SRC_SIG_BITS as i32 || shift < 0 {
            abs_result = 0;
        } else {
            let shift = shift as u32;
            let sticky = if shift < 32 && (significand << (32 - shift)) != 0 { 1 } else { 0 };
            let denorm = (significand >> shift) | sticky;
            let mut result = (denorm >> (SRC_SIG_BITS - mantissa_bits)) as u16;
            let round_bits = denorm & round_mask;
            if round_bits > halfway {
                result = result.wrapping_add(1);
            } else if round_bits == halfway {
                result = result.wrapping_add(result & 1);
            }
            abs_result = result;
        }
    }
    abs_result
}

/// Extend an unsigned narrow float (as produced by `truncate_unsigned`) back
/// to an `f32` bit pattern.
pub fn extend_unsigned(value: u16, exponent_bits: u32, mantissa_bits: u32) -> u32 {
    const DST_SIG_BITS: u32 = 23;
    const DST_EXP_BITS: u32 = 8;
    let dst_exp_bias = (1u32 << DST_EXP_BITS) / 2 - 1;
    let dst_inf_exp = (1u32 << DST_EXP_BITS) - 1;

    let src_exp_bias = (1u32 << exponent_bits) / 2 - 1;
    let src_inf_exp = (1u32 << exponent_bits) - 1;

    let src_min_normal = 1u32 << mantissa_bits;
    let src_infinity = src_inf_exp << mantissa_bits;
    let src_abs_mask = (1u32 << (mantissa_bits + exponent_bits)) - 1;
    let src_qnan = 1u32 << (mantissa_bits - 1);
    let src_nan_code = src_qnan - 1;
    let dst_min_normal = 1u32 << DST_SIG_BITS;

    let a_abs = (value as u32) & src_abs_mask;

    if a_abs.wrapping_sub(src_min_normal) < src_infinity.wrapping_sub(src_min_normal) {
        let mut result = a_abs << (DST_SIG_BITS - mantissa_bits);
        result += (dst_exp_bias - src_exp_bias) << DST_SIG_BITS;
        result
    } else if a_abs >= src_infinity {
        let mut result = dst_inf_exp << DST_SIG_BITS;
        result |= (a_abs & src_qnan) << (DST_SIG_BITS - mantissa_bits);
        result |= (a_abs & src_nan_code) << (DST_SIG_BITS - mantissa_bits);
        result
    } else if a_abs != 0 {
        let scale = a_abs.leading_zeros() as i32 - src_min_normal.leading_zeros() as i32;
        let mut result = a_abs << (DST_SIG_BITS as i32 - mantissa_bits as i32 + scale) as u32;
        result ^= dst_min_normal;
        let result_exponent = dst_exp_bias as i32 - src_exp_bias as i32 - scale + 1;
        result |= (result_exponent as u32) << DST_SIG_BITS;
        result
    } else {
        0
    }
}

macro_rules! unsigned_float {
    ($name:ident, $exp_bits:expr, $mant_bits:expr) => {
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
        pub struct $name(pub u16);

        impl $name {
            pub fn from_f32(value: f32) -> $name {
                $name(truncate_unsigned(value.to_bits(), $exp_bits, $mant_bits))
            }

            pub fn to_f32(self) -> f32 {
                f32::from_bits(extend_unsigned(self.0, $exp_bits, $mant_bits))
            }
        }
    };
}

unsigned_float!(Uf10, 5, 5);
unsigned_float!(Uf11, 5, 6);
unsigned_float!(Uf14, 5, 9);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_float_roundtrips_exact_values() {
        for exact in [0.0f32, 1.0, 2.0, 0.5, 4.0, 8.0] {
            let uf = Uf11::from_f32(exact);
            assert_eq!(uf.to_f32(), exact, "value {} did not round-trip", exact);
        }
    }

    #[test]
    fn unsigned_float_flushes_negative_to_zero() {
        assert_eq!(Uf10::from_f32(-1.0).to_f32(), 0.0);
    }

    #[test]
    fn half_roundtrips_through_f32() {
        let h = Half::from_f32(1.5);
        assert_eq!(h.to_f32(), 1.5);
    }
}
