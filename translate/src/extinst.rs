//! GLSL.std.450 extended-instruction-set numbers mapped to the mangled
//! runtime-function names `vkcpu-jit`'s intrinsics table registers under
//! (§4.4 "Extension instructions", supplemented per `SPEC_FULL.md` §2 with
//! the full `GlslFunctions`-equivalent surface, not just the subset §4.6
//! names explicitly).
//!
//! The instruction numbers below are the GLSL.std.450-1.0 extended
//! instruction set's stable enumerant values.
pub fn name_of(instruction: u32) -> &'static str {
    match instruction {
        1 => "Round",
        2 => "RoundEven",
        3 => "Trunc",
        4 => "FAbs",
        5 => "SAbs",
        6 => "FSign",
        7 => "SSign",
        8 => "Floor",
        9 => "Ceil",
        10 => "Fract",
        11 => "Radians",
        12 => "Degrees",
        13 => "Sin",
        14 => "Cos",
        15 => "Tan",
        16 => "Asin",
        17 => "Acos",
        18 => "Atan",
        19 => "Sinh",
        20 => "Cosh",
        21 => "Tanh",
        22 => "Asinh",
        23 => "Acosh",
        24 => "Atanh",
        25 => "Atan2",
        26 => "Pow",
        27 => "Exp",
        28 => "Log",
        29 => "Exp2",
        30 => "Log2",
        31 => "Sqrt",
        32 => "InverseSqrt",
        33 => "Determinant",
        34 => "MatrixInverse",
        37 => "FMin",
        38 => "UMin",
        39 => "SMin",
        40 => "FMax",
        41 => "UMax",
        42 => "SMax",
        43 => "FClamp",
        44 => "UClamp",
        45 => "SClamp",
        46 => "FMix",
        48 => "Step",
        49 => "SmoothStep",
        50 => "Fma",
        53 => "Ldexp",
        54 => "PackSnorm4x8",
        55 => "PackUnorm4x8",
        56 => "PackSnorm2x16",
        57 => "PackUnorm2x16",
        58 => "PackHalf2x16",
        60 => "UnpackSnorm2x16",
        61 => "UnpackUnorm2x16",
        62 => "UnpackHalf2x16",
        63 => "UnpackSnorm4x8",
        64 => "UnpackUnorm4x8",
        66 => "Length",
        67 => "Distance",
        68 => "Cross",
        69 => "Normalize",
        70 => "FaceForward",
        71 => "Reflect",
        72 => "Refract",
        73 => "FindILsb",
        74 => "FindSMsb",
        75 => "FindUMsb",
        other => panic!("unsupported GLSL.std.450 extended instruction {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_named_functions_resolve() {
        for (op, expect) in [
            (37, "FMin"),
            (40, "FMax"),
            (43, "FClamp"),
            (46, "FMix"),
            (26, "Pow"),
            (69, "Normalize"),
            (71, "Reflect"),
            (73, "FindILsb"),
            (74, "FindSMsb"),
            (75, "FindUMsb"),
        ] {
            assert_eq!(name_of(op), expect);
        }
    }
}
