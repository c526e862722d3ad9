//! The process-global runtime intrinsics table (§4.6 "C6"): every name a
//! compiled shader module's externs can resolve against, built once and
//! shared by every `JitHost` in the process.
use fxhash::FxHashMap;
use lazy_static::lazy_static;

use crate::{codec, image, math};

lazy_static! {
    static ref TABLE: FxHashMap<String, usize> = {
        let mut table = FxHashMap::default();
        math::build(&mut table);
        image::build(&mut table);
        codec::build(&mut table);
        table
    };
}

/// Resolves a mangled runtime intrinsic name to its function pointer, or
/// `None` if nothing in `math`/`image`/`codec` registered it — the caller
/// falls through to platform dynamic symbols next (`host::resolve_symbol`).
pub fn lookup(name: &str) -> Option<*const u8> {
    TABLE.get(name).map(|ptr| *ptr as *const u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_math_intrinsic() {
        assert!(lookup("@FMin.F32[4].F32[4]").is_some());
    }

    #[test]
    fn resolves_an_image_intrinsic() {
        assert!(lookup("@ImageFetch.I32[2].Float").is_some());
    }

    #[test]
    fn resolves_a_codec_intrinsic() {
        assert!(lookup("@FormatCodec.getF32.R8G8B8A8_UNORM").is_some());
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        assert!(lookup("@NotARealIntrinsic").is_none());
    }
}
