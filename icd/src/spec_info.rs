//! Parses the wire format of a `VkSpecializationInfo` blob (§6
//! "Specialisation-info blob") into `vkcpu_translate::constants::SpecializationInfo`:
//!
//! ```text
//! entry_count: u32
//! entries: [(spec_id: u32, offset: u32, size: u32); entry_count]
//! data_size: u32
//! data: [u8; data_size]
//! ```
//!
//! all fields little-endian, matching the rest of the SPIR-V module bytes
//! this blob rides alongside.
use vkcpu_translate::constants::SpecializationInfo;

/// Reads a spec-info blob starting at `ptr` with byte length `len`.
///
/// # Safety
/// `ptr` must be valid for reads of `len` bytes, or both null/zero (an
/// absent `pSpecializationInfo`, which yields an empty `SpecializationInfo`).
pub unsafe fn parse(ptr: *const u8, len: usize) -> SpecializationInfo {
    if ptr.is_null() || len == 0 {
        return SpecializationInfo { entries: Vec::new(), data: Vec::new() };
    }
    let bytes = std::slice::from_raw_parts(ptr, len);
    parse_bytes(bytes)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().expect("4-byte slice"))
}

fn parse_bytes(bytes: &[u8]) -> SpecializationInfo {
    let mut cursor = 0usize;
    let entry_count = read_u32(bytes, cursor) as usize;
    cursor += 4;

    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let spec_id = read_u32(bytes, cursor);
        let offset = read_u32(bytes, cursor + 4);
        let size = read_u32(bytes, cursor + 8);
        entries.push((spec_id, offset, size));
        cursor += 12;
    }

    let data_size = read_u32(bytes, cursor) as usize;
    cursor += 4;
    let data = bytes[cursor..cursor + data_size].to_vec();

    SpecializationInfo { entries, data }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(entries: &[(u32, u32, u32)], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(entries.len() as u32).to_le_bytes());
        for &(id, off, size) in entries {
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&off.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
        }
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn roundtrips_a_hand_built_blob() {
        let data = [7u32.to_le_bytes(), 9u32.to_le_bytes()].concat();
        let blob = encode(&[(0, 0, 4), (1, 4, 4)], &data);
        let parsed = unsafe { parse(blob.as_ptr(), blob.len()) };
        assert_eq!(parsed.entries, vec![(0, 0, 4), (1, 4, 4)]);
        assert_eq!(parsed.data, data);
    }

    #[test]
    fn null_pointer_yields_an_empty_info() {
        let parsed = unsafe { parse(std::ptr::null(), 0) };
        assert!(parsed.entries.is_empty());
        assert!(parsed.data.is_empty());
    }
}
