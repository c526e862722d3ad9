//! Decoration queries.
//!
//! The translator needs the layout a shader compiler already baked into the
//! module (explicit `Offset`/`ArrayStride`/`MatrixStride`), not a
//! recomputed std140 layout — unlike the teacher's `spirv::layout`, which
//! only ever consumed modules it could assume were std140-conformant, this
//! driver has to honour whatever offsets the real compiler emitted, because
//! a conformant Vulkan driver is not allowed to relayout host-visible
//! buffers.
use crate::inst::Instruction;
use crate::Module;
use fxhash::FxHashMap as HashMap;
use spirv_headers::{BuiltIn, Decoration};

/// A single decoration attached to a result id (`OpDecorate`) or a member
/// of a struct type (`OpMemberDecorate`), reduced to the fields the
/// translator actually reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDecoration {
    Block,
    BufferBlock,
    RowMajor,
    ColMajor,
    ArrayStride(u32),
    MatrixStride(u32),
    Offset(u32),
    BuiltIn(BuiltIn),
    Location(u32),
    Component(u32),
    Index(u32),
    Binding(u32),
    DescriptorSet(u32),
    SpecId(u32),
    RelaxedPrecision,
    NonWritable,
    NonReadable,
    Other(Decoration),
}

fn parse_one(decoration: Decoration, params: &[u32]) -> ParsedDecoration {
    match decoration {
        Decoration::Block => ParsedDecoration::Block,
        Decoration::BufferBlock => ParsedDecoration::BufferBlock,
        Decoration::RowMajor => ParsedDecoration::RowMajor,
        Decoration::ColMajor => ParsedDecoration::ColMajor,
        Decoration::ArrayStride => ParsedDecoration::ArrayStride(params[0]),
        Decoration::MatrixStride => ParsedDecoration::MatrixStride(params[0]),
        Decoration::Offset => ParsedDecoration::Offset(params[0]),
        Decoration::BuiltIn => ParsedDecoration::BuiltIn(
            num_traits::FromPrimitive::from_u32(params[0]).unwrap_or_else(|| panic!("unknown BuiltIn {}", params[0])),
        ),
        Decoration::Location => ParsedDecoration::Location(params[0]),
        Decoration::Component => ParsedDecoration::Component(params[0]),
        Decoration::Index => ParsedDecoration::Index(params[0]),
        Decoration::Binding => ParsedDecoration::Binding(params[0]),
        Decoration::DescriptorSet => ParsedDecoration::DescriptorSet(params[0]),
        Decoration::SpecId => ParsedDecoration::SpecId(params[0]),
        Decoration::RelaxedPrecision => ParsedDecoration::RelaxedPrecision,
        Decoration::NonWritable => ParsedDecoration::NonWritable,
        Decoration::NonReadable => ParsedDecoration::NonReadable,
        other => ParsedDecoration::Other(other),
    }
}

/// All decorations in a module, indexed by target id and, for member
/// decorations, additionally by member index.
pub struct DecorationTable {
    on_id: HashMap<u32, Vec<ParsedDecoration>>,
    on_member: HashMap<(u32, u32), Vec<ParsedDecoration>>,
}

impl DecorationTable {
    pub fn build(module: &Module) -> DecorationTable {
        let mut on_id: HashMap<u32, Vec<ParsedDecoration>> = HashMap::default();
        let mut on_member: HashMap<(u32, u32), Vec<ParsedDecoration>> = HashMap::default();

        for (_, inst) in module.decode() {
            match inst {
                Instruction::Decorate(d) => {
                    on_id.entry(d.target_id).or_default().push(parse_one(d.decoration, d.params));
                }
                Instruction::MemberDecorate(d) => {
                    on_member
                        .entry((d.target_id, d.member))
                        .or_default()
                        .push(parse_one(d.decoration, d.params));
                }
                _ => {}
            }
        }

        DecorationTable { on_id, on_member }
    }

    pub fn of(&self, id: u32) -> &[ParsedDecoration] {
        self.on_id.get(&id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn of_member(&self, struct_id: u32, member: u32) -> &[ParsedDecoration] {
        self.on_member.get(&(struct_id, member)).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn offset_of_member(&self, struct_id: u32, member: u32) -> Option<u32> {
        self.of_member(struct_id, member).iter().find_map(|d| match d {
            ParsedDecoration::Offset(o) => Some(*o),
            _ => None,
        })
    }

    pub fn array_stride(&self, id: u32) -> Option<u32> {
        self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::ArrayStride(s) => Some(*s),
            _ => None,
        })
    }

    pub fn matrix_stride_of_member(&self, struct_id: u32, member: u32) -> Option<u32> {
        self.of_member(struct_id, member).iter().find_map(|d| match d {
            ParsedDecoration::MatrixStride(s) => Some(*s),
            _ => None,
        })
    }

    pub fn is_row_major_member(&self, struct_id: u32, member: u32) -> bool {
        self.of_member(struct_id, member)
            .iter()
            .any(|d| matches!(d, ParsedDecoration::RowMajor))
    }

    pub fn builtin(&self, id: u32) -> Option<BuiltIn> {
        self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::BuiltIn(b) => Some(*b),
            _ => None,
        })
    }

    pub fn location(&self, id: u32) -> Option<u32> {
        self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::Location(l) => Some(*l),
            _ => None,
        })
    }

    pub fn descriptor_set_and_binding(&self, id: u32) -> Option<(u32, u32)> {
        let set = self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::DescriptorSet(s) => Some(*s),
            _ => None,
        })?;
        let binding = self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::Binding(b) => Some(*b),
            _ => None,
        })?;
        Some((set, binding))
    }

    pub fn spec_id(&self, id: u32) -> Option<u32> {
        self.of(id).iter().find_map(|d| match d {
            ParsedDecoration::SpecId(s) => Some(*s),
            _ => None,
        })
    }

    pub fn is_block(&self, id: u32) -> bool {
        self.of(id).iter().any(|d| matches!(d, ParsedDecoration::Block | ParsedDecoration::BufferBlock))
    }

    pub fn is_relaxed_precision(&self, id: u32) -> bool {
        self.of(id).iter().any(|d| matches!(d, ParsedDecoration::RelaxedPrecision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module_with(extra: &[u32]) -> Module {
        let mut words = vec![0x0723_0203, 0x0001_0300, 0, 10, 0];
        words.extend_from_slice(extra);
        Module::from_words(&words).unwrap()
    }

    fn encode(op: spirv_headers::Op, operands: &[u32]) -> Vec<u32> {
        let mut v = vec![0u32];
        v.extend_from_slice(operands);
        v[0] = (op as u32) | ((v.len() as u32) << 16);
        v
    }

    #[test]
    fn reads_offset_and_array_stride() {
        let mut words = Vec::new();
        words.extend(encode(spirv_headers::Op::MemberDecorate, &[5, 0, Decoration::Offset as u32, 16]));
        words.extend(encode(spirv_headers::Op::Decorate, &[7, Decoration::ArrayStride as u32, 64]));
        let module = module_with(&words);
        let table = DecorationTable::build(&module);
        assert_eq!(table.offset_of_member(5, 0), Some(16));
        assert_eq!(table.array_stride(7), Some(64));
    }

    #[test]
    fn reads_descriptor_set_and_binding() {
        let mut words = Vec::new();
        words.extend(encode(spirv_headers::Op::Decorate, &[3, Decoration::DescriptorSet as u32, 1]));
        words.extend(encode(spirv_headers::Op::Decorate, &[3, Decoration::Binding as u32, 2]));
        let module = module_with(&words);
        let table = DecorationTable::build(&module);
        assert_eq!(table.descriptor_set_and_binding(3), Some((1, 2)));
    }
}
