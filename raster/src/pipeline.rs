//! Pipeline Object (§4.7 "C7"): a pure value snapshot of fixed-function
//! state, plus one compiled [`JitHost`] per shader stage the pipeline
//! references. Grounded on `CPVulkan/Pipeline.h`'s state struct split
//! (`VertexInputState`, `RasterizationState`, `ColourBlendState`, ...) —
//! this crate keeps the same grouping, translated into small `Copy` value
//! types rather than one monolithic create-info struct.
use std::fmt;

use fxhash::FxHashMap;

use vkcpu_format::Format;
use vkcpu_jit::host::{JitError, JitHost};
use vkcpu_spirv::Module as SpirvModule;
use vkcpu_translate::builtins::ExecutionModel;
use vkcpu_translate::constants::SpecializationInfo;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum VertexInputRate {
    Vertex,
    Instance,
}

#[derive(Clone, Debug)]
pub struct VertexInputBinding {
    pub binding: u32,
    pub stride: u32,
    pub input_rate: VertexInputRate,
}

#[derive(Clone, Debug)]
pub struct VertexInputAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: Format,
    pub offset: u32,
}

#[derive(Clone, Debug, Default)]
pub struct VertexInputState {
    pub bindings: Vec<VertexInputBinding>,
    pub attributes: Vec<VertexInputAttribute>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
}

#[derive(Copy, Clone, Debug)]
pub struct InputAssemblyState {
    pub topology: PrimitiveTopology,
    pub primitive_restart_enable: bool,
}

bitflags::bitflags! {
    pub struct CullMode: u32 {
        const NONE = 0;
        const FRONT = 1 << 0;
        const BACK = 1 << 1;
        const FRONT_AND_BACK = Self::FRONT.bits | Self::BACK.bits;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PolygonMode {
    Fill,
    Line,
    Point,
}

#[derive(Copy, Clone, Debug)]
pub struct RasterizationState {
    pub depth_clamp_enable: bool,
    pub rasterizer_discard_enable: bool,
    pub polygon_mode: PolygonMode,
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub depth_bias_enable: bool,
    pub depth_bias_constant_factor: f32,
    pub depth_bias_slope_factor: f32,
    pub line_width: f32,
}

impl Default for RasterizationState {
    fn default() -> Self {
        RasterizationState {
            depth_clamp_enable: false,
            rasterizer_discard_enable: false,
            polygon_mode: PolygonMode::Fill,
            cull_mode: CullMode::NONE,
            front_face: FrontFace::CounterClockwise,
            depth_bias_enable: false,
            depth_bias_constant_factor: 0.0,
            depth_bias_slope_factor: 0.0,
            line_width: 1.0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct MultisampleState {
    pub rasterization_samples: u32,
    pub sample_shading_enable: bool,
}

impl Default for MultisampleState {
    fn default() -> Self {
        MultisampleState { rasterization_samples: 1, sample_shading_enable: false }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

impl CompareOp {
    pub fn evaluate(self, a: f32, b: f32) -> bool {
        match self {
            CompareOp::Never => false,
            CompareOp::Less => a < b,
            CompareOp::Equal => a == b,
            CompareOp::LessOrEqual => a <= b,
            CompareOp::Greater => a > b,
            CompareOp::NotEqual => a != b,
            CompareOp::GreaterOrEqual => a >= b,
            CompareOp::Always => true,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

impl StencilOp {
    pub fn apply(self, current: u8, reference: u8) -> u8 {
        match self {
            StencilOp::Keep => current,
            StencilOp::Zero => 0,
            StencilOp::Replace => reference,
            StencilOp::IncrementAndClamp => current.saturating_add(1),
            StencilOp::DecrementAndClamp => current.saturating_sub(1),
            StencilOp::Invert => !current,
            StencilOp::IncrementAndWrap => current.wrapping_add(1),
            StencilOp::DecrementAndWrap => current.wrapping_sub(1),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl Default for StencilOpState {
    fn default() -> Self {
        StencilOpState {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
            compare_mask: 0xff,
            write_mask: 0xff,
            reference: 0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub depth_bounds_test_enable: bool,
    pub min_depth_bounds: f32,
    pub max_depth_bounds: f32,
    pub stencil_test_enable: bool,
    pub front: StencilOpState,
    pub back: StencilOpState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        DepthStencilState {
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: CompareOp::Always,
            depth_bounds_test_enable: false,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
            stencil_test_enable: false,
            front: StencilOpState::default(),
            back: StencilOpState::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

impl BlendFactor {
    pub fn resolve(self, src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
        match self {
            BlendFactor::Zero => [0.0; 4],
            BlendFactor::One => [1.0; 4],
            BlendFactor::SrcColor => src,
            BlendFactor::OneMinusSrcColor => src.map(|c| 1.0 - c),
            BlendFactor::DstColor => dst,
            BlendFactor::OneMinusDstColor => dst.map(|c| 1.0 - c),
            BlendFactor::SrcAlpha => [src[3]; 4],
            BlendFactor::OneMinusSrcAlpha => [1.0 - src[3]; 4],
            BlendFactor::DstAlpha => [dst[3]; 4],
            BlendFactor::OneMinusDstAlpha => [1.0 - dst[3]; 4],
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

impl BlendOp {
    pub fn apply(self, src: f32, dst: f32) -> f32 {
        match self {
            BlendOp::Add => src + dst,
            BlendOp::Subtract => src - dst,
            BlendOp::ReverseSubtract => dst - src,
            BlendOp::Min => src.min(dst),
            BlendOp::Max => src.max(dst),
        }
    }
}

bitflags::bitflags! {
    pub struct ColorComponentFlags: u32 {
        const R = 1 << 0;
        const G = 1 << 1;
        const B = 1 << 2;
        const A = 1 << 3;
        const RGBA = Self::R.bits | Self::G.bits | Self::B.bits | Self::A.bits;
    }
}

#[derive(Copy, Clone, Debug)]
pub struct ColorBlendAttachmentState {
    pub blend_enable: bool,
    pub src_color_blend_factor: BlendFactor,
    pub dst_color_blend_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_blend_factor: BlendFactor,
    pub dst_alpha_blend_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorComponentFlags,
}

impl Default for ColorBlendAttachmentState {
    fn default() -> Self {
        ColorBlendAttachmentState {
            blend_enable: false,
            src_color_blend_factor: BlendFactor::One,
            dst_color_blend_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_blend_factor: BlendFactor::One,
            dst_alpha_blend_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorComponentFlags::RGBA,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogicOp {
    Clear,
    Copy,
    And,
    Or,
    Xor,
    NoOp,
    Invert,
}

impl LogicOp {
    pub fn apply(self, src: u32, dst: u32) -> u32 {
        match self {
            LogicOp::Clear => 0,
            LogicOp::Copy => src,
            LogicOp::And => src & dst,
            LogicOp::Or => src | dst,
            LogicOp::Xor => src ^ dst,
            LogicOp::NoOp => dst,
            LogicOp::Invert => !dst,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ColorBlendState {
    pub logic_op_enable: bool,
    pub logic_op: LogicOp,
    pub attachments: Vec<ColorBlendAttachmentState>,
    pub blend_constants: [f32; 4],
}

impl Default for ColorBlendState {
    fn default() -> Self {
        ColorBlendState { logic_op_enable: false, logic_op: LogicOp::Copy, attachments: Vec::new(), blend_constants: [0.0; 4] }
    }
}

bitflags::bitflags! {
    /// Which fixed-function fields a command buffer's `CmdSet*` commands
    /// override at draw time instead of the pipeline's own snapshot
    /// (§4.10).
    pub struct DynamicStateFlags: u32 {
        const VIEWPORT              = 1 << 0;
        const SCISSOR               = 1 << 1;
        const LINE_WIDTH            = 1 << 2;
        const DEPTH_BIAS            = 1 << 3;
        const BLEND_CONSTANTS       = 1 << 4;
        const DEPTH_BOUNDS          = 1 << 5;
        const STENCIL_COMPARE_MASK  = 1 << 6;
        const STENCIL_WRITE_MASK    = 1 << 7;
        const STENCIL_REFERENCE     = 1 << 8;
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderStage {
    fn execution_model(self) -> ExecutionModel {
        match self {
            ShaderStage::Vertex => ExecutionModel::Vertex,
            ShaderStage::TessControl => ExecutionModel::TessControl,
            ShaderStage::TessEval => ExecutionModel::TessEval,
            ShaderStage::Geometry => ExecutionModel::Geometry,
            ShaderStage::Fragment => ExecutionModel::Fragment,
            ShaderStage::Compute => ExecutionModel::GLCompute,
        }
    }
}

/// One `(module, entry-point name, specialization info)` triple a pipeline
/// compiles into its stage's `JitHost` (§3 "Pipeline").
pub struct StageSource<'a> {
    pub stage: ShaderStage,
    pub module: &'a SpirvModule,
    pub entry_point: &'a str,
    pub spec_info: SpecializationInfo,
}

#[derive(Debug)]
pub enum PipelineError {
    Jit(JitError),
    MissingEntryPoint { stage: ShaderStage, entry_point: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Jit(e) => write!(f, "pipeline shader compilation failed: {}", e),
            PipelineError::MissingEntryPoint { stage, entry_point } => {
                write!(f, "stage {:?} has no entry point named {}", stage, entry_point)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<JitError> for PipelineError {
    fn from(e: JitError) -> Self {
        PipelineError::Jit(e)
    }
}

/// Pure value snapshot of every fixed-function state block (§4.7 "C7"), plus
/// the compiled `JitHost` for each shader stage the pipeline references.
/// "A pipeline never observes the creator's state after creation" (§3):
/// every field here is an owned value, never a reference back to
/// caller-owned create-info storage.
pub struct Pipeline {
    pub vertex_input: VertexInputState,
    pub input_assembly: InputAssemblyState,
    pub viewports: Vec<Viewport>,
    pub scissors: Vec<Rect2D>,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    pub dynamic_state: DynamicStateFlags,
    hosts: FxHashMap<ShaderStage, JitHost>,
    entry_names: FxHashMap<ShaderStage, String>,
    /// The fragment stage alone is compiled once per fragment worker thread
    /// rather than once for the whole pipeline: per-invocation built-in
    /// cells are thread-local storage (one cell per worker thread
    /// participating in a draw's fragment stage), and a `JitHost`'s
    /// `_builtin_input`/`_builtin_output` globals are process-wide within
    /// that host, so two threads sharing one host would race on them.
    /// Index `i` is reserved for the fragment worker pool's thread `i`.
    fragment_gang: Vec<JitHost>,
    fragment_entry_name: Option<String>,
}

impl Pipeline {
    /// Compiles every stage in `stages`, then assembles the fixed-function
    /// snapshot around them. Destroying the returned `Pipeline` drops its
    /// `JitHost`s, releasing their compiled code (§4.7: "destroying a
    /// pipeline releases its compiled modules").
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stages: Vec<StageSource>,
        fragment_workers: usize,
        vertex_input: VertexInputState,
        input_assembly: InputAssemblyState,
        viewports: Vec<Viewport>,
        scissors: Vec<Rect2D>,
        rasterization: RasterizationState,
        multisample: MultisampleState,
        depth_stencil: DepthStencilState,
        color_blend: ColorBlendState,
        dynamic_state: DynamicStateFlags,
    ) -> Result<Pipeline, PipelineError> {
        let mut hosts = FxHashMap::default();
        let mut entry_names = FxHashMap::default();
        let mut fragment_gang = Vec::new();
        let mut fragment_entry_name = None;

        for source in stages {
            let _ = source.stage.execution_model(); // validated by the translator itself
            if source.stage == ShaderStage::Fragment {
                for _ in 0..fragment_workers.max(1) {
                    let mut host = JitHost::new();
                    host.compile(source.module, &source.spec_info)?;
                    if host.get_optional_ptr(source.entry_point).is_none() {
                        return Err(PipelineError::MissingEntryPoint { stage: source.stage, entry_point: source.entry_point.to_string() });
                    }
                    fragment_gang.push(host);
                }
                fragment_entry_name = Some(source.entry_point.to_string());
                continue;
            }
            let mut host = JitHost::new();
            host.compile(source.module, &source.spec_info)?;
            if host.get_optional_ptr(source.entry_point).is_none() {
                return Err(PipelineError::MissingEntryPoint { stage: source.stage, entry_point: source.entry_point.to_string() });
            }
            entry_names.insert(source.stage, source.entry_point.to_string());
            hosts.insert(source.stage, host);
        }
        Ok(Pipeline {
            vertex_input,
            input_assembly,
            viewports,
            scissors,
            rasterization,
            multisample,
            depth_stencil,
            color_blend,
            dynamic_state,
            hosts,
            entry_names,
            fragment_gang,
            fragment_entry_name,
        })
    }

    pub fn has_stage(&self, stage: ShaderStage) -> bool {
        if stage == ShaderStage::Fragment {
            return !self.fragment_gang.is_empty();
        }
        self.hosts.contains_key(&stage)
    }

    pub fn fragment_worker_count(&self) -> usize {
        self.fragment_gang.len().max(1)
    }

    /// Resolves fragment worker `worker`'s compiled entry point.
    pub fn fragment_entry(&self, worker: usize) -> Option<unsafe extern "C" fn()> {
        let host = self.fragment_gang.get(worker)?;
        let name = self.fragment_entry_name.as_ref()?;
        let ptr = host.get_optional_ptr(name)?;
        Some(unsafe { std::mem::transmute::<*const u8, unsafe extern "C" fn()>(ptr) })
    }

    /// Resolves a mangled global within fragment worker `worker`'s compiled
    /// module — the fragment-stage counterpart to [`Pipeline::global_ptr`].
    pub fn fragment_global_ptr(&mut self, worker: usize, mangled_name: &str) -> Option<*mut u8> {
        self.fragment_gang.get_mut(worker)?.get_data_ptr(mangled_name)
    }

    /// The fragment worker gang as a plain mutable slice, for a caller
    /// (the parallel rasterizer) that wants to hand out one `&mut JitHost`
    /// per worker via `par_iter_mut` rather than index through `&mut self`
    /// repeatedly — the borrow checker can prove disjoint slice elements
    /// are safe to alias across threads, but not disjoint map entries
    /// reached through a shared `&mut Pipeline`.
    pub fn fragment_hosts_mut(&mut self) -> &mut [JitHost] {
        &mut self.fragment_gang
    }

    pub fn fragment_entry_name(&self) -> Option<&str> {
        self.fragment_entry_name.as_deref()
    }

    /// Resolves `stage`'s compiled entry point. SPIR-V `OpEntryPoint`
    /// functions always compile to a zero-argument, void-returning
    /// signature (the translator's `signature_of` derives this from
    /// `OpTypeFunction` directly), so callers invoke the result with no
    /// argument-marshalling step.
    pub fn entry(&self, stage: ShaderStage) -> Option<unsafe extern "C" fn()> {
        let host = self.hosts.get(&stage)?;
        let name = self.entry_names.get(&stage)?;
        let ptr = host.get_optional_ptr(name)?;
        Some(unsafe { std::mem::transmute::<*const u8, unsafe extern "C" fn()>(ptr) })
    }

    /// Resolves a mangled global (`_builtin_input`, `_builtin_output`, or a
    /// `vkcpu_translate::mangle`-produced name) within `stage`'s compiled
    /// module. `None` if the stage isn't present or never referenced a
    /// global by that name.
    pub fn global_ptr(&mut self, stage: ShaderStage, mangled_name: &str) -> Option<*mut u8> {
        self.hosts.get_mut(&stage)?.get_data_ptr(mangled_name)
    }

    pub fn builtin_input_ptr(&mut self, stage: ShaderStage) -> Option<*mut u8> {
        self.global_ptr(stage, "_builtin_input")
    }

    pub fn builtin_output_ptr(&mut self, stage: ShaderStage) -> Option<*mut u8> {
        self.global_ptr(stage, "_builtin_output")
    }

    pub fn input_layout(&self, stage: ShaderStage) -> vkcpu_ir::types::StructLayout {
        vkcpu_translate::builtins::input_layout(stage.execution_model())
    }
    pub fn output_layout(&self, stage: ShaderStage) -> vkcpu_ir::types::StructLayout {
        vkcpu_translate::builtins::output_layout(stage.execution_model())
    }
}
