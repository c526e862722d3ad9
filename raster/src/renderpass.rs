//! Render Pass Executor (§4.9 "C9"): attachment load/store, subpass
//! resolve, and the layout-transition bookkeeping `BeginRenderPass`,
//! subpass-advance, and `EndRenderPass` each drive.
use vkcpu_format::{codec, describe, Format};

use crate::raster::{ColorAttachment, DepthStencilAttachment};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreOp {
    Store,
    DontCare,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ImageLayout {
    Undefined,
    General,
    ColorAttachmentOptimal,
    DepthStencilAttachmentOptimal,
    DepthStencilReadOnlyOptimal,
    ShaderReadOnlyOptimal,
    TransferSrcOptimal,
    TransferDstOptimal,
    Preinitialized,
    PresentSrc,
}

#[derive(Copy, Clone, Debug)]
pub enum ClearValue {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u32 },
}

#[derive(Clone, Debug)]
pub struct AttachmentDescription {
    pub format: Format,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

#[derive(Copy, Clone, Debug)]
pub struct AttachmentReference {
    pub attachment: u32,
    pub layout: ImageLayout,
}

#[derive(Clone, Debug, Default)]
pub struct SubpassDescription {
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    /// Parallel to `color_attachments`; `attachment == u32::MAX` means no
    /// resolve target for that color attachment (`VK_ATTACHMENT_UNUSED`).
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

#[derive(Clone, Debug, Default)]
pub struct RenderPass {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
}

/// Applies `attachment.load_op` to a color target (§4.9 `BeginRenderPass`).
/// `Clear` fills every texel with `clear`; `Load`/`DontCare` leave the
/// backing memory untouched (a `DontCare` target's contents are
/// unspecified, which "leave it as-is" trivially satisfies).
pub fn apply_color_load_op(target: &mut ColorAttachment, load_op: LoadOp, clear: ClearValue) {
    if load_op != LoadOp::Clear {
        return;
    }
    let ClearValue::Color(rgba) = clear else {
        panic!("color attachment cleared with a depth/stencil clear value");
    };
    clear_color(target, rgba);
}

fn clear_color(target: &mut ColorAttachment, rgba: [f32; 4]) {
    let info = describe(target.format);
    for y in 0..target.height {
        for x in 0..target.width {
            let off = info.total_size as usize * (y as usize * target.width as usize + x as usize);
            let texel = &mut target.data[off..off + info.total_size as usize];
            codec::set_channel_f32(info, texel, info.channels.red, rgba[0]);
            codec::set_channel_f32(info, texel, info.channels.green, rgba[1]);
            codec::set_channel_f32(info, texel, info.channels.blue, rgba[2]);
            if info.channels.alpha.present() {
                codec::set_channel_f32(info, texel, info.channels.alpha, rgba[3]);
            }
        }
    }
}

/// Applies `depth_load_op`/`stencil_load_op` to a depth/stencil target.
/// The two sub-resources clear independently, matching `VkClearValue`'s
/// `depthStencil` union having distinct depth and stencil fields.
pub fn apply_depth_stencil_load_op(target: &mut DepthStencilAttachment, depth_load_op: LoadOp, stencil_load_op: LoadOp, clear: ClearValue) {
    let ClearValue::DepthStencil { depth, stencil } = clear else {
        panic!("depth/stencil attachment cleared with a color clear value");
    };
    if depth_load_op != LoadOp::Clear && stencil_load_op != LoadOp::Clear {
        return;
    }
    let info = describe(target.format);
    let depth_ch = if target.format == Format::S8_UINT { None } else { Some(info.channels.red) };
    let stencil_ch = match target.format {
        Format::D24_UNORM_S8_UINT => Some(info.channels.green),
        Format::S8_UINT => Some(info.channels.red),
        _ => None,
    };
    for y in 0..target.height {
        for x in 0..target.width {
            let off = info.total_size as usize * (y as usize * target.width as usize + x as usize);
            let texel = &mut target.data[off..off + info.total_size as usize];
            if depth_load_op == LoadOp::Clear {
                if let Some(ch) = depth_ch {
                    codec::set_channel_f32(info, texel, ch, depth);
                }
            }
            if stencil_load_op == LoadOp::Clear {
                if let Some(ch) = stencil_ch {
                    codec::set_channel_u32(info, texel, ch, stencil);
                }
            }
        }
    }
}

/// Resolves a multisampled color attachment into its subpass-declared
/// resolve target by averaging (§4.9 subpass boundary). With exactly one
/// rasterization sample supported (see the design ledger), resolve reduces
/// to a plain copy; the averaging loop below is still the general multisample
/// form so it keeps working unchanged if sample count support grows.
pub fn resolve_color(src: &ColorAttachment, dst: &mut ColorAttachment, samples: u32) {
    debug_assert_eq!(src.width, dst.width);
    debug_assert_eq!(src.height, dst.height);
    let src_info = describe(src.format);
    let dst_info = describe(dst.format);
    for y in 0..dst.height {
        for x in 0..dst.width {
            let src_off = src_info.total_size as usize * (y as usize * src.width as usize + x as usize) * samples as usize;
            let mut rgba = [0.0f32; 4];
            for s in 0..samples as usize {
                let base = src_off + s * src_info.total_size as usize;
                let texel = &src.data[base..base + src_info.total_size as usize];
                rgba[0] += codec::get_channel_f32(src_info, texel, src_info.channels.red);
                rgba[1] += codec::get_channel_f32(src_info, texel, src_info.channels.green);
                rgba[2] += codec::get_channel_f32(src_info, texel, src_info.channels.blue);
                rgba[3] += if src_info.channels.alpha.present() { codec::get_channel_f32(src_info, texel, src_info.channels.alpha) } else { 1.0 };
            }
            for c in rgba.iter_mut() {
                *c /= samples as f32;
            }
            let dst_off = dst_info.total_size as usize * (y as usize * dst.width as usize + x as usize);
            let dst_texel = &mut dst.data[dst_off..dst_off + dst_info.total_size as usize];
            codec::set_channel_f32(dst_info, dst_texel, dst_info.channels.red, rgba[0]);
            codec::set_channel_f32(dst_info, dst_texel, dst_info.channels.green, rgba[1]);
            codec::set_channel_f32(dst_info, dst_texel, dst_info.channels.blue, rgba[2]);
            if dst_info.channels.alpha.present() {
                codec::set_channel_f32(dst_info, dst_texel, dst_info.channels.alpha, rgba[3]);
            }
        }
    }
}

/// Validates and records a declared layout transition (§4.9, §9's Open
/// Question resolution): `General <-> PresentSrc` and `General <->
/// TransferSrcOptimal/TransferDstOptimal` are the pairs a conforming
/// implementation must honour for swapchain correctness; every other pair
/// is accepted as a no-op, matching "mostly ignored" upstream, but is still
/// logged so a trace can show what the application asked for.
pub fn transition_layout(attachment_index: u32, from: ImageLayout, to: ImageLayout) {
    use ImageLayout::*;
    let is_swapchain_relevant = matches!(
        (from, to),
        (General, PresentSrc) | (PresentSrc, General) | (General, TransferSrcOptimal) | (TransferSrcOptimal, General) | (General, TransferDstOptimal) | (TransferDstOptimal, General)
    );
    if is_swapchain_relevant {
        log::debug!("attachment {attachment_index}: layout transition {:?} -> {:?} honoured", from, to);
    } else {
        log::debug!("attachment {attachment_index}: layout transition {:?} -> {:?} treated as a no-op", from, to);
    }
}

/// Applies an attachment's `StoreOp` at `EndRenderPass` (§4.9). `Store`
/// keeps the backing memory as the last subpass wrote it, which is also
/// exactly what happens when nothing runs at all — a CPU driver has no
/// separate tile memory to flush, so there is no distinct action to take.
/// `DontCare` permits the same thing: contents become allowed-undefined,
/// not actually undefined, so leaving them alone is a conforming choice
/// rather than a gap. Recorded with the same `transition_layout`-style
/// debug log so a trace shows what each attachment asked for.
pub fn apply_store_op(attachment_index: u32, store_op: StoreOp) {
    match store_op {
        StoreOp::Store => log::debug!("attachment {attachment_index}: store op Store honoured"),
        StoreOp::DontCare => log::debug!("attachment {attachment_index}: store op DontCare treated as a no-op (contents left intact, now allowed-undefined)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The clear-and-present scenario (§8): a 4x4 `B8G8R8A8_UNORM` image
    /// cleared to `(r=0.25, g=0.5, b=0.75, a=1.0)`. `B8G8R8A8` places B at
    /// byte 0, G at byte 1, R at byte 2, A at byte 3 within each texel.
    #[test]
    fn clear_color_produces_expected_bgra_bytes() {
        let mut data = vec![0u8; 4 * 4 * 4];
        let mut target = ColorAttachment { data: &mut data, format: Format::B8G8R8A8_UNORM, width: 4, height: 4 };
        apply_color_load_op(&mut target, LoadOp::Clear, ClearValue::Color([0.25, 0.5, 0.75, 1.0]));
        for texel in data.chunks(4) {
            assert_eq!(texel, &[0xbf, 0x80, 0x40, 0xff]);
        }
    }

    #[test]
    fn load_op_load_leaves_existing_contents_untouched() {
        let mut data = vec![7u8; 16];
        let mut target = ColorAttachment { data: &mut data, format: Format::R8G8B8A8_UNORM, width: 2, height: 2 };
        apply_color_load_op(&mut target, LoadOp::Load, ClearValue::Color([0.0, 0.0, 0.0, 0.0]));
        assert!(data.iter().all(|&b| b == 7));
    }

    #[test]
    fn depth_stencil_clear_sets_only_the_requested_sub_resource() {
        let mut data = vec![0u8; 4];
        let mut target = DepthStencilAttachment { data: &mut data, format: Format::D24_UNORM_S8_UINT, width: 1, height: 1 };
        apply_depth_stencil_load_op(&mut target, LoadOp::Clear, LoadOp::DontCare, ClearValue::DepthStencil { depth: 1.0, stencil: 0xab });
        let info = describe(Format::D24_UNORM_S8_UINT);
        assert_eq!(codec::get_channel_f32(info, &data, info.channels.red), 1.0);
        assert_eq!(codec::get_channel_u32(info, &data, info.channels.green), 0);
    }
}
