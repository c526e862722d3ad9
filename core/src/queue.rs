//! Queue submission and presentation (§4.11 "C11"): the single synchronous
//! entry point everything above (command replay, rasterization, shading)
//! is ultimately driven from. This driver has exactly one queue per device
//! (`crate::device::Device::queue`) and no asynchronous scheduler, so
//! "submit" means "replay every command buffer inline, then signal", not
//! "enqueue for a worker thread" (§5 "Scheduling model").
use crate::command::{self, CommandBuffer, CommandBufferState};
use crate::device::Device;
use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::sync::{Event, Fence, Semaphore};

/// One `vkQueueSubmit` batch: wait on every `wait_semaphores` entry (already
/// signaled in practice, since this driver has no cross-queue asynchrony to
/// wait for), replay `command_buffers` in order, then signal every
/// `signal_semaphores` entry.
pub struct SubmitInfo {
    pub wait_semaphores: Vec<Handle<Semaphore>>,
    pub command_buffers: Vec<Handle<CommandBuffer>>,
    pub signal_semaphores: Vec<Handle<Semaphore>>,
}

/// `vkQueueSubmit`: each batch in `submits` runs in order; within a batch,
/// command buffers replay in the order listed (§5 "Ordering guarantees").
/// `fence`, if given, is signaled only after every batch has fully replayed.
pub fn queue_submit(device: &mut Device, submits: &[SubmitInfo], fence: Option<Handle<Fence>>) -> Result<()> {
    for submit in submits {
        for &sem in &submit.wait_semaphores {
            if let Some(s) = device.semaphores.get(sem) {
                s.take();
            }
        }

        for &cb_handle in &submit.command_buffers {
            {
                let cb = device.command_buffers.get_mut(cb_handle).ok_or(Error::InitializationFailed)?;
                if cb.state != CommandBufferState::Executable {
                    return Err(Error::DeviceLost);
                }
                cb.state = CommandBufferState::Pending;
            }
            let result = command::execute(device, cb_handle);
            // §5 "Cancellation": a replay failure mid-buffer is a fatal,
            // unrecoverable inconsistency, not a retryable error — the
            // buffer is marked Invalid rather than bounced back to
            // Executable, matching "destroying/reusing a Pending buffer
            // whose submission failed is undefined" territory we choose to
            // make detectable instead of silently ignoring.
            let cb = device.command_buffers.get_mut(cb_handle).ok_or(Error::InitializationFailed)?;
            cb.state = if result.is_ok() { CommandBufferState::Executable } else { CommandBufferState::Invalid };
            result?;
        }

        for &sem in &submit.signal_semaphores {
            if let Some(s) = device.semaphores.get(sem) {
                s.signal();
            }
        }
    }

    if let Some(fence_handle) = fence {
        if let Some(f) = device.fences.get(fence_handle) {
            f.signal();
        }
    }
    Ok(())
}

/// `vkQueueWaitIdle`: with synchronous submission, every batch has already
/// fully replayed by the time `queue_submit` returns, so this is a no-op
/// that exists for API completeness (§5 "Suspension points").
pub fn queue_wait_idle(_device: &Device) -> Result<()> {
    Ok(())
}

/// `vkDeviceWaitIdle`: drains every queue the device owns. One queue here,
/// so this is exactly `queue_wait_idle`.
pub fn device_wait_idle(device: &Device) -> Result<()> {
    queue_wait_idle(device)
}

pub fn wait_for_fences(device: &Device, fences: &[Handle<Fence>], wait_all: bool, timeout: Option<std::time::Duration>) -> crate::sync::WaitResult {
    let resolved: Vec<&Fence> = fences.iter().filter_map(|h| device.fences.get(*h)).collect();
    crate::sync::wait_for_fences(&resolved, wait_all, timeout)
}

pub fn wait_events(device: &Device, events: &[Handle<Event>], timeout: Option<std::time::Duration>) -> crate::sync::WaitResult {
    for &h in events {
        if let Some(e) = device.events.get(h) {
            if e.wait(timeout) == crate::sync::WaitResult::Timeout {
                return crate::sync::WaitResult::Timeout;
            }
        }
    }
    crate::sync::WaitResult::Success
}

/// `vkQueuePresentKHR` (§4.11, §6): the swapchain back-end is an external
/// collaborator (spec §1 "out of scope"); this driver's side of the
/// contract is handing back a raw pointer to the presented image's backing
/// memory, already laid out in the format the image was created with — the
/// swapchain itself owns blit-to-window-surface and vsync timing.
pub fn queue_present(device: &Device, image: Handle<crate::resource::Image>) -> Result<*const u8> {
    let img = device.images.get(image).ok_or(Error::InitializationFailed)?;
    let binding = img.binding.ok_or(Error::InitializationFailed)?;
    let mem = device.memories.get(binding.memory).ok_or(Error::InitializationFailed)?;
    Ok(unsafe { mem.as_slice().as_ptr().add(binding.offset as usize) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, Instance};
    use crate::resource::{Buffer, BufferUsageFlags};

    /// Dispatch-ordering property (§8): two submits of the same buffer with
    /// a deterministic body produce byte-identical output, since replay has
    /// no hidden state carried between submissions beyond what the command
    /// buffer itself records.
    #[test]
    fn resubmitting_a_reset_command_buffer_replays_deterministically() {
        let instance = Instance::create();
        let mut device = Device::create(&instance.physical_device);
        let mem = device.allocate_memory(256).unwrap();
        let buf = device.buffers.insert(Buffer::new(64, BufferUsageFlags::TRANSFER_DST));
        device.bind_buffer_memory(buf, mem, 0).unwrap();

        let pool = device.create_command_pool();
        let cb = device.allocate_command_buffer(pool).unwrap();
        device.command_buffers.get_mut(cb).unwrap().begin().unwrap();
        device.command_buffers.get_mut(cb).unwrap().end().unwrap();

        let submits = [SubmitInfo { wait_semaphores: vec![], command_buffers: vec![cb], signal_semaphores: vec![] }];
        queue_submit(&mut device, &submits, None).unwrap();
        assert_eq!(device.command_buffers.get(cb).unwrap().state, CommandBufferState::Executable);

        device.command_buffers.get_mut(cb).unwrap().reset();
        device.command_buffers.get_mut(cb).unwrap().begin().unwrap();
        device.command_buffers.get_mut(cb).unwrap().end().unwrap();
        queue_submit(&mut device, &submits, None).unwrap();
        assert_eq!(device.command_buffers.get(cb).unwrap().state, CommandBufferState::Executable);
    }

    #[test]
    fn submitting_a_buffer_still_in_recording_state_is_rejected() {
        let instance = Instance::create();
        let mut device = Device::create(&instance.physical_device);
        let pool = device.create_command_pool();
        let cb = device.allocate_command_buffer(pool).unwrap();
        device.command_buffers.get_mut(cb).unwrap().begin().unwrap();

        let submits = [SubmitInfo { wait_semaphores: vec![], command_buffers: vec![cb], signal_semaphores: vec![] }];
        assert!(queue_submit(&mut device, &submits, None).is_err());
    }
}
