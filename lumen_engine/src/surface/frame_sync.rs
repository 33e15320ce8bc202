/// Frame-in-flight synchronization set
///
/// A fixed ring of `MAX_FRAMES_IN_FLIGHT` slots, each holding the signals for
/// one frame the CPU may record while the GPU still renders the previous one.
/// The ring is independent of the swapchain image count and survives
/// swapchain recreation.

use crate::error::Result;
use crate::graphics_context::GraphicsContext;
use crate::engine_debug;

/// Number of frames the CPU may record ahead of the GPU
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Signals of one frame in flight
pub struct FrameSlot<C: GraphicsContext> {
    /// Signaled by acquire once the image can be written
    pub image_available: C::Semaphore,
    /// Signaled by submit once rendering finished, waited on by present
    pub render_finished: C::Semaphore,
    /// Signaled by submit once the GPU is done with this slot
    pub in_flight: C::Fence,
}

impl<C: GraphicsContext> Clone for FrameSlot<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: GraphicsContext> Copy for FrameSlot<C> {}

impl<C: GraphicsContext> FrameSlot<C> {
    fn create(context: &C) -> Result<Self> {
        let image_available = context.create_semaphore()?;
        let render_finished = match context.create_semaphore() {
            Ok(semaphore) => semaphore,
            Err(e) => {
                context.destroy_semaphore(image_available);
                return Err(e);
            }
        };
        // Signaled so that the first wait on this slot returns immediately
        let in_flight = match context.create_fence(true) {
            Ok(fence) => fence,
            Err(e) => {
                context.destroy_semaphore(render_finished);
                context.destroy_semaphore(image_available);
                return Err(e);
            }
        };
        Ok(Self { image_available, render_finished, in_flight })
    }

    fn destroy(self, context: &C) {
        context.destroy_fence(self.in_flight);
        context.destroy_semaphore(self.render_finished);
        context.destroy_semaphore(self.image_available);
    }
}

/// Ring of frame slots plus the index of the slot in use
pub struct FrameSynchronization<C: GraphicsContext> {
    slots: Vec<FrameSlot<C>>,
    current_frame: usize,
}

impl<C: GraphicsContext> FrameSynchronization<C> {
    /// Create `MAX_FRAMES_IN_FLIGHT` slots with pre-signaled fences
    ///
    /// On failure the slots created so far are destroyed.
    pub fn create(context: &C) -> Result<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            match FrameSlot::create(context) {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    for slot in slots.drain(..) {
                        slot.destroy(context);
                    }
                    return Err(e);
                }
            }
        }
        engine_debug!("lumen::surface", "Created {} frame slots", slots.len());
        Ok(Self { slots, current_frame: 0 })
    }

    /// Destroy every slot. The GPU must be idle.
    pub fn destroy(self, context: &C) {
        for slot in self.slots {
            slot.destroy(context);
        }
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Slot of the frame being recorded
    pub fn current(&self) -> FrameSlot<C> {
        self.slots[self.current_frame]
    }

    pub fn slots(&self) -> &[FrameSlot<C>] {
        &self.slots
    }

    /// Swap the current slot's fence for a new signaled one
    ///
    /// For a slot whose fence was reset but never submitted.
    pub fn replace_current_fence(&mut self, context: &C) -> Result<()> {
        let fence = context.create_fence(true)?;
        let slot = &mut self.slots[self.current_frame];
        context.destroy_fence(slot.in_flight);
        slot.in_flight = fence;
        Ok(())
    }

    /// Move to the next slot (wraps at the slot count)
    pub fn advance(&mut self) {
        self.current_frame = (self.current_frame + 1) % self.slots.len();
    }
}
