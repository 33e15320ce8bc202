/// Renderer - drives the frame and records one indexed draw per renderable
///
/// ```no_run
/// # use lumen_engine::lumen::Result;
/// # use lumen_engine::lumen::render::{Renderer, MeshResources, MaterialResources};
/// # use lumen_engine::lumen::context::DrawCommands;
/// # fn frame<C: DrawCommands>(renderer: &mut Renderer<'_, C>, mesh: &MeshResources<C>, material: &MaterialResources<C>) -> Result<()> {
/// if renderer.before_update()? {
///     renderer.update(mesh, material)?;
/// }
/// renderer.after_update()?;
/// # Ok(())
/// # }
/// ```

use crate::error::{Error, Result};
use crate::graphics_context::DrawCommands;
use crate::renderer::{MeshResources, MaterialResources, INDEX_TYPE};
use crate::surface::{WindowSurface, FrameStatus};
use crate::{engine_trace, engine_error};

const SOURCE: &str = "lumen::renderer";

/// Counters of the last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Frame counter, incremented by every `before_update`
    pub frame_number: u64,
    /// Indexed draws recorded this frame
    pub draw_calls: u32,
    /// Indices submitted this frame
    pub indices_submitted: u64,
}

pub struct Renderer<'a, C: DrawCommands> {
    surface: WindowSurface<'a, C>,
    frame_number: u64,
    command_buffer: Option<C::CommandBuffer>,
    stats: FrameStats,
}

impl<'a, C: DrawCommands> Renderer<'a, C> {
    /// Take ownership of a ready window surface
    pub fn new(surface: WindowSurface<'a, C>) -> Self {
        Self {
            surface,
            frame_number: 0,
            command_buffer: None,
            stats: FrameStats::default(),
        }
    }

    /// Start a frame
    ///
    /// Returns `false` when the surface skipped the frame; `update` must not be
    /// called then, `after_update` is a no-op.
    pub fn before_update(&mut self) -> Result<bool> {
        self.frame_number += 1;
        self.stats = FrameStats {
            frame_number: self.frame_number,
            ..FrameStats::default()
        };
        engine_trace!(SOURCE, "[frame {}] before update", self.frame_number);

        match self.surface.begin_frame()? {
            FrameStatus::Recording { .. } => {
                self.command_buffer = self.surface.current_command_buffer();
                Ok(self.command_buffer.is_some())
            }
            FrameStatus::Skipped => {
                engine_trace!(SOURCE, "[frame {}] skipped by the surface", self.frame_number);
                self.command_buffer = None;
                Ok(false)
            }
        }
    }

    /// Record the draw of one renderable into the active command buffer
    pub fn update(&mut self, mesh: &MeshResources<C>, material: &MaterialResources<C>) -> Result<()> {
        let command_buffer = match self.command_buffer {
            Some(command_buffer) => command_buffer,
            None => {
                engine_error!(SOURCE, "[frame {}] update called outside an active frame", self.frame_number);
                return Err(Error::InvalidState("update called outside an active frame".to_string()));
            }
        };
        let context = self.surface.context();
        let index_count = mesh.index_count();

        context.cmd_bind_pipeline(command_buffer, material.pipeline);
        context.cmd_bind_vertex_buffer(command_buffer, 0, mesh.vertices.buffer, mesh.vertices.offset);
        context.cmd_bind_index_buffer(command_buffer, mesh.indices.buffer, mesh.indices.offset, INDEX_TYPE);
        context.cmd_bind_descriptor_set(command_buffer, material.pipeline_layout, 0, material.descriptor_set);
        context.cmd_draw_indexed(command_buffer, index_count, 1, 0, 0, 0);

        self.stats.draw_calls += 1;
        self.stats.indices_submitted += u64::from(index_count);
        engine_trace!(SOURCE, "[frame {}] recorded draw of {} indices", self.frame_number, index_count);
        Ok(())
    }

    /// Submit and present the frame started by `before_update`
    pub fn after_update(&mut self) -> Result<()> {
        if self.command_buffer.take().is_none() {
            return Ok(());
        }
        engine_trace!(SOURCE, "[frame {}] after update", self.frame_number);
        self.surface.end_frame()
    }

    /// Run a whole frame over `items` and return its counters
    ///
    /// A failed draw still ends the frame so the surface is ready for the next one.
    pub fn render_frame<'r, I>(&mut self, items: I) -> Result<FrameStats>
    where
        I: IntoIterator<Item = (&'r MeshResources<C>, &'r MaterialResources<C>)>,
        C: 'r,
    {
        if !self.before_update()? {
            return Ok(self.stats);
        }
        let recorded = items
            .into_iter()
            .try_for_each(|(mesh, material)| self.update(mesh, material));
        let ended = self.after_update();
        recorded?;
        ended?;
        Ok(self.stats)
    }

    // ===== ACCESSORS =====

    pub fn surface(&self) -> &WindowSurface<'a, C> {
        &self.surface
    }

    /// Mutable surface access, e.g. to forward resize notifications
    pub fn surface_mut(&mut self) -> &mut WindowSurface<'a, C> {
        &mut self.surface
    }

    /// Give the surface back, ending the renderer
    pub fn into_surface(self) -> WindowSurface<'a, C> {
        self.surface
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
