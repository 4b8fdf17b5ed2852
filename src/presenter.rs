//! Animation loop driving a render job frame by frame.
//!
//! The loop owns the job and a uniform buffer bound at group 0 binding 0.
//! Each frame packs [`FrameUniforms`], writes them, and renders. The only
//! way to cancel is to stop scheduling frames, through a [`StopHandle`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wgpu::{Buffer, BufferUsages, Queue};

use crate::gpu::{buffers, Binding, GpuContext, JobError, RenderJob, RenderTarget};
use crate::uniforms::{FrameUniforms, FRAME_UNIFORMS_SIZE};

/// Cloneable flag that stops an [`AnimationLoop`] from scheduling more frames.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Repeatedly renders a job with fresh time/pointer/resolution uniforms.
pub struct AnimationLoop<T: RenderTarget> {
    job: RenderJob<T>,
    queue: Arc<Queue>,
    uniforms: Buffer,
    started: Instant,
    pointer: [f32; 2],
    clear: Option<wgpu::Color>,
    frames: u64,
    stop: StopHandle,
}

impl<T: RenderTarget> AnimationLoop<T> {
    /// Bind a fresh uniform buffer to `job`, building its pipeline if needed.
    ///
    /// The fragment shader must read `U` at group 0 binding 0.
    pub async fn start(ctx: &GpuContext, mut job: RenderJob<T>) -> Result<Self, JobError> {
        let uniforms = buffers::create_buffer(
            &ctx.device,
            "frame_uniforms",
            FRAME_UNIFORMS_SIZE,
            BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            None,
        );
        job.build_and_bind(&[Binding::buffer(&uniforms).at(0)]).await?;
        log::info!("Animation loop started");

        Ok(Self {
            job,
            queue: ctx.queue.clone(),
            uniforms,
            started: Instant::now(),
            pointer: [0.0, 0.0],
            clear: None,
            frames: 0,
            stop: StopHandle::default(),
        })
    }

    pub fn job(&self) -> &RenderJob<T> {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut RenderJob<T> {
        &mut self.job
    }

    /// Pointer position in pixels relative to the target's top-left corner.
    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = [x, y];
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear = Some(color);
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Render one frame at wall-clock time since start.
    ///
    /// Returns `false` without rendering once stopped.
    pub fn frame(&mut self) -> Result<bool, JobError> {
        let seconds = self.started.elapsed().as_secs_f32();
        self.frame_at(seconds)
    }

    /// Render one frame with an explicit time in seconds.
    pub fn frame_at(&mut self, seconds: f32) -> Result<bool, JobError> {
        if self.stop.is_stopped() {
            return Ok(false);
        }

        let uniforms = FrameUniforms::new(seconds, self.pointer, self.job.target().size());
        buffers::write_buffer(&self.queue, &self.uniforms, 0, uniforms.as_bytes());
        self.job.render_frame(self.clear)?;
        self.frames += 1;
        Ok(true)
    }

    /// Render frames until stopped or `max_frames` have been drawn.
    pub fn run(&mut self, max_frames: Option<u64>) -> Result<u64, JobError> {
        let mut drawn = 0;
        while max_frames.map_or(true, |max| drawn < max) {
            if !self.frame()? {
                break;
            }
            drawn += 1;
        }
        log::info!("Animation loop ended after {} frames", drawn);
        Ok(drawn)
    }

    /// Stop the loop and hand back the job.
    pub fn into_job(self) -> RenderJob<T> {
        self.stop.stop();
        self.job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::OffscreenTarget;
    use crate::presets;

    #[test]
    fn test_stop_handle_is_shared() {
        let handle = StopHandle::default();
        let clone = handle.clone();
        assert!(!clone.is_stopped());
        handle.stop();
        assert!(clone.is_stopped());
    }

    #[tokio::test]
    async fn test_loop_stops_scheduling() {
        let ctx = match GpuContext::new(wgpu::Features::empty()).await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };
        let mut job = RenderJob::new(&ctx, OffscreenTarget::new(&ctx, 8, 8));
        job.set_fragment(presets::WAVE_FRAGMENT);

        let mut anim = AnimationLoop::start(&ctx, job).await.unwrap();
        assert_eq!(anim.run(Some(3)).unwrap(), 3);

        anim.stop_handle().stop();
        assert!(!anim.frame().unwrap());
        assert_eq!(anim.run(None).unwrap(), 0);
        assert_eq!(anim.frames_rendered(), 3);
    }
}
