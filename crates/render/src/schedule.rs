use crate::TargetStack;

/// Logical render targets the schedule binds. The backend maps these to
/// concrete framebuffers or texture views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetId {
    /// The window surface: the post pass's destination.
    Surface,
    /// Off-screen color+depth target the beauty pass renders into and the
    /// post pass samples.
    Offscreen,
    /// Depth-only target written by the shadow pass and sampled by beauty.
    ShadowMap,
}

/// The three passes of a frame, in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    Shadow,
    Beauty,
    Post,
}

/// Backend hooks invoked once per frame, in order, with the target the pass
/// must render into.
pub trait FramePasses {
    /// Depth from the light's point of view, for every shadow caster.
    fn shadow(&mut self, target: TargetId);
    /// Lit color pass (box, floor, sky) reading the shadow map.
    fn beauty(&mut self, target: TargetId);
    /// Full-screen pass sampling the off-screen color target.
    fn post(&mut self, target: TargetId);
}

/// Deterministic per-frame pass scheduler.
///
/// Runs shadow, beauty, and post strictly in sequence against one shared
/// target stack. Each pass's outputs are fully submitted before the next
/// pass reads them; ordering is program order, nothing runs in parallel.
#[derive(Debug)]
pub struct FrameSchedule {
    stack: TargetStack<TargetId>,
    log: Vec<PassKind>,
}

impl Default for FrameSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSchedule {
    pub fn new() -> Self {
        Self {
            stack: TargetStack::new(TargetId::Surface),
            log: Vec::with_capacity(3),
        }
    }

    /// Execute one frame.
    ///
    /// The off-screen target is bound for the whole beauty phase; the shadow
    /// map is bound only inside its nested scope. The surface is guaranteed
    /// to be bound again when the post pass runs and when this returns.
    pub fn run_frame<P: FramePasses>(&mut self, passes: &mut P) {
        self.log.clear();
        let log = &mut self.log;
        self.stack.scoped(TargetId::Offscreen, |stack| {
            stack.scoped(TargetId::ShadowMap, |stack| {
                passes.shadow(*stack.current());
                log.push(PassKind::Shadow);
            });
            passes.beauty(*stack.current());
            log.push(PassKind::Beauty);
        });
        passes.post(*self.stack.current());
        self.log.push(PassKind::Post);
        debug_assert_eq!(*self.stack.current(), TargetId::Surface);
        tracing::trace!(passes = ?self.log, "frame submitted");
    }

    /// Submission order of the last frame, for verification.
    pub fn log(&self) -> &[PassKind] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every pass invocation with the target it was handed.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<(PassKind, TargetId)>,
    }

    impl FramePasses for Recorder {
        fn shadow(&mut self, target: TargetId) {
            self.calls.push((PassKind::Shadow, target));
        }
        fn beauty(&mut self, target: TargetId) {
            self.calls.push((PassKind::Beauty, target));
        }
        fn post(&mut self, target: TargetId) {
            self.calls.push((PassKind::Post, target));
        }
    }

    #[test]
    fn passes_run_in_fixed_order() {
        let mut schedule = FrameSchedule::new();
        let mut recorder = Recorder::default();
        schedule.run_frame(&mut recorder);
        assert_eq!(
            schedule.log(),
            &[PassKind::Shadow, PassKind::Beauty, PassKind::Post]
        );
    }

    #[test]
    fn each_pass_sees_its_target() {
        let mut schedule = FrameSchedule::new();
        let mut recorder = Recorder::default();
        schedule.run_frame(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                (PassKind::Shadow, TargetId::ShadowMap),
                (PassKind::Beauty, TargetId::Offscreen),
                (PassKind::Post, TargetId::Surface),
            ]
        );
    }

    #[test]
    fn shadow_is_submitted_before_beauty_reads_it() {
        // Ordering contract: the shadow map is fully written (submission
        // order) before the beauty pass samples it.
        let mut schedule = FrameSchedule::new();
        let mut recorder = Recorder::default();
        schedule.run_frame(&mut recorder);
        let shadow_idx = recorder
            .calls
            .iter()
            .position(|(k, _)| *k == PassKind::Shadow)
            .unwrap();
        let beauty_idx = recorder
            .calls
            .iter()
            .position(|(k, _)| *k == PassKind::Beauty)
            .unwrap();
        assert!(shadow_idx < beauty_idx);
    }

    #[test]
    fn repeated_frames_reset_the_log() {
        let mut schedule = FrameSchedule::new();
        let mut recorder = Recorder::default();
        schedule.run_frame(&mut recorder);
        schedule.run_frame(&mut recorder);
        assert_eq!(schedule.log().len(), 3);
        assert_eq!(recorder.calls.len(), 6);
    }
}
