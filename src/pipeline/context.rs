//! Cooperative execution context shared by all stages of one run.
//!
//! Stages process their work in chunks of `chunk_size` units. After each
//! chunk they call [`RunContext::checkpoint`], which forwards the fractional
//! progress to the host callback and polls the cancellation flag.
use crate::error::PipelineError;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Pipeline stage reported alongside progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Quantize,
    BuildFacets,
    StripCleanup,
    Reduce,
    Trace,
    Segment,
    Label,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 7] = [
        Stage::Quantize,
        Stage::BuildFacets,
        Stage::StripCleanup,
        Stage::Reduce,
        Stage::Trace,
        Stage::Segment,
        Stage::Label,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Quantize => "quantize",
            Stage::BuildFacets => "build_facets",
            Stage::StripCleanup => "strip_cleanup",
            Stage::Reduce => "reduce",
            Stage::Trace => "trace",
            Stage::Segment => "segment",
            Stage::Label => "label",
        }
    }
}

type ProgressFn<'a> = Box<dyn FnMut(Stage, f64) + 'a>;

pub struct RunContext<'a> {
    cancel: Option<&'a AtomicBool>,
    progress: Option<ProgressFn<'a>>,
    chunk_size: usize,
    current: Option<Stage>,
    next_checkpoint: usize,
}

impl Default for RunContext<'_> {
    fn default() -> Self {
        Self {
            cancel: None,
            progress: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            current: None,
            next_checkpoint: 0,
        }
    }
}

impl fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("cancel", &self.cancel.map(|c| c.load(Ordering::Relaxed)))
            .field("progress", &self.progress.is_some())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl<'a> RunContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel_flag(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn with_progress(mut self, callback: impl FnMut(Stage, f64) + 'a) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Number of work units between checkpoints. Clamped to at least 1.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }

    /// Report `fraction` of `stage` as done and fail with
    /// [`PipelineError::Cancelled`] when the flag is raised.
    pub fn checkpoint(&mut self, stage: Stage, fraction: f64) -> Result<(), PipelineError> {
        if let Some(progress) = self.progress.as_mut() {
            progress(stage, fraction.clamp(0.0, 1.0));
        }
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        Ok(())
    }

    /// Checkpoint once per completed chunk: `done` units out of `total`.
    /// A new stage, or a counter that went backwards, starts a new sequence.
    #[inline]
    pub(crate) fn tick(
        &mut self,
        stage: Stage,
        done: usize,
        total: usize,
    ) -> Result<(), PipelineError> {
        let restarted =
            self.current != Some(stage) || done + self.chunk_size < self.next_checkpoint;
        if !restarted && done < self.next_checkpoint {
            return Ok(());
        }
        self.current = Some(stage);
        self.next_checkpoint = done + self.chunk_size;
        let fraction = if total == 0 {
            1.0
        } else {
            done as f64 / total as f64
        };
        self.checkpoint(stage, fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_reports_and_cancels() {
        let flag = AtomicBool::new(false);
        let mut seen = Vec::new();
        {
            let mut ctx = RunContext::new()
                .with_cancel_flag(&flag)
                .with_progress(|stage, f| seen.push((stage, f)))
                .with_chunk_size(2);
            assert!(ctx.tick(Stage::Reduce, 0, 4).is_ok());
            assert!(ctx.tick(Stage::Reduce, 1, 4).is_ok());
            assert!(ctx.tick(Stage::Reduce, 2, 4).is_ok());
            flag.store(true, Ordering::Relaxed);
            assert!(ctx.tick(Stage::Reduce, 3, 4).is_ok());
            let err = ctx.tick(Stage::Reduce, 4, 4).expect_err("cancel observed");
            assert!(err.is_cancelled());
        }
        assert_eq!(
            seen,
            vec![
                (Stage::Reduce, 0.0),
                (Stage::Reduce, 0.5),
                (Stage::Reduce, 1.0)
            ]
        );
    }

    #[test]
    fn stage_switch_forces_checkpoint() {
        let mut stages = Vec::new();
        {
            let mut ctx = RunContext::new()
                .with_progress(|stage, _| stages.push(stage))
                .with_chunk_size(100);
            ctx.tick(Stage::Trace, 0, 10).expect("not cancelled");
            ctx.tick(Stage::Trace, 5, 10).expect("not cancelled");
            ctx.tick(Stage::Segment, 5, 10).expect("not cancelled");
        }
        assert_eq!(stages, vec![Stage::Trace, Stage::Segment]);
    }
}
