//! Scratch buffers reused across the stages of a run.
use crate::border::WallGrids;
use crate::facets::FillScratch;

/// Flood-fill bitmap and wall-occupancy grids, sized to the current image.
/// The fill scratch is shared by the builder and the reducer, which never
/// run at the same time.
pub struct PipelineWorkspace {
    pub(crate) fill: FillScratch,
    pub(crate) walls: WallGrids,
}

impl Default for PipelineWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineWorkspace {
    pub fn new() -> Self {
        Self {
            fill: FillScratch::new(0, 0),
            walls: WallGrids::new(0, 0),
        }
    }

    /// Prepare buffers for a `width × height` image.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.fill.reset(width, height);
        self.walls.reset(width, height);
    }
}
