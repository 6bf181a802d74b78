//! One-pixel-wide strip removal on the colour-index map.
use crate::error::PipelineError;
use crate::image::Grid;
use crate::pipeline::context::{RunContext, Stage};
use log::debug;

/// Recolour interior pixels that sit between two equal-coloured pixels of
/// another colour: vertical pair first, then horizontal pair. Updates happen
/// in place, so a pixel sees the already-updated pixels above and left of it.
/// Returns the number of recoloured pixels.
pub fn cleanup_narrow_strips(
    colors: &mut Grid<u8>,
    ctx: &mut RunContext<'_>,
) -> Result<usize, PipelineError> {
    let (w, h) = (colors.width(), colors.height());
    let mut changed = 0usize;
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let own = colors.at(x, y);
            let top = colors.at(x, y - 1);
            let bottom = colors.at(x, y + 1);
            let left = colors.at(x - 1, y);
            let right = colors.at(x + 1, y);
            if top == bottom && top != own {
                colors.set(x, y, top);
                changed += 1;
            } else if left == right && left != own {
                colors.set(x, y, left);
                changed += 1;
            }
        }
        ctx.tick(Stage::StripCleanup, y * w, w * h)?;
    }
    debug!("cleanup_narrow_strips w={w} h={h} changed={changed}");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_strip_is_removed() {
        #[rustfmt::skip]
        let mut colors = Grid::from_vec(4, 3, vec![
            0, 0, 0, 0,
            1, 1, 1, 1,
            0, 0, 0, 0,
        ]).expect("valid grid");
        let n = cleanup_narrow_strips(&mut colors, &mut RunContext::default()).expect("ran");
        assert_eq!(n, 2);
        assert_eq!(colors.row(1), &[1, 0, 0, 1], "edge pixels are never touched");
    }

    #[test]
    fn thick_regions_are_kept() {
        #[rustfmt::skip]
        let mut colors = Grid::from_vec(4, 4, vec![
            0, 0, 1, 1,
            0, 0, 1, 1,
            0, 0, 1, 1,
            0, 0, 1, 1,
        ]).expect("valid grid");
        let before = colors.clone();
        let n = cleanup_narrow_strips(&mut colors, &mut RunContext::default()).expect("ran");
        assert_eq!(n, 0);
        assert_eq!(colors, before);
    }
}
