use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const WARM: [u8; 3] = [210, 60, 40];
pub const COOL: [u8; 3] = [30, 90, 200];

/// RGBA8 image where `inside(x, y)` picks `fg`, everything else `bg`.
pub fn two_tone_rgba(
    width: usize,
    height: usize,
    fg: [u8; 3],
    bg: [u8; 3],
    inside: impl Fn(usize, usize) -> bool,
) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    let mut img = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = if inside(x, y) { fg } else { bg };
            img.extend_from_slice(&[r, g, b, 255]);
        }
    }
    img
}

/// 4×4 image: a 2×2 square in the top-right corner and the L-shape around it.
pub fn corner_square_rgba() -> Vec<u8> {
    two_tone_rgba(4, 4, COOL, WARM, |x, y| x >= 2 && y < 2)
}

/// Square island of side `side` with its top-left pixel at (x0, y0).
pub fn island_rgba(width: usize, height: usize, x0: usize, y0: usize, side: usize) -> Vec<u8> {
    two_tone_rgba(width, height, COOL, WARM, |x, y| {
        (x0..x0 + side).contains(&x) && (y0..y0 + side).contains(&y)
    })
}

/// Blocks of `block × block` pixels, each painted with one of `colors`
/// drawn by a seeded RNG.
pub fn random_blocks_rgba(
    width: usize,
    height: usize,
    block: usize,
    colors: &[[u8; 3]],
    seed: u64,
) -> Vec<u8> {
    assert!(block > 0, "block size must be positive");
    assert!(!colors.is_empty(), "need at least one colour");
    let mut rng = StdRng::seed_from_u64(seed);
    let bw = width.div_ceil(block);
    let bh = height.div_ceil(block);
    let picks: Vec<[u8; 3]> = (0..bw * bh)
        .map(|_| colors[rng.gen_range(0..colors.len())])
        .collect();
    let mut img = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            let [r, g, b] = picks[(y / block) * bw + x / block];
            img.extend_from_slice(&[r, g, b, 255]);
        }
    }
    img
}

pub const PALETTE6: [[u8; 3]; 6] = [
    [240, 240, 240],
    [20, 20, 20],
    [200, 40, 40],
    [40, 180, 60],
    [40, 60, 200],
    [230, 200, 40],
];
