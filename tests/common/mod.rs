#![allow(dead_code)]

use rand::Rng;
use rand_distr::{Distribution, Geometric};

pub fn hash(px: [u8; 4]) -> u8 {
    let r = px[0].wrapping_mul(3);
    let g = px[1].wrapping_mul(5);
    let b = px[2].wrapping_mul(7);
    let a = px[3].wrapping_mul(11);
    r.wrapping_add(g).wrapping_add(b).wrapping_add(a) % 64
}

pub fn header_bytes(width: u32, height: u32, channels: u8, colorspace: u8) -> Vec<u8> {
    let mut out = b"qoif".to_vec();
    out.extend(width.to_be_bytes());
    out.extend(height.to_be_bytes());
    out.extend([channels, colorspace]);
    out
}

pub const PADDING: [u8; 8] = [0, 0, 0, 0, 0, 0, 0, 1];

struct GenState {
    index: [[u8; 4]; 64],
    pixels: Vec<u8>,
    prev: [u8; 4],
    len: usize,
}

impl GenState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: [[0; 4]; 64],
            pixels: Vec::with_capacity(capacity * 4),
            prev: [0, 0, 0, 0xff],
            len: 0,
        }
    }

    pub fn write(&mut self, px: [u8; 4]) {
        self.index[hash(px) as usize] = px;
        self.pixels.extend(px);
        self.prev = px;
        self.len += 1;
    }

    pub fn pick_from_index(&self, rng: &mut impl Rng) -> [u8; 4] {
        self.index[rng.random_range(0_usize..64)]
    }
}

/// Random pixel source biased towards whichever ops its weights favour, so
/// that every op kind shows up in long streams.
pub struct ImageGen {
    p_new: f64,
    p_index: f64,
    p_repeat: f64,
    p_diff: f64,
    p_luma: f64,
    p_alpha: f64,
}

impl ImageGen {
    pub fn new_random(rng: &mut impl Rng) -> Self {
        let p = [0; 7].map(|_| rng.random::<f64>());
        let t = p.iter().sum::<f64>();
        Self {
            p_new: p[0] / t,
            p_index: p[1] / t,
            p_repeat: p[2] / t,
            p_diff: p[3] / t,
            p_luma: p[4] / t,
            p_alpha: p[5] / t,
        }
    }

    pub fn generate(&self, rng: &mut impl Rng, n_pixels: usize) -> Vec<u8> {
        let mut s = GenState::with_capacity(n_pixels);
        let repeat = Geometric::new(0.05).unwrap();

        while s.len < n_pixels {
            let mut p = rng.random_range(0.0..1.0);

            if p < self.p_new {
                s.write([0; 4].map(|_| rng.random()));
                continue;
            }
            p -= self.p_new;

            if p < self.p_index {
                let px = s.pick_from_index(rng);
                s.write(px);
                continue;
            }
            p -= self.p_index;

            if p < self.p_repeat {
                let px = s.prev;
                let n_repeat = 1 + repeat.sample(rng).min(200) as usize;
                for _ in 0..n_repeat {
                    s.write(px);
                }
                continue;
            }
            p -= self.p_repeat;

            if p < self.p_diff {
                let mut px = s.prev;
                let d = [0; 3].map(|_| rng.random_range(0_u8..4).wrapping_sub(2));
                px[0] = px[0].wrapping_add(d[0]);
                px[1] = px[1].wrapping_add(d[1]);
                px[2] = px[2].wrapping_add(d[2]);
                s.write(px);
                continue;
            }
            p -= self.p_diff;

            if p < self.p_luma {
                let mut px = s.prev;
                let vg = rng.random_range(0_u8..64).wrapping_sub(32);
                let vr = rng.random_range(0_u8..16).wrapping_sub(8).wrapping_add(vg);
                let vb = rng.random_range(0_u8..16).wrapping_sub(8).wrapping_add(vg);
                px[0] = px[0].wrapping_add(vr);
                px[1] = px[1].wrapping_add(vg);
                px[2] = px[2].wrapping_add(vb);
                s.write(px);
                continue;
            }
            p -= self.p_luma;

            if p < self.p_alpha {
                let mut px = s.prev;
                px[3] = rng.random();
                s.write(px);
                continue;
            }

            s.write([0, 0, 0, 0xff]);
        }

        s.pixels.truncate(n_pixels * 4);
        s.pixels
    }
}
