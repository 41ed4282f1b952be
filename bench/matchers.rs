use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cv_stereo_match::prelude::*;
use image::{GrayImage, Luma};

/// Textured pair where the right image is the left shifted by `shift` columns.
fn scene(width: u32, height: u32, shift: u32) -> StereoFrame {
    let mut state = 0x5eed_u64;
    let base = GrayImage::from_fn(width + shift, height, |_, _| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        Luma([(state >> 56) as u8])
    });

    let left = GrayImage::from_fn(width, height, |x, y| *base.get_pixel(x, y));
    let right = GrayImage::from_fn(width, height, |x, y| *base.get_pixel(x + shift, y));

    StereoFrame::new(GrayFloatImage::from_luma(&left), GrayFloatImage::from_luma(&right))
        .unwrap()
}

fn matchers_bench(c: &mut Criterion) {

    // Build frame
    let frame = scene(160, 120, 12);
    let bbox = BoundingBox::full(frame.width(), frame.height());

    // Build disparity algs
    let fast = FastBlockMatcher::new(FastParams {
        max_disparity: 32,
        ..FastParams::default()
    });
    let adaptive = AdaptiveMatcher::new(AdaptiveParams {
        max_disparity: 32,
        ..AdaptiveParams::default()
    });

    // Benchmark compute functions
    c.bench_function("fast 160x120", |b| b.iter(|| fast.compute(black_box(&frame), &bbox)));
    c.bench_function("adaptive 160x120", |b| {
        b.iter(|| adaptive.compute(black_box(&frame), &bbox))
    });
}

criterion_group!(benches, matchers_bench);
criterion_main!(benches);
