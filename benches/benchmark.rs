use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::RgbImage;
use recompress::codecs::{JpegCodec, WebpCodec};
use recompress::config::SearchConfig;
use recompress::engine::bisect;
use recompress::metrics::Metric;
use recompress::plane::{LumaPlane, OriginalImage};
use std::hint::black_box;

fn create_test_image(width: u32, height: u32) -> OriginalImage {
    let rgb = RgbImage::from_fn(width, height, |x, y| {
        let texture = (x as f32 / 5.0).sin() * (y as f32 / 7.0).cos();
        image::Rgb([(x % 256) as u8, (y % 256) as u8, (128.0 + 60.0 * texture) as u8])
    });
    OriginalImage::from_rgb(rgb.into_raw(), width, height).unwrap()
}

/// A slightly noisy copy of `plane`, standing in for a decoded candidate.
fn perturbed(plane: &LumaPlane) -> LumaPlane {
    let data = plane
        .as_slice()
        .iter()
        .enumerate()
        .map(|(i, &v)| v.wrapping_add((i % 5) as u8))
        .collect();
    LumaPlane::new(plane.width(), plane.height(), data).unwrap()
}

pub fn metrics_benchmark(c: &mut Criterion) {
    let original = create_test_image(512, 512);
    let candidate = perturbed(original.luma());

    let mut group = c.benchmark_group("metrics_512");
    for metric in Metric::ALL {
        group.bench_function(BenchmarkId::from_parameter(metric), |b| {
            b.iter(|| {
                metric
                    .evaluator()
                    .score(black_box(original.luma()), black_box(&candidate))
                    .unwrap()
            })
        });
    }
    group.finish();
}

pub fn search_benchmark(c: &mut Criterion) {
    let original = create_test_image(256, 256);
    let config = SearchConfig::default();
    let target = 0.9999;

    let mut group = c.benchmark_group("bisect_256");
    group.sample_size(10);
    group.bench_function("jpeg_ssim", |b| {
        b.iter(|| {
            bisect(
                &JpegCodec::default(),
                black_box(&original),
                Metric::Ssim.evaluator(),
                target,
                &config,
            )
            .unwrap()
        })
    });
    group.bench_function("webp_ssim", |b| {
        b.iter(|| {
            bisect(
                &WebpCodec,
                black_box(&original),
                Metric::Ssim.evaluator(),
                target,
                &config,
            )
            .unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, metrics_benchmark, search_benchmark);
criterion_main!(benches);
