//! Screenshot pipeline benchmarks
//!
//! Measures the CPU-side work of a `take_screenshot` call on 1080p and 4K
//! buffers: encoding, OCR downscaling, detector preprocessing and DB box
//! extraction. Model inference is not included.

use criterion::{Criterion, criterion_group, criterion_main};
use desktop_core::{
    capture::ImageBuffer,
    model::ImageFormat,
    ocr::{
        db_postprocess::{DbParams, extract_boxes},
        preprocess::det_input,
    },
    util::encode::encode_image,
};
use std::hint::black_box;

fn create_test_image(width: u32, height: u32) -> ImageBuffer {
    ImageBuffer::from_test_pattern(width, height)
}

/// Probability map with a grid of text-line shaped blobs
fn create_probability_map(width: usize, height: usize) -> Vec<f32> {
    let mut probs = vec![0.0f32; width * height];
    for row in (8..height.saturating_sub(16)).step_by(32) {
        for col in (8..width.saturating_sub(120)).step_by(160) {
            for y in row..row + 12 {
                for x in col..col + 110 {
                    probs[y * width + x] = 0.9;
                }
            }
        }
    }
    probs
}

fn bench_png_encoding_1080p(c: &mut Criterion) {
    let img = create_test_image(1920, 1080);

    c.bench_function("encode_png_1080p", |b| {
        b.iter(|| {
            encode_image(black_box(&img), black_box(ImageFormat::Png)).unwrap();
        });
    });
}

fn bench_png_encoding_4k(c: &mut Criterion) {
    let img = create_test_image(3840, 2160);

    c.bench_function("encode_png_4k", |b| {
        b.iter(|| {
            encode_image(black_box(&img), black_box(ImageFormat::Png)).unwrap();
        });
    });
}

fn bench_jpeg_encoding_4k(c: &mut Criterion) {
    let img = create_test_image(3840, 2160);

    c.bench_function("encode_jpeg_4k", |b| {
        b.iter(|| {
            encode_image(black_box(&img), black_box(ImageFormat::Jpeg)).unwrap();
        });
    });
}

fn bench_ocr_downscale(c: &mut Criterion) {
    let img = create_test_image(3840, 2160);

    c.bench_function("scale_50_percent_4k", |b| {
        b.iter(|| {
            black_box(&img).scale_percent(black_box(50)).unwrap();
        });
    });
}

fn bench_detector_preprocess(c: &mut Criterion) {
    let img = create_test_image(1920, 1080);

    c.bench_function("det_input_1080p", |b| {
        b.iter(|| {
            det_input(black_box(&img), black_box(960));
        });
    });
}

fn bench_box_extraction(c: &mut Criterion) {
    let (width, height) = (960, 544);
    let probs = create_probability_map(width, height);

    c.bench_function("extract_boxes_960x544", |b| {
        b.iter(|| {
            extract_boxes(
                black_box(&probs),
                width,
                height,
                1920,
                1080,
                DbParams::default(),
            );
        });
    });
}

criterion_group!(
    benches,
    bench_png_encoding_1080p,
    bench_png_encoding_4k,
    bench_jpeg_encoding_4k,
    bench_ocr_downscale,
    bench_detector_preprocess,
    bench_box_extraction
);
criterion_main!(benches);
