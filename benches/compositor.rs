use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use screen_studio::{
    backgrounds::{Backdrop, BackdropRegistry, PRESET_COUNT},
    composition::{ContainerLayout, FrameCompositor, FrameSource, QualityTier},
    video::{Frame, SyntheticVideo},
};

fn bench_render_frame(c: &mut Criterion) {
    let registry = BackdropRegistry::new();
    let layout = ContainerLayout::fit_width(1280, 720, 720.0, 40.0).with_corner_radius(12.0);
    let mut group = c.benchmark_group("render_frame");
    group.sample_size(20);

    for quality in [QualityTier::Hd720, QualityTier::Hd1080] {
        let backdrop = registry.get_backdrop("preset-3").expect("preset-3 is built in");
        let compositor = FrameCompositor::new(layout, backdrop);
        let (width, height) = compositor.canvas_size(quality);
        let mut target = Frame::new_transparent(width, height);
        let mut video = SyntheticVideo::new(1280, 720, 30.0, 10.0);

        group.bench_with_input(BenchmarkId::from_parameter(quality), &quality, |b, _| {
            b.iter(|| {
                compositor
                    .render_frame(&mut video, black_box(&mut target))
                    .expect("render");
            })
        });
    }

    group.finish();
}

fn bench_backdrop_presets(c: &mut Criterion) {
    let registry = BackdropRegistry::new();
    let mut frame = Frame::new_transparent(1800, 1100);

    c.bench_function("paint_all_presets", |b| {
        b.iter(|| {
            for index in 0..PRESET_COUNT {
                if let Some(backdrop) = registry.preset(index) {
                    backdrop.paint(black_box(&mut frame)).expect("paint");
                }
            }
        })
    });
}

criterion_group!(benches, bench_render_frame, bench_backdrop_presets);
criterion_main!(benches);
