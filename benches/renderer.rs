use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use stepchart::drawio::MxGraphDiagramBuilder;
use stepchart::ids::RandomIds;
use stepchart::svg::SvgDiagramBuilder;
use stepchart::text::TextLayoutMeasurer;
use stepchart::theme::Theme;
use stepchart::DiagramPipeline;

fn procedure(steps: usize) -> Vec<String> {
    (0..steps)
        .map(|i| {
            format!(
                "**Step {}: prepare the list**\nCollect the employees due for the periodic check, \
                 attach the hazard factors for each position and send the list to the supervising \
                 office no later than ten working days after approval ({}).",
                i + 1,
                i
            )
        })
        .collect()
}

fn bench_builders(c: &mut Criterion) {
    let theme = Theme::classic();
    let mut group = c.benchmark_group("builders");
    for size in [1usize, 8, 32] {
        let steps = procedure(size);
        group.bench_with_input(BenchmarkId::new("svg", size), &steps, |b, steps| {
            let builder = SvgDiagramBuilder::new(&theme, TextLayoutMeasurer::fast());
            b.iter(|| black_box(builder.build(black_box(steps), "Benchmark").unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("drawio", size), &steps, |b, steps| {
            let ids = RandomIds;
            let builder = MxGraphDiagramBuilder::new(&theme, &ids);
            b.iter(|| black_box(builder.build(black_box(steps), "Benchmark")))
        });
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let pipeline = DiagramPipeline::default();
    let steps = procedure(8);
    c.bench_function("pipeline/8_steps", |b| {
        b.iter(|| black_box(pipeline.generate(black_box(&steps), "Benchmark").unwrap()))
    });
}

criterion_group!(benches, bench_builders, bench_pipeline);
criterion_main!(benches);
