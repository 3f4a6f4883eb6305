use criterion::{black_box, criterion_group, criterion_main, Criterion};
use statcard::card::{drag_element, layout_card, render_svg, CanvasSize, Point, StatId};
use statcard::models::{CardDesign, StravaActivity};
use std::fs;

fn benchmark_card(c: &mut Criterion) {
    let fixture = fs::read_to_string("tests/fixtures/activity_16906743520.json")
        .expect("Failed to read fixture");
    let activity: StravaActivity = serde_json::from_str(&fixture).expect("Failed to parse fixture");

    // Every stat, with the route drawn behind them
    let design = CardDesign {
        stats: StatId::ALL.to_vec(),
        show_route: true,
        ..CardDesign::default()
    };
    let canvas = CanvasSize::new(384.0, 2.0);
    let layout = layout_card(&activity, &design, canvas);

    let mut group = c.benchmark_group("card");

    group.bench_function("layout_all_stats", |b| {
        b.iter(|| layout_card(black_box(&activity), black_box(&design), canvas))
    });

    group.bench_function("render_svg_with_route", |b| {
        b.iter(|| render_svg(black_box(&layout), activity.summary_polyline()))
    });

    group.bench_function("drag_with_snapping", |b| {
        b.iter(|| drag_element(black_box(&layout), StatId::Distance, Point { x: 190.0, y: 333.0 }))
    });

    group.finish();
}

criterion_group!(benches, benchmark_card);
criterion_main!(benches);
