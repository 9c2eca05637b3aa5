use criterion::{black_box, criterion_group, criterion_main, Criterion};
use liquidrust::{Context, Engine, Value};

fn bench_parse(c: &mut Criterion) {
    let engine = Engine::new();
    let src = "pages | map: 'category' | compact | sort | join: ', '";
    c.bench_function("parse_filter_chain", |b| {
        b.iter(|| engine.parse(black_box(src)).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let engine = Engine::new();
    let mut ctx = Context::new();
    ctx.set(
        "pages",
        Value::Array(
            (0..50)
                .map(|i| {
                    let mut m = liquidrust::ValueMap::new();
                    if i % 3 != 0 {
                        m.insert("category".into(), Value::from(format!("cat-{}", i % 7)));
                    }
                    Value::Map(m)
                })
                .collect(),
        ),
    );
    let expr = engine
        .parse("pages | map: 'category' | compact | sort | join: ', '")
        .unwrap();
    c.bench_function("evaluate_filter_chain", |b| {
        b.iter(|| engine.evaluate(black_box(&expr), &ctx).unwrap())
    });
}

fn bench_end_to_end(c: &mut Criterion) {
    let engine = Engine::new();
    let mut ctx = Context::new();
    ctx.set("title", "liquid templates in rust");
    c.bench_function("render_string_chain", |b| {
        b.iter(|| {
            engine
                .render(
                    black_box("title | capitalize | truncate: 18 | append: '!'"),
                    &ctx,
                )
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_end_to_end);
criterion_main!(benches);
