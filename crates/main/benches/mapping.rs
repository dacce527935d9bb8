//! Mapping benchmarks: normalize, denormalize and adapter lookup.

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use dictum::{Class, Configurable, ConfigFactory, Typed, Value};

#[derive(Debug, Default, Clone, Configurable)]
#[config(naming = "kebab-case")]
struct Endpoint {
    host: String,
    port: u16,
    #[config(optional)]
    weight: f64,
    tags: Vec<String>,
}

#[derive(Debug, Default, Clone, Configurable)]
struct Cluster {
    name: String,
    endpoints: Vec<Endpoint>,
}

fn cluster(size: usize) -> Cluster {
    Cluster {
        name: "primary".into(),
        endpoints: (0..size)
            .map(|i| Endpoint {
                host: format!("node-{i}.internal"),
                port: 9000 + (i % 1000) as u16,
                weight: 1.0 / (i + 1) as f64,
                tags: vec!["a".into(), "b".into()],
            })
            .collect(),
    }
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping");
    let factory = ConfigFactory::default();
    let input = cluster(1_000);

    group.throughput(Throughput::Elements(input.endpoints.len() as u64));
    group.bench_function("normalize", |b| {
        b.iter(|| factory.normalize(black_box(&input)).unwrap());
    });

    group.finish();
}

fn bench_denormalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("mapping");
    let factory = ConfigFactory::default();
    let input: Value = factory.normalize(&cluster(1_000)).unwrap().unwrap();

    group.throughput(Throughput::Elements(1_000));
    group.bench_function("denormalize", |b| {
        b.iter(|| factory.denormalize::<Cluster>(black_box(&input)).unwrap());
    });

    group.finish();
}

fn bench_adapter_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("adapter_lookup");
    let classes: Vec<Class> = vec![
        u8::class(),
        String::class(),
        Vec::<u32>::class(),
        Endpoint::class(),
    ];

    for (label, indexed, cacheable) in [
        ("simple", false, false),
        ("indexed", true, false),
        ("cached", false, true),
    ] {
        let factory = ConfigFactory::builder()
            .indexed(indexed)
            .cacheable(cacheable)
            .build();
        group.bench_function(label, |b| {
            b.iter(|| {
                for class in &classes {
                    black_box(factory.adapter(class));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_normalize, bench_denormalize, bench_adapter_lookup);
criterion_main!(benches);
