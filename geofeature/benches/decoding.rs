//! Benchmarks pour le décodage des réponses de service

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Value};

/// Réponse ArcGIS synthétique: `count` carrés avec un trou chacun
fn arcgis_response(count: usize) -> Vec<u8> {
    let features: Vec<Value> = (0..count)
        .map(|i| {
            let x0 = 500_000.0 + (i % 50) as f64 * 300.0;
            let y0 = 7_700_000.0 + (i / 50) as f64 * 300.0;
            json!({
                "attributes": {"OBJECTID": i, "NOME": format!("Area {}", i)},
                "geometry": {"rings": [
                    [[x0, y0], [x0, y0 + 200.0], [x0 + 200.0, y0 + 200.0], [x0 + 200.0, y0], [x0, y0]],
                    [[x0 + 50.0, y0 + 50.0], [x0 + 100.0, y0 + 50.0], [x0 + 100.0, y0 + 100.0], [x0 + 50.0, y0 + 100.0], [x0 + 50.0, y0 + 50.0]]
                ]}
            })
        })
        .collect();

    serde_json::to_vec(&json!({ "features": features })).unwrap_or_default()
}

fn bench_decode_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_response");

    for count in [10usize, 100, 1000] {
        let body = arcgis_response(count);
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &body, |b, body| {
            b.iter(|| {
                let result = geofeature::decode_response(black_box(body)).unwrap();
                black_box(result.features.len())
            })
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let attrs = match json!({
        "OBJECTID": 1,
        "CODIGO": "X-1",
        "SITUACAO": "Vigente",
        "DATA_VALIDADE": 1678881600000i64,
        "nm_empreendimento": "Fazenda Boa Vista"
    }) {
        Value::Object(map) => map,
        _ => return,
    };

    c.bench_function("resolve_with_fallback", |b| {
        b.iter(|| {
            black_box(geofeature::attributes::resolve_or_na(
                black_box(&attrs),
                &["inexistente", "outro"],
            ))
        })
    });
}

criterion_group!(benches, bench_decode_response, bench_resolve);
criterion_main!(benches);
