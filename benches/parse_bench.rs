//! Benchmarks for parsing and serialization.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn build_document(items: usize) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <catalog xmlns=\"urn:catalog\" xmlns:m=\"urn:meta\">",
    );
    for i in 0..items {
        xml.push_str(&format!(
            "<item id=\"{i}\" m:rank=\"{}\"><name>Item {i}</name>\
             <note>fish &amp; chips &#8364;{}</note></item>",
            i % 7,
            i % 100,
        ));
    }
    xml.push_str("</catalog>");
    xml
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for items in [10usize, 100, 1000] {
        let xml = build_document(items);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_function(format!("items_{items}"), |b| {
            b.iter(|| arenaxml::parse(black_box(xml.as_bytes())).unwrap())
        });
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let xml = build_document(1000);
    let doc = arenaxml::parse(xml.as_bytes()).unwrap();
    let mut group = c.benchmark_group("write");
    group.throughput(Throughput::Bytes(xml.len() as u64));
    group.bench_function("compact", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(xml.len());
            assert!(arenaxml::write(black_box(&doc), &mut out, false));
            out
        })
    });
    group.bench_function("pretty", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(2 * xml.len());
            assert!(arenaxml::write(black_box(&doc), &mut out, true));
            out
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_write);
criterion_main!(benches);
