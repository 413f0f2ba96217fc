use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use deploycheck::core::inventory::AssetInventory;
use deploycheck::core::reconcile;
use deploycheck::core::refs::{ReferenceExtractor, ReferenceIndex};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn synthetic_source(files: usize) -> Vec<(String, String)> {
    (0..files)
        .map(|i| {
            let body = format!(
                "import Image from 'next/image';\n\
                 export default function Card{i}() {{\n\
                   return <div style={{{{ backgroundImage: `url(/images/bg-{bg}.jpg)` }}}}>\n\
                     <Image src=\"/images/card-{i}.png\" alt=\"card\" />\n\
                     <a href=\"https://cdn.example.com/images/remote.png\">x</a>\n\
                   </div>;\n\
                 }}\n",
                i = i,
                bg = i % 7
            );
            (format!("components/Card{}.jsx", i), body)
        })
        .collect()
}

/// Benchmark reference extraction over generated component sources
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    group.measurement_time(Duration::from_secs(5));
    let extractor = ReferenceExtractor::default();

    for files in [10usize, 100, 1000] {
        let sources = synthetic_source(files);
        group.bench_with_input(BenchmarkId::from_parameter(files), &sources, |b, sources| {
            b.iter(|| {
                let mut index = ReferenceIndex::new();
                for (origin, body) in sources {
                    index.extend(extractor.extract_from(origin, body));
                }
                black_box(index.len());
            });
        });
    }
    group.finish();
}

/// Benchmark reconciliation of an index against an on-disk inventory
fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconcile");
    let extractor = ReferenceExtractor::default();
    let exts = vec!["png".to_string(), "jpg".to_string()];

    for files in [100usize, 1000] {
        let temp_dir = TempDir::new().unwrap();
        for i in (0..files).step_by(2) {
            fs::write(temp_dir.path().join(format!("card-{}.png", i)), "x").unwrap();
        }
        let inventory = AssetInventory::load(temp_dir.path(), &exts, false).unwrap();
        let mut index = ReferenceIndex::new();
        for (origin, body) in synthetic_source(files) {
            index.extend(extractor.extract_from(&origin, &body));
        }

        group.bench_with_input(BenchmarkId::from_parameter(files), &files, |b, _| {
            b.iter(|| black_box(reconcile::reconcile(&index, &inventory)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extraction, bench_reconcile);
criterion_main!(benches);
