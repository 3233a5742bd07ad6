use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rangeline_core::delimiter::Delimiter;
use rangeline_core::splitter::RecordSplitter;
use rangeline_io::{MemoryObjectStore, RangedRecordReader, ReaderOptions};

fn make_log(lines: usize, delimiter: &str) -> Vec<u8> {
    let mut out = String::with_capacity(lines * 64);
    for i in 0..lines {
        out.push_str(&format!(
            "2024-01-01T00:00:{:02}Z level=info request_id={i} status={}",
            i % 60,
            200 + (i % 5)
        ));
        out.push_str(delimiter);
    }
    out.into_bytes()
}

fn bench_splitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("splitter");
    for delimiter in ["\n", "\r\n", "<END>"] {
        let data = make_log(10_000, delimiter);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(delimiter.escape_debug()),
            &data,
            |b, data| {
                b.iter(|| {
                    let mut splitter = RecordSplitter::new(Delimiter::try_from(delimiter).unwrap());
                    let mut n = 0usize;
                    for chunk in data.chunks(4096) {
                        splitter.push(chunk);
                        while splitter.next_record().is_some() {
                            n += 1;
                        }
                    }
                    let _ = splitter.finish();
                    n
                })
            },
        );
    }
    group.finish();
}

fn bench_reader_chunk_sizes(c: &mut Criterion) {
    let data = make_log(10_000, "\n");
    let store = MemoryObjectStore::new();
    store.insert("bench", "app.log", data.clone());

    let mut group = c.benchmark_group("ranged_reader");
    group.throughput(Throughput::Bytes(data.len() as u64));
    for chunk_size in [255u64, 4_095, 65_535] {
        group.bench_with_input(
            BenchmarkId::from_parameter(chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let options = ReaderOptions {
                        chunk_size,
                        ..Default::default()
                    };
                    let mut reader =
                        RangedRecordReader::new(Arc::new(store.clone()), "bench", "app.log", options)
                            .unwrap();
                    reader.records(None).unwrap().map(|r| r.unwrap()).count()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_splitter, bench_reader_chunk_sizes);
criterion_main!(benches);
