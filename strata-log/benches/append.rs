use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use strata_log::{Log, LogOptions, NodeStore, StorageSpec};
use strata_storage::{BlobStore, CborEncoder};

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    for optimal_slab_bytes in [4096u64, 65536] {
        group.bench_with_input(
            BenchmarkId::from_parameter(optimal_slab_bytes),
            &optimal_slab_bytes,
            |b, &optimal_slab_bytes| {
                b.to_async(tokio::runtime::Runtime::new().unwrap())
                    .iter(|| async move {
                        let store = NodeStore::new(
                            CborEncoder,
                            BlobStore::default(),
                            StorageSpec::single("mem://blobs/bench".parse().unwrap()),
                        )
                        .unwrap();
                        let mut log = Log::new(LogOptions {
                            branching_factor: 32,
                            max_inline_bytes: 1024,
                            optimal_slab_bytes,
                        })
                        .unwrap();

                        for index in 0..1000 {
                            log = log
                                .append(format!("message-{index}"), &store)
                                .await
                                .unwrap();
                        }

                        log
                    });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_append);
criterion_main!(benches);
