use chunk_cache::ChunkStore;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use range_client::MemoryRangeFetcher;

const RESOURCE_LEN: u64 = 64 << 20; // 64 MB
const CHUNK_SIZE: u64 = 1 << 20; // 1 MB

fn benchmark_cache_hits(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fetcher = MemoryRangeFetcher::new("mem://bench", vec![7u8; RESOURCE_LEN as usize]);
    let store = ChunkStore::new(CHUNK_SIZE, RESOURCE_LEN).unwrap();

    rt.block_on(async {
        for index in 0..RESOURCE_LEN / CHUNK_SIZE {
            store.get_or_fetch(index, Some(RESOURCE_LEN), &fetcher).await.unwrap();
        }
    });

    c.bench_function("chunk_store_hit", |b| {
        let mut index = 0;
        b.iter(|| {
            index = (index + 17) % (RESOURCE_LEN / CHUNK_SIZE);
            rt.block_on(store.get_or_fetch(index, Some(RESOURCE_LEN), &fetcher)).unwrap()
        })
    });
}

fn benchmark_cache_churn(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let fetcher = MemoryRangeFetcher::new("mem://bench", vec![7u8; RESOURCE_LEN as usize]);

    let mut group = c.benchmark_group("chunk_store_churn");
    for resident_chunks in [2u64, 8, 32] {
        let store = ChunkStore::new(CHUNK_SIZE, resident_chunks * CHUNK_SIZE).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(resident_chunks), &store, |b, store| {
            let mut index = 0;
            b.iter(|| {
                index = (index + 1) % (RESOURCE_LEN / CHUNK_SIZE);
                rt.block_on(store.get_or_fetch(index, Some(RESOURCE_LEN), &fetcher)).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_cache_hits, benchmark_cache_churn);
criterion_main!(benches);
