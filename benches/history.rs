//! Performance benchmarks for history reconstruction and search.
//!
//! Run with: `cargo bench --bench history`
//!
//! ## Shapes
//!
//! | Benchmark | Tree shape | Notes |
//! |-----------|------------|-------|
//! | history/chain | Linear edit chain | Worst case for the root walk |
//! | history/fan | One root, many edits | Widest descendant level |
//! | search/advanced | Many pages | Full scan with tie ordering |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tokio::runtime::Runtime;

use social_wiki::store::InMemoryWikiStore;
use social_wiki::{NewUser, RevisionId, Session, Wiki, WikiConfig};

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn make_wiki(rt: &Runtime) -> (Wiki<InMemoryWikiStore>, Session) {
    let store = Arc::new(InMemoryWikiStore::new());
    let wiki = Wiki::new(Arc::clone(&store), WikiConfig::default());
    let session = rt.block_on(async {
        let (session, _) = wiki
            .signup(None, NewUser::new("benchUser", "bench", "user", "bench@example.com", "benchPassword"))
            .await
            .unwrap();
        session
    });
    (wiki, session)
}

/// Build a chain of `len` revisions and return the leaf.
fn make_chain(rt: &Runtime, wiki: &Wiki<InMemoryWikiStore>, session: &Session, len: usize) -> RevisionId {
    rt.block_on(async {
        let mut parent = -1;
        let mut last = RevisionId::new(-1);
        for i in 0..len {
            let page = wiki
                .create_page(Some(session), "chain", &format!("content {}", i), parent)
                .await
                .unwrap();
            last = page.id();
            parent = last.get();
        }
        last
    })
}

/// Build one root with `width` direct edits and return the root.
fn make_fan(rt: &Runtime, wiki: &Wiki<InMemoryWikiStore>, session: &Session, width: usize) -> RevisionId {
    rt.block_on(async {
        let root = wiki.create_page(Some(session), "fan", "root", -1).await.unwrap();
        for i in 0..width {
            wiki.create_page(Some(session), "fan", &format!("edit {}", i), root.id().get())
                .await
                .unwrap();
        }
        root.id()
    })
}

fn bench_history(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("history");

    for size in [10usize, 100, 500] {
        let (wiki, session) = make_wiki(&rt);
        let leaf = make_chain(&rt, &wiki, &session, size);
        let root = make_fan(&rt, &wiki, &session, size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("chain", size), &leaf, |b, leaf| {
            b.to_async(&rt).iter(|| async {
                let history = wiki.revisions().history(black_box(*leaf)).await.unwrap();
                assert_eq!(history.len(), size);
                history
            })
        });
        group.bench_with_input(BenchmarkId::new("fan", size), &root, |b, root| {
            b.to_async(&rt).iter(|| async {
                let history = wiki.revisions().history(black_box(*root)).await.unwrap();
                assert_eq!(history.len(), size + 1);
                history
            })
        });
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("search");

    for pages in [100usize, 1000] {
        let (wiki, session) = make_wiki(&rt);
        rt.block_on(async {
            for i in 0..pages {
                wiki.create_page(Some(&session), &format!("title {}", i % 50), &format!("body {}", i), -1)
                    .await
                    .unwrap();
            }
        });

        group.throughput(Throughput::Elements(pages as u64));
        group.bench_with_input(BenchmarkId::new("advanced", pages), &pages, |b, _| {
            b.to_async(&rt).iter(|| async {
                wiki.search(black_box("title 1"), "", "").await.unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("quick", pages), &pages, |b, _| {
            b.to_async(&rt).iter(|| async {
                wiki.quick_search(black_box("body 9")).await.unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_history, bench_search);
criterion_main!(benches);
