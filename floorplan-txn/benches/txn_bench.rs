use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use floorplan_model::{
    Constraint, Document, EntityClass, EntityRegistry, FieldDefault, FieldSpec,
};
use floorplan_txn::{
    CommitOptions, SessionOptions, SetFieldRequest, TransactionConfig, TransactionManager,
};
use floorplan_types::{ClassTag, DirtyKind, EntityId};
use serde_json::json;
use std::sync::Arc;

const FIELDS: &[FieldSpec] = &[FieldSpec::state("XLength", FieldDefault::Number(100.0))
    .constrained(Constraint::Positive)
    .dirties(DirtyKind::Geometry)];

struct BenchBox {
    tag: ClassTag,
}

impl EntityClass for BenchBox {
    fn tag(&self) -> &ClassTag {
        &self.tag
    }

    fn fields(&self) -> &[FieldSpec] {
        FIELDS
    }
}

fn document(entities: usize) -> (Document, Vec<EntityId>) {
    let mut registry = EntityRegistry::new();
    registry
        .register(BenchBox {
            tag: ClassTag::from_static("Box"),
        })
        .unwrap();
    let mut doc = Document::new(Arc::new(registry));
    let ids = (0..entities)
        .map(|_| doc.create_entity("Box").unwrap())
        .collect();
    (doc, ids)
}

fn bench_commit_undo_redo(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_undo_redo");
    for &n in &[10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let (mut doc, ids) = document(n);
                let mut manager = TransactionManager::new(TransactionConfig {
                    max_undo_steps: n,
                    ..TransactionConfig::default()
                });
                for (i, id) in ids.iter().enumerate() {
                    let request = SetFieldRequest::new(*id, "XLength", json!(200.0 + i as f64));
                    manager.commit(&mut doc, Box::new(request)).unwrap();
                }
                while manager.undo(&mut doc).unwrap() {}
                while manager.redo(&mut doc).unwrap() {}
                black_box(doc.len());
            })
        });
    }
    group.finish();
}

fn bench_merged_session(c: &mut Criterion) {
    let mut group = c.benchmark_group("merged_session");
    for &n in &[10usize, 100, 1_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let (mut doc, ids) = document(n);
                let mut manager = TransactionManager::default();
                let session = manager.start_session(SessionOptions::default());
                for id in &ids {
                    let request = SetFieldRequest::new(*id, "XLength", json!(250.0));
                    manager.commit(&mut doc, Box::new(request)).unwrap();
                }
                manager
                    .commit_session(session, CommitOptions::default())
                    .unwrap();
                manager.undo(&mut doc).unwrap();
                black_box(doc.len());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_commit_undo_redo, bench_merged_session);
criterion_main!(benches);
