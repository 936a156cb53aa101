use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::Utc;
use serde_json::json;
use talentflow_core::TenantId;
use talentflow_infra::store::{InMemoryRecruitingStore, RecruitingStore};
use talentflow_infra::tasks::{QueueConfig, QueueName, TaskQueue};
use talentflow_recruiting::{Customer, Job, TextVersion, next_version_number};

fn payload() -> serde_json::Value {
    json!({ "jobId": "0190d5f0-0000-7000-8000-000000000000", "tenantId": "0190d5f0-0000-7000-8000-000000000001" })
}

fn bench_enqueue_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("enqueue_throughput");

    for batch_size in [1usize, 100, 1_000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::new("enqueue_batch", batch_size),
            batch_size,
            |b, &batch_size| {
                b.iter_with_setup(
                    || TaskQueue::new(QueueName::TextGeneration, QueueConfig::default()),
                    |queue| {
                        for _ in 0..batch_size {
                            black_box(queue.enqueue(payload(), None).ok());
                        }
                    },
                );
            },
        );
    }

    group.finish();
}

fn bench_claim_complete_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("claim_complete_cycle");
    group.sample_size(500);

    group.bench_function("enqueue_claim_complete", |b| {
        let queue = TaskQueue::new(QueueName::Email, QueueConfig::default());
        b.iter(|| {
            let handle = queue.enqueue(payload(), None).ok();
            if let Some(task) = queue.try_claim() {
                queue.complete(task.id, json!({ "ok": true }), Utc::now());
            }
            black_box(handle);
        });
    });

    group.bench_function("priority_ordering_with_backlog", |b| {
        let queue = TaskQueue::new(QueueName::Publication, QueueConfig::default());
        for i in 0..1_000u32 {
            let _ = queue.enqueue(payload(), Some(i % 10));
        }
        b.iter(|| {
            let _ = queue.enqueue(payload(), Some(1));
            black_box(queue.try_claim().map(|t| t.id));
        });
    });

    group.finish();
}

fn bench_version_numbering(c: &mut Criterion) {
    let mut group = c.benchmark_group("version_numbering");

    for existing in [10u32, 100, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("append_text_version", existing),
            existing,
            |b, &existing| {
                let store = InMemoryRecruitingStore::new();
                let tenant = TenantId::new();
                let customer = Customer::new(tenant, "Bench");
                let job = Job::draft(customer.id, "Bench Job");
                let _ = store.insert_customer(customer);
                let _ = store.insert_job(tenant, job.clone());
                for v in 1..=existing {
                    let _ = store.insert_text_version(tenant, text_version(&job, v));
                }

                b.iter(|| {
                    let next = store
                        .text_versions(tenant, job.id)
                        .map(|vs| next_version_number(vs.iter().map(|v| v.version)))
                        .unwrap_or(1);
                    black_box(next)
                });
            },
        );
    }

    group.finish();
}

fn text_version(job: &Job, version: u32) -> TextVersion {
    TextVersion {
        job_id: job.id,
        version,
        content: "Bench posting".to_string(),
        prompt: None,
        model: "mock-template".to_string(),
        created_at: Utc::now(),
    }
}

criterion_group!(
    benches,
    bench_enqueue_throughput,
    bench_claim_complete_cycle,
    bench_version_numbering
);
criterion_main!(benches);
