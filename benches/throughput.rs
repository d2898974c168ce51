use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use agent_trends::{
    agent::AgentRecord,
    core::roster::Roster,
    engine::{delta::compute_delta, tracker::DeltaEngine},
    persist::memory::MemorySnapshotStore,
};
use chrono::{Days, NaiveDate};

fn roster(offset: u64, range: std::ops::Range<u64>) -> Roster {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date") + Days::new(offset);
    Roster::from_records(
        date,
        range.map(|i| {
            AgentRecord::new(format!("{i:08x}-agent")).with_attribute("name", format!("host-{i}"))
        }),
    )
    .expect("roster")
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_delta");
    for n in [1_000u64, 10_000, 50_000] {
        let previous = roster(0, 0..n);
        // 10% churn in each direction
        let current = roster(1, n / 10..n + n / 10);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| compute_delta(&current, Some(&previous)));
        });
    }
    group.finish();
}

fn bench_recompute_all(c: &mut Criterion) {
    let rosters: Vec<Roster> = (0..30u64).map(|d| roster(d, d * 50..d * 50 + 2_000)).collect();

    c.bench_function("recompute_all_30_days", |b| {
        b.iter(|| {
            let mut engine = DeltaEngine::new(MemorySnapshotStore::with_rosters(rosters.clone()));
            engine.compute_latest(true).expect("compute")
        });
    });
}

criterion_group!(benches, bench_compare, bench_recompute_all);
criterion_main!(benches);
