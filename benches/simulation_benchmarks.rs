use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use injury_sim::{Athlete, InjuryProfile, RngSource, SimulationEngine, SimulationMode};

/// Performance benchmarks for the simulation engine
///
/// Range lengths cover a match week up to a full season for a
/// first-team squad.

const TEAM: &str = "Bench FC";

fn create_benchmark_squad(size: usize) -> Vec<Athlete> {
    (0..size)
        .map(|i| {
            let weights = vec![
                ("Hamstring Injury".to_string(), 0.4),
                ("Knock".to_string(), 0.35),
                ("Ankle Injury".to_string(), 0.25),
            ];
            Athlete::new(
                format!("Player {}", i),
                InjuryProfile::new(1.0 + (i % 4) as f64, 18.0, 9.0, weights),
            )
        })
        .collect()
}

fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
}

fn bench_simulate_range(c: &mut Criterion) {
    let engine = SimulationEngine::new();
    let roster = create_benchmark_squad(25);

    let mut group = c.benchmark_group("Simulate Range");

    for &days in &[7u64, 30, 90, 365] {
        let to = start_date() + chrono::Days::new(days);
        group.throughput(Throughput::Elements(days));

        group.bench_with_input(BenchmarkId::new("basic", days), &to, |b, &to| {
            b.iter(|| {
                let mut rng = RngSource::seeded(42);
                engine.simulate_range(
                    black_box(&roster),
                    &[],
                    TEAM,
                    start_date(),
                    to,
                    SimulationMode::Basic,
                    &mut rng,
                )
            });
        });

        group.bench_with_input(BenchmarkId::new("with_fatigue", days), &to, |b, &to| {
            b.iter(|| {
                let mut rng = RngSource::seeded(42);
                engine.simulate_range(
                    black_box(&roster),
                    &[],
                    TEAM,
                    start_date(),
                    to,
                    SimulationMode::with_initial_fatigue(&roster, TEAM, 30),
                    &mut rng,
                )
            });
        });
    }

    group.finish();
}

fn bench_simulate_day(c: &mut Criterion) {
    let engine = SimulationEngine::new();
    let mut group = c.benchmark_group("Simulate Day");

    for &size in &[11usize, 25, 40] {
        let roster = create_benchmark_squad(size);
        let mode = SimulationMode::with_initial_fatigue(&roster, TEAM, 60);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("squad", size), &roster, |b, roster| {
            let mut rng = RngSource::seeded(7);
            b.iter(|| engine.simulate_day(black_box(roster), &[], TEAM, start_date(), &mode, &mut rng));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulate_range, bench_simulate_day);
criterion_main!(benches);
