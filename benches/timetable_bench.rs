//! Criterion benchmarks for the timetable searches.
//!
//! Uses a synthetic faculty (three days, four intervals, three rooms) to
//! measure neighbor generation and full runs of each algorithm.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use u_timetable::env::{Environment, ProfConstraints};
use u_timetable::hc::{HcConfig, HcRunner, HcVariant};
use u_timetable::mcts::{MctsConfig, MctsRunner};
use u_timetable::random::create_rng;
use u_timetable::state::State;

fn faculty() -> Arc<Environment> {
    let env = Environment::builder()
        .with_day("Luni")
        .with_day("Marti")
        .with_day("Miercuri")
        .with_interval(8, 10)
        .with_interval(10, 12)
        .with_interval(12, 14)
        .with_interval(14, 16)
        .with_room("EG301", 30, &["IA", "PCOM", "SO"])
        .with_room("EG390", 60, &["IA", "SO", "PP"])
        .with_room("EC105", 90, &["PP", "PCOM"])
        .with_subject("IA", 180)
        .with_subject("PCOM", 150)
        .with_subject("SO", 120)
        .with_subject("PP", 270)
        .with_professor(
            "Ana",
            &["IA", "PCOM"],
            ProfConstraints::default().with_day("Marti").with_max_pause(2),
        )
        .with_professor(
            "Dan",
            &["IA", "SO", "PP"],
            ProfConstraints::default().with_interval(8, 10),
        )
        .with_professor("Ion", &["SO", "PCOM"], ProfConstraints::default())
        .with_professor(
            "Mara",
            &["PP", "PCOM"],
            ProfConstraints::default().with_day("Luni"),
        )
        .build()
        .expect("valid faculty");
    Arc::new(env)
}

fn bench_neighbors(c: &mut Criterion) {
    let state = State::new(faculty()).expect("non-empty grid");

    c.bench_function("neighbors_empty_state", |b| {
        b.iter(|| {
            let mut rng = create_rng(42);
            black_box(state.get_next_states_hc(&mut rng).count())
        })
    });

    c.bench_function("available_actions_empty_state", |b| {
        b.iter(|| black_box(state.get_available_actions().len()))
    });
}

fn bench_hc(c: &mut Criterion) {
    let mut group = c.benchmark_group("hc");
    group.sample_size(10);

    let initial = State::new(faculty()).expect("non-empty grid");
    for variant in [HcVariant::Classic, HcVariant::FirstX, HcVariant::RandomRestart] {
        let config = HcConfig::default().with_max_restarts(3).with_seed(42);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{variant:?}")),
            &(variant, config),
            |b, (v, cfg)| {
                b.iter(|| {
                    let r = HcRunner::run(&initial, *v, cfg).expect("valid config");
                    black_box(r.best.total_fitness())
                })
            },
        );
    }
    group.finish();
}

fn bench_mcts(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts");
    group.sample_size(10);

    let initial = State::new(faculty()).expect("non-empty grid");
    for budget in [10, 50] {
        let config = MctsConfig::default().with_budget(budget).with_seed(42);
        group.bench_with_input(BenchmarkId::from_parameter(budget), &config, |b, cfg| {
            b.iter(|| {
                let r = MctsRunner::run(&initial, cfg).expect("valid config");
                black_box(r.state.total_fitness())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_neighbors, bench_hc, bench_mcts);
criterion_main!(benches);
