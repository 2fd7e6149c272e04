//! Throughput of the pieces on the learning hot path: replay sampling, a full
//! learning step, and action selection.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use deepq::agent::DqnAgent;
use deepq::config::AgentConfig;
use deepq::replay_buffer::ReplayBuffer;
use ndarray::Array1;

const STATE_SIZE: usize = 8;

fn filled_buffer(len: usize) -> ReplayBuffer {
    let mut buffer = ReplayBuffer::with_seed(len, 0).unwrap();
    for i in 0..len {
        let state = Array1::from_elem(STATE_SIZE, (i % 97) as f32 / 97.0);
        let next_state = state.mapv(|v| v + 0.01);
        buffer.push(state, i % 4, 1.0, next_state, i % 50 == 0);
    }
    buffer
}

fn bench_replay_sampling(c: &mut Criterion) {
    let mut buffer = filled_buffer(100_000);
    c.bench_function("replay_sample_64", |b| {
        b.iter(|| black_box(buffer.sample(64).unwrap()))
    });
}

fn bench_learn(c: &mut Criterion) {
    let mut group = c.benchmark_group("learn_step");
    for (name, double_dqn, dueling) in [("dqn", false, false), ("double", true, false), ("dueling", true, true)] {
        let mut config = AgentConfig::new(STATE_SIZE, 4, 0);
        config.double_dqn = double_dqn;
        config.dueling = dueling;
        let mut agent = DqnAgent::new(config).unwrap();
        let mut buffer = filled_buffer(1_000);

        group.bench_function(name, |b| {
            b.iter_batched(
                || buffer.sample(64).unwrap(),
                |batch| black_box(agent.learn(&batch, 0.99).unwrap()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_act(c: &mut Criterion) {
    let mut agent = DqnAgent::new(AgentConfig::new(STATE_SIZE, 4, 0)).unwrap();
    let state = Array1::from_elem(STATE_SIZE, 0.3);
    c.bench_function("act_greedy", |b| {
        b.iter(|| black_box(agent.act(state.view(), 0.0).unwrap()))
    });
}

criterion_group!(benches, bench_replay_sampling, bench_learn, bench_act);
criterion_main!(benches);
