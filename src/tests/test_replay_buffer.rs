use std::collections::HashSet;

use ndarray::array;

use crate::error::DqnError;
use crate::replay_buffer::{Experience, ExperienceBatch, ReplayBuffer};

fn numbered(i: usize) -> Experience {
    Experience {
        state: array![i as f32, 0.0],
        action: i % 3,
        reward: i as f32,
        next_state: array![(i + 1) as f32, 0.0],
        done: i % 2 == 0,
    }
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut replay_buffer = ReplayBuffer::with_seed(10, 0).unwrap();
    let experience = Experience {
        state: array![0.5, -0.5],
        action: 0,
        reward: 1.0,
        next_state: array![0.6, -0.4],
        done: false,
    };
    replay_buffer.add(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample_experiences(1).unwrap();
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_capacity() {
    let mut buffer = ReplayBuffer::with_seed(3, 1).unwrap();

    for i in 0..5 {
        buffer.add(numbered(i));
        assert!(buffer.len() <= 3);
    }

    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.capacity(), 3);

    // Oldest experiences are dropped, insertion order is kept
    let states: Vec<f32> = buffer.iter().map(|e| e.state[0]).collect();
    assert_eq!(states, vec![2.0, 3.0, 4.0]);
}

#[test]
fn test_replay_buffer_zero_capacity() {
    assert!(matches!(
        ReplayBuffer::with_seed(0, 0),
        Err(DqnError::InvalidParameter { .. })
    ));
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::with_seed(10, 0).unwrap();
    assert!(buffer.is_empty());

    buffer.push(array![0.0], 0, 0.0, array![1.0], false);
    assert!(!buffer.is_empty());

    buffer.clear();
    assert!(buffer.is_empty());
}

#[test]
fn test_sample_draws_distinct_experiences() {
    let mut buffer = ReplayBuffer::with_seed(100, 7).unwrap();
    for i in 0..20 {
        buffer.add(numbered(i));
    }

    for _ in 0..50 {
        let sample = buffer.sample_experiences(20).unwrap();
        let seen: HashSet<u32> = sample.iter().map(|e| e.state[0] as u32).collect();
        assert_eq!(seen.len(), 20);
    }
}

#[test]
fn test_sample_insufficient_data() {
    let mut buffer = ReplayBuffer::with_seed(10, 0).unwrap();
    for i in 0..3 {
        buffer.add(numbered(i));
    }

    match buffer.sample(4) {
        Err(DqnError::InsufficientData { requested, available }) => {
            assert_eq!(requested, 4);
            assert_eq!(available, 3);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    assert!(buffer.sample(3).is_ok());
    assert!(matches!(buffer.sample(0), Err(DqnError::InvalidParameter { .. })));
}

#[test]
fn test_sample_covers_whole_buffer() {
    let mut buffer = ReplayBuffer::with_seed(10, 3).unwrap();
    for i in 0..10 {
        buffer.add(numbered(i));
    }

    let mut seen = HashSet::new();
    for _ in 0..200 {
        for exp in buffer.sample_experiences(2).unwrap() {
            seen.insert(exp.state[0] as u32);
        }
    }
    assert_eq!(seen.len(), 10);
}

#[test]
fn test_seeded_buffers_sample_identically() {
    let mut a = ReplayBuffer::with_seed(50, 99).unwrap();
    let mut b = ReplayBuffer::with_seed(50, 99).unwrap();
    for i in 0..30 {
        a.add(numbered(i));
        b.add(numbered(i));
    }
    assert_eq!(a.sample(8).unwrap(), b.sample(8).unwrap());
}

#[test]
fn test_batch_collation() {
    let experiences: Vec<Experience> = (0..4).map(numbered).collect();
    let refs: Vec<&Experience> = experiences.iter().collect();
    let batch = ExperienceBatch::collate(&refs).unwrap();

    assert_eq!(batch.len(), 4);
    assert_eq!(batch.states.dim(), (4, 2));
    assert_eq!(batch.next_states.dim(), (4, 2));
    assert_eq!(batch.actions, vec![0, 1, 2, 0]);
    assert_eq!(batch.rewards, array![0.0, 1.0, 2.0, 3.0]);
    assert_eq!(batch.dones, array![1.0, 0.0, 1.0, 0.0]);
    assert_eq!(batch.next_states[[2, 0]], 3.0);
}

#[test]
fn test_batch_collation_errors() {
    assert!(ExperienceBatch::collate(&[]).is_err());

    let short = Experience::new(array![1.0], 0, 0.0, array![2.0], false);
    let long = numbered(1);
    assert!(matches!(
        ExperienceBatch::collate(&[&long, &short]),
        Err(DqnError::DimensionMismatch { .. })
    ));
}
