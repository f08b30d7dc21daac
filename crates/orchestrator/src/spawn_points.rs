//! Spawn point pool
//!
//! Shuffled candidate transforms, consumed without replacement across the ego
//! and background spawns. A point handed out by `take` is never handed out
//! again, even when the spawn using it fails.

use contracts::Transform;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Consumable pool of spawn transforms
#[derive(Debug)]
pub struct SpawnPointPool {
    points: Vec<Transform>,
}

impl SpawnPointPool {
    /// Create a pool with the candidates in shuffled order
    pub fn shuffled(mut points: Vec<Transform>) -> Self {
        points.shuffle(&mut thread_rng());
        Self { points }
    }

    /// Create a pool preserving the given order (tests)
    pub fn ordered(points: Vec<Transform>) -> Self {
        Self { points }
    }

    /// Consume one point; None once exhausted
    pub fn take(&mut self) -> Option<Transform> {
        self.points.pop()
    }

    /// Points left in the pool
    pub fn remaining(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(n: usize) -> Vec<Transform> {
        (0..n).map(|i| Transform::at(i as f64 * 10.0, 0.0, 0.3)).collect()
    }

    #[test]
    fn take_consumes_without_replacement() {
        let mut pool = SpawnPointPool::ordered(grid(3));
        let mut seen = Vec::new();
        while let Some(point) = pool.take() {
            assert!(!seen.contains(&point));
            seen.push(point);
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(pool.remaining(), 0);
        assert!(pool.take().is_none());
    }

    #[test]
    fn shuffle_keeps_every_candidate() {
        let mut pool = SpawnPointPool::shuffled(grid(10));
        let mut count = 0;
        while pool.take().is_some() {
            count += 1;
        }
        assert_eq!(count, 10);
    }
}
