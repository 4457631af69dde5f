use std::collections::VecDeque;

use crate::observation::Observation;

/// Bounded FIFO of recent observations, oldest first.
#[derive(Clone, Debug)]
pub struct ObservationWindow {
    items: VecDeque<Observation>,
    capacity: usize,
}

impl ObservationWindow {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append at the end, evicting the oldest entry first when full.
    /// Returns the evicted observation, if any.
    pub fn push(&mut self, obs: Observation) -> Option<Observation> {
        let evicted = if self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(obs);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Observations in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.items.iter()
    }

    pub fn matching<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Observation> + 'a {
        self.items.iter().filter(move |o| o.label == label)
    }

    /// Count and arithmetic mean confidence of the entries carrying `label`.
    pub fn mean_confidence(&self, label: &str) -> Option<(usize, f32)> {
        let (count, sum) = self
            .matching(label)
            .fold((0usize, 0.0_f32), |(n, s), o| (n + 1, s + o.confidence));
        if count == 0 {
            None
        } else {
            Some((count, sum / count as f32))
        }
    }
}

impl Default for ObservationWindow {
    fn default() -> Self {
        Self::new(15)
    }
}
