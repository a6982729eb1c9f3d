//! Rolling statistics for population tracking and graph display.

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub spawned: usize,
    pub births: usize,
    pub starved: usize,
    pub consumed: usize,
    pub culled: usize,
}

impl TickStats {
    pub fn deaths(&self) -> usize {
        self.starved + self.consumed + self.culled
    }
}

/// Ring buffer that stores the last N samples of a metric.
pub struct RingBuffer {
    data: Vec<f32>,
    head: usize,
    len: usize,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: vec![0.0; capacity],
            head: 0,
            len: 0,
            capacity,
        }
    }

    pub fn push(&mut self, value: f32) {
        self.data[self.head] = value;
        self.head = (self.head + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Return samples in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        let start = if self.len < self.capacity {
            0
        } else {
            self.head
        };
        (0..self.len).map(move |i| self.data[(start + i) % self.capacity])
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn last(&self) -> Option<f32> {
        if self.len == 0 {
            None
        } else {
            let idx = (self.head + self.capacity - 1) % self.capacity;
            Some(self.data[idx])
        }
    }
}

pub struct SimStats {
    pub population: RingBuffer,
    pub births: RingBuffer,
    pub deaths: RingBuffer,
    pub total_births: u64,
    pub total_deaths: u64,
}

impl SimStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            population: RingBuffer::new(capacity),
            births: RingBuffer::new(capacity),
            deaths: RingBuffer::new(capacity),
            total_births: 0,
            total_deaths: 0,
        }
    }

    pub fn record(&mut self, tick: &TickStats, population: usize) {
        self.population.push(population as f32);
        self.births.push(tick.births as f32);
        self.deaths.push(tick.deaths() as f32);
        self.total_births += tick.births as u64;
        self.total_deaths += tick.deaths() as u64;
    }
}
