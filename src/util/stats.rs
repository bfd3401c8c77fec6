use std::fmt::Display;

/// Running count, range and mean of a sequence of integer samples.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub count: usize,
    pub min: usize,
    pub max: usize,
    pub avg: f32,
}

impl Stats {
    pub fn new_single(v: usize) -> Self {
        Stats {
            count: 1,
            min: v,
            max: v,
            avg: v as f32,
        }
    }

    pub fn add_sample(&mut self, value: usize) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.avg += (value as f32 - self.avg) / (self.count as f32);
    }

    pub fn add_samples(&mut self, values: impl IntoIterator<Item = usize>) {
        for value in values {
            self.add_sample(value);
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            min: usize::MAX,
            max: 0,
            avg: 0.0,
        }
    }
}

impl Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}; avg {:.1}; {} samples",
            self.min, self.max, self.avg, self.count
        )
    }
}
