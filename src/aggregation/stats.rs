use serde::Serialize;

/// Upper bound (exclusive) of the low energy band.
pub const LOW_ENERGY_MAX: f64 = 0.3;
/// Lower bound (inclusive) of the high energy band.
pub const HIGH_ENERGY_MIN: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyBand {
    Low,
    Medium,
    High,
}

impl EnergyBand {
    pub const ALL: [EnergyBand; 3] = [EnergyBand::Low, EnergyBand::Medium, EnergyBand::High];

    pub fn classify(energy: f64) -> Self {
        if energy < LOW_ENERGY_MAX {
            Self::Low
        } else if energy < HIGH_ENERGY_MIN {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Energy",
            Self::Medium => "Medium Energy",
            Self::High => "High Energy",
        }
    }
}

/// Song counts per energy band. The three counts always sum to the number of
/// songs classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnergyBandCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl EnergyBandCounts {
    pub fn from_energies(energies: impl IntoIterator<Item = f64>) -> Self {
        let mut counts = Self::default();
        for energy in energies {
            counts.add(EnergyBand::classify(energy));
        }
        counts
    }

    pub fn add(&mut self, band: EnergyBand) {
        match band {
            EnergyBand::Low => self.low += 1,
            EnergyBand::Medium => self.medium += 1,
            EnergyBand::High => self.high += 1,
        }
    }

    pub fn get(&self, band: EnergyBand) -> usize {
        match band {
            EnergyBand::Low => self.low,
            EnergyBand::Medium => self.medium,
            EnergyBand::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Arithmetic mean, 0 for an empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator), 0 with fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
