// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Catalog domain types.
//!
//! Every type owns its data (`String`, `Vec`), so `Clone` is a full deep copy:
//! the stores hand out clones and never share their internal values.

use serde::{Deserialize, Serialize};

/// Unit for a [`Memory`] quantity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryUnit {
    #[default]
    Unspecified,
    Bit,
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl MemoryUnit {
    /// Power of two that converts one unit into bits.
    fn bit_shift(&self) -> Option<u32> {
        match self {
            Self::Unspecified => None,
            Self::Bit => Some(0),
            Self::Byte => Some(3),
            Self::Kilobyte => Some(13),
            Self::Megabyte => Some(23),
            Self::Gigabyte => Some(33),
            Self::Terabyte => Some(43),
        }
    }
}

/// A memory or storage capacity.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Memory {
    pub value: u64,
    pub unit: MemoryUnit,
}

impl Memory {
    pub fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    /// Capacity in bits, the single base unit used for comparisons.
    ///
    /// An unspecified unit counts as zero; values too large for `u64`
    /// saturate.
    pub fn to_bits(&self) -> u64 {
        match self.unit.bit_shift() {
            Some(shift) => self.value.saturating_mul(1u64 << shift),
            None => 0,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cpu {
    pub brand: String,
    pub name: String,
    pub number_cores: u32,
    pub number_threads: u32,
    pub min_ghz: f64,
    pub max_ghz: f64,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gpu {
    pub brand: String,
    pub name: String,
    pub min_ghz: f64,
    pub max_ghz: f64,
    pub memory: Memory,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    #[default]
    Unspecified,
    Hdd,
    Ssd,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub driver: StorageDriver,
    pub memory: Memory,
}

/// A catalog entry. An empty `id` asks the store to assign one.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Laptop {
    pub id: String,
    pub brand: String,
    pub name: String,
    pub cpu: Cpu,
    pub ram: Memory,
    pub gpus: Vec<Gpu>,
    pub storages: Vec<Storage>,
    pub weight_kg: f64,
    pub price_usd: f64,
    pub release_year: u32,
}

/// Search bounds. Present bounds are inclusive and all must hold.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub max_price_usd: Option<f64>,
    pub min_cpu_cores: Option<u32>,
    pub min_cpu_ghz: Option<f64>,
    pub min_ram: Option<Memory>,
}

impl Filter {
    pub fn matches(&self, laptop: &Laptop) -> bool {
        if let Some(max_price) = self.max_price_usd {
            if laptop.price_usd > max_price {
                return false;
            }
        }
        if let Some(min_cores) = self.min_cpu_cores {
            if laptop.cpu.number_cores < min_cores {
                return false;
            }
        }
        if let Some(min_ghz) = self.min_cpu_ghz {
            if laptop.cpu.min_ghz < min_ghz {
                return false;
            }
        }
        if let Some(ref min_ram) = self.min_ram {
            if laptop.ram.to_bits() < min_ram.to_bits() {
                return false;
            }
        }
        true
    }
}

/// Running aggregate of scores for one laptop.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rating {
    pub count: u32,
    pub sum: f64,
}

impl Rating {
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / f64::from(self.count)
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
