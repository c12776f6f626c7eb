// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions between the catalog domain types and their proto messages.

use super::proto;
use crate::model::{Cpu, Filter, Gpu, Laptop, Memory, MemoryUnit, Storage, StorageDriver};

pub fn memory_unit_to_proto(unit: MemoryUnit) -> proto::memory::Unit {
    match unit {
        MemoryUnit::Unspecified => proto::memory::Unit::Unspecified,
        MemoryUnit::Bit => proto::memory::Unit::Bit,
        MemoryUnit::Byte => proto::memory::Unit::Byte,
        MemoryUnit::Kilobyte => proto::memory::Unit::Kilobyte,
        MemoryUnit::Megabyte => proto::memory::Unit::Megabyte,
        MemoryUnit::Gigabyte => proto::memory::Unit::Gigabyte,
        MemoryUnit::Terabyte => proto::memory::Unit::Terabyte,
    }
}

pub fn memory_unit_from_proto(unit: proto::memory::Unit) -> MemoryUnit {
    match unit {
        proto::memory::Unit::Unspecified => MemoryUnit::Unspecified,
        proto::memory::Unit::Bit => MemoryUnit::Bit,
        proto::memory::Unit::Byte => MemoryUnit::Byte,
        proto::memory::Unit::Kilobyte => MemoryUnit::Kilobyte,
        proto::memory::Unit::Megabyte => MemoryUnit::Megabyte,
        proto::memory::Unit::Gigabyte => MemoryUnit::Gigabyte,
        proto::memory::Unit::Terabyte => MemoryUnit::Terabyte,
    }
}

pub fn memory_to_proto(m: &Memory) -> proto::Memory {
    proto::Memory { value: m.value, unit: memory_unit_to_proto(m.unit) as i32 }
}

/// Unknown unit values decode as unspecified.
pub fn memory_from_proto(m: &proto::Memory) -> Memory {
    Memory { value: m.value, unit: memory_unit_from_proto(m.unit()) }
}

fn driver_to_proto(driver: StorageDriver) -> proto::storage::Driver {
    match driver {
        StorageDriver::Unspecified => proto::storage::Driver::Unspecified,
        StorageDriver::Hdd => proto::storage::Driver::Hdd,
        StorageDriver::Ssd => proto::storage::Driver::Ssd,
    }
}

fn driver_from_proto(driver: proto::storage::Driver) -> StorageDriver {
    match driver {
        proto::storage::Driver::Unspecified => StorageDriver::Unspecified,
        proto::storage::Driver::Hdd => StorageDriver::Hdd,
        proto::storage::Driver::Ssd => StorageDriver::Ssd,
    }
}

pub fn laptop_to_proto(l: &Laptop) -> proto::Laptop {
    proto::Laptop {
        id: l.id.clone(),
        brand: l.brand.clone(),
        name: l.name.clone(),
        cpu: Some(proto::Cpu {
            brand: l.cpu.brand.clone(),
            name: l.cpu.name.clone(),
            number_cores: l.cpu.number_cores,
            number_threads: l.cpu.number_threads,
            min_ghz: l.cpu.min_ghz,
            max_ghz: l.cpu.max_ghz,
        }),
        ram: Some(memory_to_proto(&l.ram)),
        gpus: l
            .gpus
            .iter()
            .map(|g| proto::Gpu {
                brand: g.brand.clone(),
                name: g.name.clone(),
                min_ghz: g.min_ghz,
                max_ghz: g.max_ghz,
                memory: Some(memory_to_proto(&g.memory)),
            })
            .collect(),
        storages: l
            .storages
            .iter()
            .map(|s| proto::Storage {
                driver: driver_to_proto(s.driver) as i32,
                memory: Some(memory_to_proto(&s.memory)),
            })
            .collect(),
        weight_kg: l.weight_kg,
        price_usd: l.price_usd,
        release_year: l.release_year,
    }
}

/// Missing sub-messages decode as their defaults.
pub fn laptop_from_proto(l: proto::Laptop) -> Laptop {
    let cpu = l.cpu.unwrap_or_default();
    Laptop {
        id: l.id,
        brand: l.brand,
        name: l.name,
        cpu: Cpu {
            brand: cpu.brand,
            name: cpu.name,
            number_cores: cpu.number_cores,
            number_threads: cpu.number_threads,
            min_ghz: cpu.min_ghz,
            max_ghz: cpu.max_ghz,
        },
        ram: l.ram.as_ref().map(memory_from_proto).unwrap_or_default(),
        gpus: l
            .gpus
            .into_iter()
            .map(|g| Gpu {
                memory: g.memory.as_ref().map(memory_from_proto).unwrap_or_default(),
                brand: g.brand,
                name: g.name,
                min_ghz: g.min_ghz,
                max_ghz: g.max_ghz,
            })
            .collect(),
        storages: l
            .storages
            .into_iter()
            .map(|s| Storage {
                driver: driver_from_proto(s.driver()),
                memory: s.memory.as_ref().map(memory_from_proto).unwrap_or_default(),
            })
            .collect(),
        weight_kg: l.weight_kg,
        price_usd: l.price_usd,
        release_year: l.release_year,
    }
}

pub fn filter_to_proto(f: &Filter) -> proto::Filter {
    proto::Filter {
        max_price_usd: f.max_price_usd,
        min_cpu_cores: f.min_cpu_cores,
        min_cpu_ghz: f.min_cpu_ghz,
        min_ram: f.min_ram.as_ref().map(memory_to_proto),
    }
}

pub fn filter_from_proto(f: &proto::Filter) -> Filter {
    Filter {
        max_price_usd: f.max_price_usd,
        min_cpu_cores: f.min_cpu_cores,
        min_cpu_ghz: f.min_cpu_ghz,
        min_ram: f.min_ram.as_ref().map(memory_from_proto),
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
