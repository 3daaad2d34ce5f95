/// RAPL energy counters are 32 bits wide and wrap around.
const COUNTER_MASK: u64 = 0xFFFF_FFFF;

/// The energy status unit field of the power unit register: bits 12:8.
const ENERGY_STATUS_UNIT_SHIFT: u32 = 8;
const ENERGY_STATUS_UNIT_MASK: u64 = 0x1F;

/// Converts raw energy counter increments to joules.
///
/// One counter increment is `2^-ESU` joules, where ESU is the energy status unit decoded from
/// the power unit register.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EnergyUnit {
    energy_status_unit: u8,
}

impl EnergyUnit {
    /// Decodes the energy status unit from a raw power unit register value.
    #[must_use]
    pub fn from_power_unit_register(raw: u64) -> Self {
        let esu = (raw >> ENERGY_STATUS_UNIT_SHIFT) & ENERGY_STATUS_UNIT_MASK;

        Self {
            energy_status_unit: u8::try_from(esu).expect("masked to 5 bits, always fits in u8"),
        }
    }

    /// The decoded energy status unit.
    #[must_use]
    pub const fn energy_status_unit(self) -> u8 {
        self.energy_status_unit
    }

    /// Joules represented by one counter increment.
    #[must_use]
    pub fn joules_per_count(self) -> f64 {
        0.5_f64.powi(i32::from(self.energy_status_unit))
    }

    /// Joules consumed between two raw counter readings, accounting for the counter having
    /// wrapped around at most once in between.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "the delta is at most 32 bits wide, which f64 represents exactly"
    )]
    pub fn joules_between(self, start: u64, end: u64) -> f64 {
        counter_delta(start, end) as f64 * self.joules_per_count()
    }
}

/// Counter increments between two raw readings, modulo 2^32.
#[must_use]
fn counter_delta(start: u64, end: u64) -> u64 {
    end.wrapping_sub(start) & COUNTER_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_typical_intel_unit() {
        // 0xA0E03: power unit 3, energy status unit 14, time unit 10.
        let unit = EnergyUnit::from_power_unit_register(0x000A_0E03);

        assert_eq!(unit.energy_status_unit(), 14);
        assert!((unit.joules_per_count() - 1.0 / 16384.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_bits_outside_the_field() {
        let unit = EnergyUnit::from_power_unit_register(0xFFFF_E0FF);

        assert_eq!(unit.energy_status_unit(), 0);
        assert!((unit.joules_per_count() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn delta_without_wrap() {
        assert_eq!(counter_delta(100, 350), 250);
    }

    #[test]
    fn delta_across_wrap() {
        assert_eq!(counter_delta(0xFFFF_FFF0, 0x10), 0x20);
    }

    #[test]
    fn delta_ignores_reserved_high_bits() {
        assert_eq!(counter_delta(0xABCD_0000_0005, 0x1234_0000_0007), 2);
    }

    #[test]
    fn joules_between_scales_delta() {
        let unit = EnergyUnit::from_power_unit_register(0x0000_0200);

        // ESU 2: a quarter joule per count.
        assert!((unit.joules_between(0, 8) - 2.0).abs() < f64::EPSILON);
    }
}
