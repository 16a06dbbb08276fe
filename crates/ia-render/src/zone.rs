//! Object zone control (nine-zone variant)
//!
//! Zone gains partition the room into nine regions; the configuration
//! maps each output channel to a per-zone attenuation row. An object sub
//! block carrying zone gains scales every channel gain by the zone-gain
//! weighted row. Configurations without a zone table leave gains
//! untouched.

use crate::config::{RendererConfig, Zone9Table};
use ia_core::Sample;

/// Number of object zones
pub const ZONE_COUNT: usize = 9;

/// Applies zone-9 gains to rendered channel gains
#[derive(Debug, Clone, Default)]
pub struct ObjectZone9 {
    table: Option<Zone9Table>,
}

impl ObjectZone9 {
    /// Adopt the configuration's zone table, when present
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            table: config.zone9().cloned(),
        }
    }

    /// Whether zone control is active for this target
    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Scale `channel_gains` by the zone-weighted attenuation rows.
    ///
    /// Rows are normalized at configuration time, so all-ones zone gains
    /// are an identity.
    pub fn process(&self, zone_gains: &[Sample; ZONE_COUNT], channel_gains: &mut [Sample]) {
        let Some(table) = &self.table else {
            return;
        };

        for (gain, row) in channel_gains.iter_mut().zip(table.rows.iter()) {
            let factor: f32 = zone_gains
                .iter()
                .zip(row.iter())
                .map(|(zg, coef)| zg * coef)
                .sum();
            *gain *= factor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use approx::assert_abs_diff_eq;

    fn config_with_zones() -> RendererConfig {
        RendererConfig::surround_5_1()
            .with_zone9(Zone9Table {
                rows: vec![[1.0; 9]; 6],
            })
            .unwrap()
    }

    #[test]
    fn test_disabled_without_table() {
        let config = RendererConfig::surround_5_1();
        let zone = ObjectZone9::from_config(&config);
        assert!(!zone.is_enabled());

        let mut gains = vec![0.5; 6];
        zone.process(&[0.0; 9], &mut gains);
        assert!(gains.iter().all(|g| (*g - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_all_ones_identity() {
        let zone = ObjectZone9::from_config(&config_with_zones());
        assert!(zone.is_enabled());

        let mut gains = vec![0.25, 0.5, 1.0, 0.0, 0.75, 0.1];
        let before = gains.clone();
        zone.process(&[1.0; 9], &mut gains);
        for (a, b) in gains.iter().zip(before.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_zero_zones_silence() {
        let zone = ObjectZone9::from_config(&config_with_zones());
        let mut gains = vec![1.0; 6];
        zone.process(&[0.0; 9], &mut gains);
        assert!(gains.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_partial_attenuation() {
        let zone = ObjectZone9::from_config(&config_with_zones());
        let mut gains = vec![1.0; 6];
        let mut zone_gains = [0.0; 9];
        zone_gains[0] = 1.0;
        zone.process(&zone_gains, &mut gains);
        // Each normalized row weighs the single active zone at 1/9.
        for g in &gains {
            assert_abs_diff_eq!(*g, 1.0 / 9.0, epsilon = 1e-6);
        }
    }
}
