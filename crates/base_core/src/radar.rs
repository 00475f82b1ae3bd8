//! Base radar coverage.

use serde::{Deserialize, Serialize};

use crate::base::{BaseId, BuildingStatus};
use crate::campaign::Campaign;
use crate::events::CampaignEvent;
use crate::math::{fixed_serde, percent_of, Fixed};
use crate::resolver;
use crate::templates::BuildingType;

/// Detection and tracking ranges of a base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Radar {
    /// Detection range.
    #[serde(with = "fixed_serde")]
    pub range: Fixed,
    /// Tracking range.
    #[serde(with = "fixed_serde")]
    pub tracking_range: Fixed,
}

impl Radar {
    /// Set ranges for a radar of `level`.
    ///
    /// Level 0 switches the radar off. Every level above 1 adds
    /// `upgrade_percent` of the base range.
    pub fn initialise(&mut self, base_range: Fixed, base_tracking: Fixed, level: Fixed, upgrade_percent: u32) {
        if level <= Fixed::ZERO {
            self.range = Fixed::ZERO;
            self.tracking_range = Fixed::ZERO;
            return;
        }
        let extra = level - Fixed::ONE;
        self.range = base_range + percent_of(base_range * extra, upgrade_percent);
        self.tracking_range = base_tracking + percent_of(base_tracking * extra, upgrade_percent);
    }

    /// Whether the radar sees anything.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.range > Fixed::ZERO
    }
}

/// Recompute a base's radar from its best working radar building.
pub fn update_base_coverage(campaign: &mut Campaign, base: BaseId) {
    let (base_range, base_tracking, percent) = (
        Fixed::from_num(campaign.config.radar_base_range),
        Fixed::from_num(campaign.config.radar_base_tracking_range),
        campaign.config.radar_upgrade_percent,
    );
    let Ok(target) = campaign.base_mut(base) else {
        tracing::warn!(base = base.0, "Radar update for unknown base");
        return;
    };

    let level = if resolver::building_status(target, BuildingType::Radar) {
        target
            .buildings_of_type(BuildingType::Radar)
            .filter(|building| building.status == BuildingStatus::Working)
            .map(|building| building.level)
            .max()
            .unwrap_or(Fixed::ZERO)
    } else {
        Fixed::ZERO
    };

    target.radar.initialise(base_range, base_tracking, level, percent);
    let range = target.radar.range;
    tracing::debug!(base = base.0, %level, %range, "Radar coverage updated");
    campaign.emit(CampaignEvent::RadarCoverageUpdated { base, range });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_zero_switches_off() {
        let mut radar = Radar {
            range: Fixed::from_num(10),
            tracking_range: Fixed::from_num(10),
        };
        radar.initialise(Fixed::from_num(24), Fixed::from_num(34), Fixed::ZERO, 40);
        assert!(!radar.is_active());
        assert_eq!(radar.tracking_range, Fixed::ZERO);
    }

    #[test]
    fn test_level_scaling() {
        let mut radar = Radar::default();
        radar.initialise(Fixed::from_num(24), Fixed::from_num(34), Fixed::ONE, 40);
        assert_eq!(radar.range, Fixed::from_num(24));
        assert_eq!(radar.tracking_range, Fixed::from_num(34));

        radar.initialise(Fixed::from_num(20), Fixed::from_num(30), Fixed::from_num(3), 50);
        // 20 + 50% of 20 * 2
        assert_eq!(radar.range, Fixed::from_num(40));
        assert_eq!(radar.tracking_range, Fixed::from_num(60));
    }
}
