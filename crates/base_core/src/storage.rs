//! Item catalogue and base storage.
//!
//! Ordinary items take storage volume. Antimatter is kept in its own
//! facility and counted in units. Virtual items take no room at all.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::base::{Base, BaseId};
use crate::campaign::Campaign;
use crate::capacity::CapacityKind;
use crate::error::{BaseError, Result};
use crate::ledger;
use crate::resolver;
use crate::templates::{read_data_file, BuildingType, DataError};

/// Item definition.
///
/// # Example RON
///
/// ```ron
/// ItemDef(id: "rifle", name: "Assault Rifle", volume: 20, price: 1200)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// Script identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Storage volume of one unit.
    #[serde(default)]
    pub volume: i32,
    /// Market price of one unit.
    #[serde(default)]
    pub price: i64,
    /// Takes no storage room.
    #[serde(default)]
    pub is_virtual: bool,
    /// Stored in the antimatter facility.
    #[serde(default)]
    pub is_antimatter: bool,
}

/// Index of an item in the [`ItemCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u16);

/// Registry of item definitions.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: Vec<ItemDef>,
    by_id: HashMap<String, ItemId>,
}

impl ItemCatalog {
    /// Build the catalogue.
    pub fn from_data(items: Vec<ItemDef>) -> std::result::Result<Self, DataError> {
        if items.len() > usize::from(u16::MAX) {
            return Err(DataError::Invalid(format!("too many items: {}", items.len())));
        }
        let mut by_id = HashMap::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if by_id.insert(item.id.clone(), ItemId(index as u16)).is_some() {
                return Err(DataError::Invalid(format!("duplicate item '{}'", item.id)));
            }
        }
        if items.iter().filter(|item| item.is_antimatter).count() > 1 {
            return Err(DataError::Invalid("more than one antimatter item".into()));
        }
        tracing::debug!(count = items.len(), "Loaded item catalogue");
        Ok(Self { items, by_id })
    }

    /// Parse a RON list of [`ItemDef`].
    pub fn from_ron_str(ron: &str) -> std::result::Result<Self, DataError> {
        let items: Vec<ItemDef> = ron::from_str(ron)?;
        Self::from_data(items)
    }

    /// Load a RON file of items.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, DataError> {
        let contents = read_data_file(path.as_ref())?;
        Self::from_ron_str(&contents)
    }

    /// Definition by index.
    #[must_use]
    pub fn get(&self, item: ItemId) -> Option<&ItemDef> {
        self.items.get(usize::from(item.0))
    }

    /// Index by script id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<ItemId> {
        self.by_id.get(id).copied()
    }

    /// The antimatter item, if defined.
    #[must_use]
    pub fn antimatter(&self) -> Option<ItemId> {
        self.items
            .iter()
            .position(|item| item.is_antimatter)
            .map(|index| ItemId(index as u16))
    }

    /// Whether the item takes base storage volume.
    #[must_use]
    pub fn stored_in_base_storage(&self, item: ItemId) -> bool {
        self.get(item)
            .is_some_and(|def| !def.is_virtual && !def.is_antimatter)
    }

    /// All definitions with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &ItemDef)> {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| (ItemId(index as u16), item))
    }
}

/// Item counts held by a base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ItemStorage {
    items: BTreeMap<ItemId, i32>,
}

impl ItemStorage {
    /// Units of an item.
    #[must_use]
    pub fn amount(&self, item: ItemId) -> i32 {
        self.items.get(&item).copied().unwrap_or(0)
    }

    /// Add (or remove, with a negative amount) units. Never drops below
    /// zero and saturates at `i32::MAX`. Returns the new amount.
    pub fn add(&mut self, item: ItemId, amount: i32) -> i32 {
        let new = self.amount(item).saturating_add(amount).max(0);
        if new == 0 {
            self.items.remove(&item);
        } else {
            self.items.insert(item, new);
        }
        new
    }

    /// Remove every unit of an item. Returns the amount removed.
    pub fn remove_all(&mut self, item: ItemId) -> i32 {
        self.items.remove(&item).unwrap_or(0)
    }

    /// Stored items with their amounts.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, i32)> + '_ {
        self.items.iter().map(|(&item, &amount)| (item, amount))
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Units of an item in a base (`B_ItemInBase`).
#[must_use]
pub fn item_in_base(base: &Base, item: ItemId) -> i32 {
    base.storage.amount(item)
}

/// Volume used by stored items, saturating at `i32::MAX`.
#[must_use]
pub fn stored_volume(catalog: &ItemCatalog, storage: &ItemStorage) -> i32 {
    storage
        .iter()
        .filter(|&(item, _)| catalog.stored_in_base_storage(item))
        .filter_map(|(item, amount)| catalog.get(item).map(|def| def.volume.saturating_mul(amount)))
        .fold(0, i32::saturating_add)
}

/// Add or remove items and keep the storage capacity in step.
///
/// Adding fails with [`BaseError::NoCapacity`] when the units do not fit,
/// unless `ignore_capacity` is set. Antimatter goes through
/// [`manage_antimatter`]. Returns the new amount in the base.
pub fn update_storage_and_capacity(
    campaign: &mut Campaign,
    base: BaseId,
    item_id: &str,
    amount: i32,
    ignore_capacity: bool,
) -> Result<i32> {
    let item = campaign
        .catalog
        .by_id(item_id)
        .ok_or_else(|| BaseError::UnknownItem(item_id.to_string()))?;
    campaign.founded_base(base)?;

    if campaign.catalog.antimatter() == Some(item) {
        manage_antimatter(campaign, base, amount.saturating_abs(), amount > 0)?;
        return Ok(item_in_base(campaign.base(base)?, item));
    }

    if amount > 0 && !ignore_capacity && campaign.catalog.stored_in_base_storage(item) {
        let volume = campaign.catalog.get(item).map_or(0, |def| def.volume);
        ledger::refresh_current(campaign, base, CapacityKind::Items)?;
        let free = campaign.free_capacity(base, CapacityKind::Items)?;
        let required = volume.checked_mul(amount).unwrap_or(i32::MAX);
        if free < required {
            return Err(BaseError::NoCapacity {
                kind: CapacityKind::Items,
                required,
                free,
            });
        }
    }

    let new = campaign.base_mut(base)?.storage.add(item, amount);
    ledger::update_storage_cap(campaign, base)?;
    Ok(new)
}

/// Add items if they fit (`B_AddToStorage`). Returns the new amount.
pub fn add_to_storage(campaign: &mut Campaign, base: BaseId, item_id: &str, amount: i32) -> Result<i32> {
    update_storage_and_capacity(campaign, base, item_id, amount, false)
}

/// Add or remove antimatter (`B_ManageAntimatter`).
///
/// Adding needs an operational antimatter facility and is clamped to its
/// free space; removing is clamped to the stock. Returns the units
/// actually moved.
pub fn manage_antimatter(campaign: &mut Campaign, base: BaseId, amount: i32, add: bool) -> Result<i32> {
    let item = campaign
        .catalog
        .antimatter()
        .ok_or_else(|| BaseError::UnknownItem("antimatter".into()))?;
    let target = campaign.base(base)?;

    let moved = if add {
        if !resolver::building_status(target, BuildingType::Antimatter) {
            return Err(BaseError::NoFunctionalBuilding(BuildingType::Antimatter));
        }
        let free = target.capacity(CapacityKind::Antimatter).max - target.storage.amount(item);
        amount.min(free).max(0)
    } else {
        amount.min(target.storage.amount(item)).max(0)
    };

    let delta = if add { moved } else { -moved };
    campaign.base_mut(base)?.storage.add(item, delta);
    ledger::update_antimatter_cap(campaign, base)?;
    if moved < amount {
        tracing::debug!(base = base.0, requested = amount, moved, add, "Antimatter transfer clamped");
    }
    Ok(moved)
}

/// Market value of everything stored in a base, saturating at `i64::MAX`.
pub fn storage_value(campaign: &Campaign, base: BaseId) -> Result<i64> {
    let target = campaign.base(base)?;
    Ok(target
        .storage
        .iter()
        .filter_map(|(item, amount)| {
            campaign
                .catalog
                .get(item)
                .map(|def| def.price.saturating_mul(i64::from(amount)))
        })
        .fold(0, i64::saturating_add))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CampaignConfig;
    use crate::grid::Tile;
    use crate::lifecycle;
    use crate::math::GeoPos;
    use crate::overflow;
    use crate::templates::{BuildingTemplateData, TemplateStore};

    fn catalog() -> ItemCatalog {
        ItemCatalog::from_ron_str(
            r#"[
                ItemDef(id: "rifle", volume: 20, price: 100),
                ItemDef(id: "antimatter", volume: 1, is_antimatter: true),
                ItemDef(id: "credits_bonus", is_virtual: true),
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_catalog_lookup() {
        let catalog = catalog();
        let rifle = catalog.by_id("rifle").unwrap();
        assert_eq!(catalog.get(rifle).unwrap().volume, 20);
        assert_eq!(catalog.antimatter(), catalog.by_id("antimatter"));
        assert!(catalog.stored_in_base_storage(rifle));
        assert!(!catalog.stored_in_base_storage(catalog.antimatter().unwrap()));
        assert!(!catalog.stored_in_base_storage(catalog.by_id("credits_bonus").unwrap()));
        assert!(catalog.by_id("plasma").is_none());
    }

    #[test]
    fn test_duplicate_items_rejected() {
        let err = ItemCatalog::from_ron_str(r#"[ItemDef(id: "a"), ItemDef(id: "a")]"#).unwrap_err();
        assert!(matches!(err, DataError::Invalid(_)));
    }

    #[test]
    fn test_storage_never_negative() {
        let mut storage = ItemStorage::default();
        assert_eq!(storage.add(ItemId(0), 5), 5);
        assert_eq!(storage.add(ItemId(0), -8), 0);
        assert!(storage.is_empty());
        storage.add(ItemId(1), 3);
        assert_eq!(storage.remove_all(ItemId(1)), 3);
        assert_eq!(storage.amount(ItemId(1)), 0);
    }

    fn campaign_with_storage() -> (Campaign, BaseId) {
        let templates = TemplateStore::from_data(vec![
            BuildingTemplateData::new("storage", BuildingType::Storage).with_capacity(100),
        ])
        .unwrap();
        let mut campaign = Campaign::new(CampaignConfig::default(), templates, catalog());
        let base = campaign.found_base("Alpha", GeoPos::default(), None).unwrap();
        lifecycle::build_from_template(&mut campaign, base, "storage", Tile::new(0, 0)).unwrap();
        (campaign, base)
    }

    #[test]
    fn test_storage_add_saturates() {
        let mut storage = ItemStorage::default();
        storage.add(ItemId(0), i32::MAX);
        assert_eq!(storage.add(ItemId(0), 5), i32::MAX);
        assert_eq!(storage.add(ItemId(0), i32::MIN), 0);
    }

    #[test]
    fn test_huge_amount_is_refused() {
        let (mut campaign, base) = campaign_with_storage();
        let rifle = campaign.catalog().by_id("rifle").unwrap();

        let err = add_to_storage(&mut campaign, base, "rifle", 200_000_000).unwrap_err();
        assert!(matches!(
            err,
            BaseError::NoCapacity {
                kind: CapacityKind::Items,
                required: i32::MAX,
                free: 100,
            }
        ));

        let target = campaign.base(base).unwrap();
        assert_eq!(item_in_base(target, rifle), 0);
        assert_eq!(target.capacity(CapacityKind::Items).cur, 0);
        assert_eq!(target.capacity(CapacityKind::Items).max, 100);

        assert_eq!(add_to_storage(&mut campaign, base, "rifle", 5).unwrap(), 5);
        assert_eq!(campaign.base(base).unwrap().capacity(CapacityKind::Items).cur, 100);
    }

    #[test]
    fn test_forced_huge_amount_overflows_without_wrapping() {
        let (mut campaign, base) = campaign_with_storage();
        update_storage_and_capacity(&mut campaign, base, "rifle", 200_000_000, true).unwrap();

        let capacity = campaign.base(base).unwrap().capacity(CapacityKind::Items);
        assert_eq!(capacity.cur, i32::MAX);
        assert!(capacity.is_overflowing());

        overflow::enforce_capacity(&mut campaign, base, CapacityKind::Items).unwrap();
        let target = campaign.base(base).unwrap();
        assert!(target.storage().is_empty());
        assert_eq!(target.capacity(CapacityKind::Items).cur, 0);
    }

    #[test]
    fn test_storage_value_saturates() {
        let (mut campaign, base) = campaign_with_storage();
        add_to_storage(&mut campaign, base, "rifle", 2).unwrap();
        assert_eq!(storage_value(&campaign, base).unwrap(), 200);

        update_storage_and_capacity(&mut campaign, base, "rifle", i32::MAX, true).unwrap();
        assert_eq!(storage_value(&campaign, base).unwrap(), i64::from(i32::MAX) * 100);
    }

    #[test]
    fn test_stored_volume_skips_special_items() {
        let catalog = catalog();
        let mut storage = ItemStorage::default();
        storage.add(catalog.by_id("rifle").unwrap(), 3);
        storage.add(catalog.antimatter().unwrap(), 50);
        storage.add(catalog.by_id("credits_bonus").unwrap(), 7);
        assert_eq!(stored_volume(&catalog, &storage), 60);
    }
}
