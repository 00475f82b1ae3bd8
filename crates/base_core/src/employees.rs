//! Employees and hiring.
//!
//! Hired soldiers, scientists, workers and pilots live in quarters. Robots
//! need no quarters but take up storage volume.

use serde::{Deserialize, Serialize};

use crate::base::BaseId;
use crate::campaign::Campaign;
use crate::capacity::CapacityKind;
use crate::error::{BaseError, Result};
use crate::events::CampaignEvent;
use crate::ledger;

/// Employee category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EmployeeType {
    /// Soldier.
    Soldier,
    /// Scientist, works in laboratories.
    Scientist,
    /// Worker, works in workshops.
    Worker,
    /// Pilot.
    Pilot,
    /// Robot (UGV), stored like an item.
    Robot,
}

impl EmployeeType {
    /// Every type, in index order.
    pub const ALL: [Self; 5] = [
        Self::Soldier,
        Self::Scientist,
        Self::Worker,
        Self::Pilot,
        Self::Robot,
    ];

    /// Whether the employee needs quarters.
    #[must_use]
    pub const fn needs_quarters(self) -> bool {
        !matches!(self, Self::Robot)
    }
}

/// Order in which employees are let go when quarters overflow.
const DELETION_ORDER: [EmployeeType; 4] = [
    EmployeeType::Pilot,
    EmployeeType::Worker,
    EmployeeType::Scientist,
    EmployeeType::Soldier,
];

/// Unique employee identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub u32);

/// One employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Identifier.
    pub id: EmployeeId,
    /// Category.
    pub kind: EmployeeType,
    /// Display name.
    pub name: String,
    /// Base the employee is hired at, if any.
    pub base: Option<BaseId>,
}

/// Every employee in the campaign, hired or not.
#[derive(Debug, Clone, Default)]
pub struct EmployeePool {
    employees: Vec<Employee>,
    next_id: u32,
}

impl EmployeePool {
    /// Add an unhired employee to the market.
    pub fn add_unhired(&mut self, kind: EmployeeType, name: impl Into<String>) -> EmployeeId {
        let id = EmployeeId(self.next_id);
        self.next_id += 1;
        self.employees.push(Employee {
            id,
            kind,
            name: name.into(),
            base: None,
        });
        id
    }

    /// Employee by id.
    #[must_use]
    pub fn get(&self, id: EmployeeId) -> Option<&Employee> {
        self.employees.iter().find(|employee| employee.id == id)
    }

    /// All employees.
    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.employees.iter()
    }

    /// First unhired employee of a type.
    #[must_use]
    pub fn first_unhired(&self, kind: EmployeeType) -> Option<EmployeeId> {
        self.employees
            .iter()
            .find(|employee| employee.kind == kind && employee.base.is_none())
            .map(|employee| employee.id)
    }

    /// Employees of a type hired at a base, in hiring order.
    #[must_use]
    pub fn hired_at(&self, base: BaseId, kind: EmployeeType) -> Vec<EmployeeId> {
        self.employees
            .iter()
            .filter(|employee| employee.base == Some(base) && employee.kind == kind)
            .map(|employee| employee.id)
            .collect()
    }

    /// Number of employees of a type hired at a base.
    #[must_use]
    pub fn count_hired(&self, base: BaseId, kind: EmployeeType) -> i32 {
        self.employees
            .iter()
            .filter(|employee| employee.base == Some(base) && employee.kind == kind)
            .count() as i32
    }

    /// Number of employees living in the quarters of a base.
    #[must_use]
    pub fn count_all_hired(&self, base: BaseId) -> i32 {
        self.employees
            .iter()
            .filter(|employee| employee.base == Some(base) && employee.kind.needs_quarters())
            .count() as i32
    }

    fn get_mut(&mut self, id: EmployeeId) -> Option<&mut Employee> {
        self.employees.iter_mut().find(|employee| employee.id == id)
    }

    /// Remove an employee for good.
    pub fn delete(&mut self, id: EmployeeId) -> Option<Employee> {
        let index = self.employees.iter().position(|employee| employee.id == id)?;
        Some(self.employees.remove(index))
    }
}

/// Capacity kinds whose usage depends on staff.
const STAFF_CAPACITIES: [CapacityKind; 4] = [
    CapacityKind::Employees,
    CapacityKind::Items,
    CapacityKind::LabSpace,
    CapacityKind::Workspace,
];

fn refresh_staff_capacities(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    for kind in STAFF_CAPACITIES {
        ledger::refresh_current(campaign, base, kind)?;
    }
    Ok(())
}

/// Hire an unhired employee at a base.
///
/// Staff need one free quarters slot; robots need storage volume.
pub fn hire(campaign: &mut Campaign, base: BaseId, id: EmployeeId) -> Result<()> {
    campaign.founded_base(base)?;
    let kind = match campaign.employees.get(id) {
        Some(employee) if employee.base.is_none() => employee.kind,
        _ => return Err(BaseError::UnknownEmployee(id)),
    };

    let (capacity, required) = if kind.needs_quarters() {
        (CapacityKind::Employees, 1)
    } else {
        (CapacityKind::Items, campaign.config.robot_storage_volume)
    };
    ledger::refresh_current(campaign, base, capacity)?;
    let free = campaign.free_capacity(base, capacity)?;
    if free < required {
        return Err(BaseError::NoCapacity {
            kind: capacity,
            required,
            free,
        });
    }

    if let Some(employee) = campaign.employees.get_mut(id) {
        employee.base = Some(base);
    }
    tracing::debug!(base = base.0, employee = id.0, ?kind, "Employee hired");
    refresh_staff_capacities(campaign, base)
}

/// Release a hired employee back to the market.
pub fn fire(campaign: &mut Campaign, id: EmployeeId) -> Result<()> {
    let employee = campaign
        .employees
        .get_mut(id)
        .ok_or(BaseError::UnknownEmployee(id))?;
    let Some(base) = employee.base.take() else {
        return Err(BaseError::UnknownEmployee(id));
    };
    refresh_staff_capacities(campaign, base)
}

fn delete_hired(campaign: &mut Campaign, base: BaseId, id: EmployeeId) {
    if let Some(employee) = campaign.employees.delete(id) {
        tracing::info!(base = base.0, employee = id.0, kind = ?employee.kind, "Employee deleted");
        campaign.emit(CampaignEvent::EmployeeDeleted {
            base,
            employee: id,
            kind: employee.kind,
        });
    }
}

/// Delete employees until the hired staff fit the quarters.
///
/// Pilots go first, then workers, scientists and soldiers; within a type
/// the most recently hired go first. Robots are never affected.
pub fn delete_exceeding_employees(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    ledger::refresh_current(campaign, base, CapacityKind::Employees)?;
    let mut excess = -campaign.free_capacity(base, CapacityKind::Employees)?;
    for kind in DELETION_ORDER {
        if excess <= 0 {
            break;
        }
        let mut hired = campaign.employees.hired_at(base, kind);
        while excess > 0 {
            let Some(id) = hired.pop() else {
                break;
            };
            delete_hired(campaign, base, id);
            excess -= 1;
        }
    }
    refresh_staff_capacities(campaign, base)
}

/// Delete one hired robot. Returns `false` if the base has none.
pub(crate) fn delete_one_robot(campaign: &mut Campaign, base: BaseId) -> bool {
    match campaign.employees.hired_at(base, EmployeeType::Robot).pop() {
        Some(id) => {
            delete_hired(campaign, base, id);
            true
        }
        None => false,
    }
}

/// Delete everybody hired at a base.
pub fn delete_all_at_base(campaign: &mut Campaign, base: BaseId) -> Result<()> {
    for kind in EmployeeType::ALL {
        for id in campaign.employees.hired_at(base, kind) {
            delete_hired(campaign, base, id);
        }
    }
    refresh_staff_capacities(campaign, base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_counts() {
        let mut pool = EmployeePool::default();
        let a = pool.add_unhired(EmployeeType::Soldier, "Ash");
        let b = pool.add_unhired(EmployeeType::Robot, "UGV");
        let c = pool.add_unhired(EmployeeType::Scientist, "Kim");
        assert_ne!(a, b);

        for id in [a, b, c] {
            pool.get_mut(id).unwrap().base = Some(BaseId(0));
        }
        assert_eq!(pool.count_all_hired(BaseId(0)), 2);
        assert_eq!(pool.count_hired(BaseId(0), EmployeeType::Robot), 1);
        assert_eq!(pool.count_all_hired(BaseId(1)), 0);
        assert_eq!(pool.first_unhired(EmployeeType::Soldier), None);

        assert!(pool.delete(a).is_some());
        assert!(pool.get(a).is_none());
        assert_eq!(pool.count_all_hired(BaseId(0)), 1);
    }

    #[test]
    fn test_first_unhired() {
        let mut pool = EmployeePool::default();
        let a = pool.add_unhired(EmployeeType::Worker, "A");
        let b = pool.add_unhired(EmployeeType::Worker, "B");
        assert_eq!(pool.first_unhired(EmployeeType::Worker), Some(a));
        pool.get_mut(a).unwrap().base = Some(BaseId(0));
        assert_eq!(pool.first_unhired(EmployeeType::Worker), Some(b));
        assert_eq!(pool.hired_at(BaseId(0), EmployeeType::Worker), vec![a]);
    }

    #[test]
    fn test_robots_need_no_quarters() {
        assert!(EmployeeType::Pilot.needs_quarters());
        assert!(!EmployeeType::Robot.needs_quarters());
    }
}
