//! Building templates and the building dependency graph.
//!
//! Templates are immutable per-type definitions shared by every base. They
//! are loaded from RON data, after which each template's `depends_on`
//! reference is resolved to the *building type* it needs. The resolved
//! dependencies form a [`DependencyGraph`] keyed by type, which the status
//! resolver walks when a type is enabled or disabled.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{whole_fixed_serde, Fixed};

// ============================================================================
// Building types
// ============================================================================

/// Functional category of a building.
///
/// `Misc` buildings have no function and are always considered operational.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Decoration and anything without a function.
    Misc,
    /// Laboratory (lab space).
    Lab,
    /// Living quarters (employees).
    Quarters,
    /// Item storage.
    Storage,
    /// Workshop (workspace).
    Workshop,
    /// Hospital.
    Hospital,
    /// Hangar for large aircraft.
    Hangar,
    /// Alien containment.
    AlienContainment,
    /// Hangar for small aircraft.
    SmallHangar,
    /// Power plant.
    Power,
    /// Command centre.
    Command,
    /// Antimatter storage.
    Antimatter,
    /// Base entrance.
    Entrance,
    /// Missile defence.
    DefenceMissile,
    /// Laser defence.
    DefenceLaser,
    /// Radar.
    Radar,
}

/// Number of building types (`MAX_BUILDING_TYPE`).
pub const MAX_BUILDING_TYPE: usize = 16;

impl BuildingType {
    /// Every building type, in index order.
    pub const ALL: [Self; MAX_BUILDING_TYPE] = [
        Self::Misc,
        Self::Lab,
        Self::Quarters,
        Self::Storage,
        Self::Workshop,
        Self::Hospital,
        Self::Hangar,
        Self::AlienContainment,
        Self::SmallHangar,
        Self::Power,
        Self::Command,
        Self::Antimatter,
        Self::Entrance,
        Self::DefenceMissile,
        Self::DefenceLaser,
        Self::Radar,
    ];

    /// Index of this type in per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for BuildingType {
    type Error = usize;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL.get(index).copied().ok_or(index)
    }
}

/// Tiles covered by a building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Footprint {
    /// One tile.
    #[default]
    Single,
    /// Two horizontally adjacent tiles.
    Double,
}

impl Footprint {
    /// Number of tiles covered.
    #[must_use]
    pub const fn width(self) -> u32 {
        match self {
            Self::Single => 1,
            Self::Double => 2,
        }
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Index of a template inside a [`TemplateStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u16);

/// Immutable definition of a building, shared across bases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingTemplate {
    /// Index within the store.
    pub tid: TemplateId,
    /// Script identifier, e.g. `building_lab`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Functional category.
    pub building_type: BuildingType,
    /// Tiles covered.
    pub footprint: Footprint,
    /// Capacity granted to the mapped capacity kind.
    pub capacity: i32,
    /// One-off construction cost.
    pub fix_costs: i64,
    /// Monthly upkeep.
    pub var_costs: i64,
    /// Construction time in days.
    pub build_time: u32,
    /// Template this one depends on.
    pub depends_on: Option<TemplateId>,
    /// Building type of `depends_on`.
    pub depends_type: Option<BuildingType>,
    /// Built automatically when a base is set up without a base template.
    pub mandatory: bool,
    /// Maximum number per base (0 = unlimited).
    pub max_count: u32,
    /// Upgrade level.
    pub level: Fixed,
    /// Command fired when construction finishes.
    pub on_construct: Option<String>,
    /// Command fired when the base is attacked.
    pub on_attack: Option<String>,
    /// Command fired when a working building is destroyed.
    pub on_destroy: Option<String>,
}

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingTemplateData(
///     id: "building_radar",
///     name: "Radar",
///     building_type: Radar,
///     fix_costs: 50000,
///     var_costs: 5000,
///     build_time: 10,
///     depends_on: Some("building_command"),
///     level: 1,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTemplateData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Functional category.
    pub building_type: BuildingType,
    /// Tiles covered.
    #[serde(default)]
    pub footprint: Footprint,
    /// Capacity value.
    #[serde(default)]
    pub capacity: i32,
    /// One-off construction cost.
    #[serde(default)]
    pub fix_costs: i64,
    /// Monthly upkeep.
    #[serde(default)]
    pub var_costs: i64,
    /// Construction time in days.
    #[serde(default)]
    pub build_time: u32,
    /// Id of the template this one depends on.
    #[serde(default)]
    pub depends_on: Option<String>,
    /// Built automatically on base set-up.
    #[serde(default)]
    pub mandatory: bool,
    /// Maximum number per base (0 = unlimited).
    #[serde(default)]
    pub max_count: u32,
    /// Upgrade level.
    #[serde(default = "default_level", with = "whole_fixed_serde")]
    pub level: Fixed,
    /// Command fired on construction.
    #[serde(default)]
    pub on_construct: Option<String>,
    /// Command fired on attack.
    #[serde(default)]
    pub on_attack: Option<String>,
    /// Command fired on destruction.
    #[serde(default)]
    pub on_destroy: Option<String>,
}

fn default_level() -> Fixed {
    Fixed::ONE
}

impl BuildingTemplateData {
    /// Create a definition with default costs and no dependency.
    #[must_use]
    pub fn new(id: impl Into<String>, building_type: BuildingType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            building_type,
            footprint: Footprint::Single,
            capacity: 0,
            fix_costs: 0,
            var_costs: 0,
            build_time: 0,
            depends_on: None,
            mandatory: false,
            max_count: 0,
            level: Fixed::ONE,
            on_construct: None,
            on_attack: None,
            on_destroy: None,
        }
    }

    /// Set the capacity value.
    #[must_use]
    pub fn with_capacity(mut self, capacity: i32) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set construction and upkeep costs.
    #[must_use]
    pub fn with_costs(mut self, fix_costs: i64, var_costs: i64) -> Self {
        self.fix_costs = fix_costs;
        self.var_costs = var_costs;
        self
    }

    /// Set construction time in days.
    #[must_use]
    pub fn with_build_time(mut self, days: u32) -> Self {
        self.build_time = days;
        self
    }

    /// Declare a dependency on another template.
    #[must_use]
    pub fn depends_on(mut self, template_id: impl Into<String>) -> Self {
        self.depends_on = Some(template_id.into());
        self
    }

    /// Make this a two-tile building.
    #[must_use]
    pub fn double(mut self) -> Self {
        self.footprint = Footprint::Double;
        self
    }

    /// Mark as mandatory.
    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Limit the number per base.
    #[must_use]
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = max_count;
        self
    }

    /// Set the upgrade level.
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Fixed::from_num(level);
        self
    }

    /// Set the construct/attack/destroy trigger commands.
    #[must_use]
    pub fn with_triggers(
        mut self,
        on_construct: Option<&str>,
        on_attack: Option<&str>,
        on_destroy: Option<&str>,
    ) -> Self {
        self.on_construct = on_construct.map(str::to_string);
        self.on_attack = on_attack.map(str::to_string);
        self.on_destroy = on_destroy.map(str::to_string);
        self
    }
}

/// Errors raised while loading data files.
#[derive(Error, Debug)]
pub enum DataError {
    /// Failed to read a file.
    #[error("Failed to read data file '{path}': {message}")]
    Io {
        /// File path.
        path: String,
        /// IO error message.
        message: String,
    },
    /// Failed to parse RON.
    #[error("Failed to parse data: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Two templates share an id.
    #[error("Duplicate building template '{0}'")]
    DuplicateTemplate(String),
    /// A dependency names a template that does not exist.
    #[error("Template '{template}' depends on unknown template '{depends_on}'")]
    UnknownDependency {
        /// Declaring template.
        template: String,
        /// Missing template.
        depends_on: String,
    },
    /// A template depends on its own type.
    #[error("Template '{0}' depends on its own building type")]
    SelfDependency(String),
    /// Too many templates for the id space.
    #[error("Too many building templates: {0}")]
    TooManyTemplates(usize),
    /// A referenced item, template or base entry is inconsistent.
    #[error("Invalid data: {0}")]
    Invalid(String),
}

/// Read a data file into a string.
pub(crate) fn read_data_file(path: &Path) -> Result<String, DataError> {
    std::fs::read_to_string(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

// ============================================================================
// Dependency graph
// ============================================================================

/// Type-level dependency graph: for each building type, the types that
/// have at least one template depending on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependents: Vec<Vec<BuildingType>>,
}

impl DependencyGraph {
    fn build(templates: &[BuildingTemplate]) -> Self {
        let mut dependents = vec![Vec::new(); MAX_BUILDING_TYPE];
        for template in templates {
            if let Some(needed) = template.depends_type {
                let list: &mut Vec<BuildingType> = &mut dependents[needed.index()];
                if !list.contains(&template.building_type) {
                    list.push(template.building_type);
                }
            }
        }
        for list in &mut dependents {
            list.sort_unstable();
        }
        Self { dependents }
    }

    /// Types that depend on `building_type`.
    #[must_use]
    pub fn dependents(&self, building_type: BuildingType) -> &[BuildingType] {
        self.dependents
            .get(building_type.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Find a dependency cycle between types, if any.
    ///
    /// Types on a cycle can never become operational.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<BuildingType>> {
        // 0 = unvisited, 1 = on stack, 2 = done
        let mut state = [0u8; MAX_BUILDING_TYPE];
        let mut stack = Vec::new();

        fn visit(
            graph: &DependencyGraph,
            node: BuildingType,
            state: &mut [u8; MAX_BUILDING_TYPE],
            stack: &mut Vec<BuildingType>,
        ) -> Option<Vec<BuildingType>> {
            state[node.index()] = 1;
            stack.push(node);
            for &next in graph.dependents(node) {
                match state[next.index()] {
                    0 => {
                        if let Some(cycle) = visit(graph, next, state, stack) {
                            return Some(cycle);
                        }
                    }
                    1 => {
                        let start = stack.iter().position(|&t| t == next).unwrap_or(0);
                        return Some(stack[start..].to_vec());
                    }
                    _ => {}
                }
            }
            stack.pop();
            state[node.index()] = 2;
            None
        }

        for node in BuildingType::ALL {
            if state[node.index()] == 0 {
                if let Some(cycle) = visit(self, node, &mut state, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

// ============================================================================
// Template store
// ============================================================================

/// Registry of all building templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: Vec<BuildingTemplate>,
    by_id: HashMap<String, TemplateId>,
    graph: DependencyGraph,
}

impl TemplateStore {
    /// Build the store from definitions, resolving dependencies.
    pub fn from_data(data: Vec<BuildingTemplateData>) -> Result<Self, DataError> {
        if data.len() > usize::from(u16::MAX) {
            return Err(DataError::TooManyTemplates(data.len()));
        }

        let mut by_id = HashMap::with_capacity(data.len());
        for (index, entry) in data.iter().enumerate() {
            if by_id
                .insert(entry.id.clone(), TemplateId(index as u16))
                .is_some()
            {
                return Err(DataError::DuplicateTemplate(entry.id.clone()));
            }
        }

        let mut templates = Vec::with_capacity(data.len());
        for (index, entry) in data.iter().enumerate() {
            let depends_on = match &entry.depends_on {
                Some(dep) => Some(*by_id.get(dep).ok_or_else(|| DataError::UnknownDependency {
                    template: entry.id.clone(),
                    depends_on: dep.clone(),
                })?),
                None => None,
            };
            let depends_type = depends_on.map(|tid| data[usize::from(tid.0)].building_type);
            if depends_type == Some(entry.building_type) {
                return Err(DataError::SelfDependency(entry.id.clone()));
            }

            templates.push(BuildingTemplate {
                tid: TemplateId(index as u16),
                id: entry.id.clone(),
                name: entry.name.clone(),
                building_type: entry.building_type,
                footprint: entry.footprint,
                capacity: entry.capacity,
                fix_costs: entry.fix_costs,
                var_costs: entry.var_costs,
                build_time: entry.build_time,
                depends_on,
                depends_type,
                mandatory: entry.mandatory,
                max_count: entry.max_count,
                level: entry.level,
                on_construct: entry.on_construct.clone(),
                on_attack: entry.on_attack.clone(),
                on_destroy: entry.on_destroy.clone(),
            });
        }

        let graph = DependencyGraph::build(&templates);
        tracing::debug!(count = templates.len(), "Loaded building templates");
        Ok(Self {
            templates,
            by_id,
            graph,
        })
    }

    /// Parse a RON list of [`BuildingTemplateData`].
    pub fn from_ron_str(ron: &str) -> Result<Self, DataError> {
        let data: Vec<BuildingTemplateData> = ron::from_str(ron)?;
        Self::from_data(data)
    }

    /// Load a RON file of templates.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DataError> {
        let contents = read_data_file(path.as_ref())?;
        Self::from_ron_str(&contents)
    }

    /// Template by index.
    #[must_use]
    pub fn get(&self, tid: TemplateId) -> Option<&BuildingTemplate> {
        self.templates.get(usize::from(tid.0))
    }

    /// Template by script id.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<&BuildingTemplate> {
        self.by_id.get(id).and_then(|&tid| self.get(tid))
    }

    /// All templates in load order.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingTemplate> {
        self.templates.iter()
    }

    /// Templates flagged mandatory.
    pub fn mandatory(&self) -> impl Iterator<Item = &BuildingTemplate> {
        self.templates.iter().filter(|t| t.mandatory)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The type-level dependency graph.
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}
