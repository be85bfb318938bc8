use std::collections::HashMap;
use std::fmt;

use super::{Segment, StreetClass};

/// Which OSM element a feature was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementKind {
    Way,
    Relation,
}

/// Feature identity. Way and relation ids are separate OSM namespaces,
/// so the element kind is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId {
    pub kind: ElementKind,
    pub id: u64,
}

impl FeatureId {
    pub fn way(id: u64) -> Self {
        Self {
            kind: ElementKind::Way,
            id,
        }
    }

    pub fn relation(id: u64) -> Self {
        Self {
            kind: ElementKind::Relation,
            id,
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ElementKind::Way => write!(f, "way/{}", self.id),
            ElementKind::Relation => write!(f, "relation/{}", self.id),
        }
    }
}

/// Semantic category, which decides layer and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Building,
    Park,
    Water,
    Street(StreetClass),
}

const PARK_LEISURE: &[&str] = &["park", "garden", "playground", "pitch", "nature_reserve"];
const PARK_LANDUSE: &[&str] = &[
    "grass",
    "forest",
    "meadow",
    "recreation_ground",
    "village_green",
];
const PARK_NATURAL: &[&str] = &["wood", "scrub", "grassland"];
const WATER_NATURAL: &[&str] = &["water", "bay", "wetland"];
const WATER_WATERWAY: &[&str] = &["riverbank", "dock"];
const WATER_LANDUSE: &[&str] = &["reservoir", "basin"];

impl FeatureKind {
    /// Classify an element from its tags. Buildings win over everything
    /// else, then streets, parks and water.
    pub fn from_tags(tags: &HashMap<String, String>) -> Option<FeatureKind> {
        let has = |key: &str, values: &[&str]| {
            tags.get(key).is_some_and(|v| values.contains(&v.as_str()))
        };

        if tags.contains_key("building") {
            return Some(FeatureKind::Building);
        }
        if let Some(highway) = tags.get("highway") {
            return StreetClass::from_highway_tag(highway).map(FeatureKind::Street);
        }
        if has("leisure", PARK_LEISURE)
            || has("landuse", PARK_LANDUSE)
            || has("natural", PARK_NATURAL)
        {
            return Some(FeatureKind::Park);
        }
        if has("natural", WATER_NATURAL)
            || has("waterway", WATER_WATERWAY)
            || has("landuse", WATER_LANDUSE)
        {
            return Some(FeatureKind::Water);
        }
        None
    }
}

/// How the feature arrived from the survey data
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureSource {
    /// A single way, closed or open
    SinglePath(Segment),
    /// Role-tagged member ways of a relation, in arbitrary order and direction
    MultiPartBoundary(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub kind: FeatureKind,
    pub source: FeatureSource,
}

impl Feature {
    pub fn new(id: FeatureId, kind: FeatureKind, source: FeatureSource) -> Self {
        Self { id, kind, source }
    }
}
