use std::collections::HashMap;

use tracing::debug;

use crate::api::OverpassResponse;
use crate::domain::{Point, PointId};

/// A way as fetched: ordered node references plus tags
#[derive(Debug, Clone, Default)]
pub struct WayRecord {
    pub id: u64,
    pub nodes: Vec<PointId>,
    pub tags: HashMap<String, String>,
}

/// A relation member way with its raw role string
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub way: u64,
    pub role: String,
}

#[derive(Debug, Clone, Default)]
pub struct RelationRecord {
    pub id: u64,
    pub members: Vec<MemberRecord>,
    pub tags: HashMap<String, String>,
}

/// Raw survey primitives of one or more query responses.
/// Read-only once built.
#[derive(Debug, Default)]
pub struct PrimitiveStore {
    points: HashMap<PointId, Point>,
    ways: HashMap<u64, WayRecord>,
    relations: HashMap<u64, RelationRecord>,
}

impl PrimitiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every node, way and relation of an Overpass response
    pub fn from_response(response: &OverpassResponse) -> Self {
        let mut store = Self::new();
        store.insert_response(response);
        store
    }

    /// Merge several responses; later duplicates replace earlier ones
    pub fn merge<'a>(responses: impl IntoIterator<Item = &'a OverpassResponse>) -> Self {
        let mut store = Self::new();
        for response in responses {
            store.insert_response(response);
        }
        store
    }

    fn insert_response(&mut self, response: &OverpassResponse) {
        for element in &response.elements {
            match element.type_.as_str() {
                "node" => {
                    if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                        self.insert_point(Point::new(element.id, lat, lon));
                    }
                }
                "way" => {
                    let nodes = element
                        .nodes
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .map(|&id| PointId(id))
                        .collect();
                    let tags = element.tags.clone().unwrap_or_default();
                    // `out skel` repeats member ways without tags
                    let tags = match self.ways.get(&element.id) {
                        Some(existing) if tags.is_empty() => existing.tags.clone(),
                        _ => tags,
                    };
                    self.insert_way(WayRecord {
                        id: element.id,
                        nodes,
                        tags,
                    });
                }
                "relation" => {
                    let members = element
                        .members
                        .as_deref()
                        .unwrap_or_default()
                        .iter()
                        .filter(|m| m.type_ == "way")
                        .map(|m| MemberRecord {
                            way: m.ref_,
                            role: m.role.clone(),
                        })
                        .collect();
                    self.insert_relation(RelationRecord {
                        id: element.id,
                        members,
                        tags: element.tags.clone().unwrap_or_default(),
                    });
                }
                other => debug!("Skipping unknown element type {other}"),
            }
        }
    }

    pub fn insert_point(&mut self, point: Point) {
        self.points.insert(point.id, point);
    }

    pub fn insert_way(&mut self, way: WayRecord) {
        self.ways.insert(way.id, way);
    }

    pub fn insert_relation(&mut self, relation: RelationRecord) {
        self.relations.insert(relation.id, relation);
    }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.get(&id)
    }

    pub fn way(&self, id: u64) -> Option<&WayRecord> {
        self.ways.get(&id)
    }

    pub fn relation(&self, id: u64) -> Option<&RelationRecord> {
        self.relations.get(&id)
    }

    pub fn ways(&self) -> impl Iterator<Item = &WayRecord> {
        self.ways.values()
    }

    pub fn relations(&self) -> impl Iterator<Item = &RelationRecord> {
        self.relations.values()
    }

    /// Resolve ids to points, dropping ids the response did not include
    pub fn resolve(&self, ids: &[PointId]) -> Vec<Point> {
        let points: Vec<Point> = ids.iter().filter_map(|id| self.point(*id).copied()).collect();
        if points.len() < ids.len() {
            debug!("{} of {} point ids missing", ids.len() - points.len(), ids.len());
        }
        points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn way_count(&self) -> usize {
        self.ways.len()
    }
}
