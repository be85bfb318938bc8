use tracing::debug;

use crate::domain::{Feature, FeatureId, FeatureKind, FeatureSource, Role, Segment};
use crate::osm::PrimitiveStore;

/// Relation types whose members describe an area boundary
const AREA_RELATION_TYPES: &[&str] = &["multipolygon", "building"];

/// Turn indexed primitives into classified features
///
/// # Algorithm
/// 1. Every tagged way with at least two node refs becomes a
///    `SinglePath` feature
/// 2. Every tagged multipolygon/building relation becomes a
///    `MultiPartBoundary` of its role-tagged member ways; members whose
///    way is missing from the response or whose role is not part of the
///    boundary are skipped
/// 3. Untagged ways (relation members fetched by recursion) and unknown
///    categories are ignored
///
/// The result is sorted by feature id so downstream stages are
/// deterministic regardless of hash map iteration order.
pub fn extract_features(store: &PrimitiveStore) -> Vec<Feature> {
    let mut features = Vec::new();

    for way in store.ways() {
        let Some(kind) = FeatureKind::from_tags(&way.tags) else {
            continue;
        };
        if way.nodes.len() < 2 {
            debug!("way/{} has {} node refs, skipping", way.id, way.nodes.len());
            continue;
        }

        features.push(Feature::new(
            FeatureId::way(way.id),
            kind,
            FeatureSource::SinglePath(Segment::untagged(way.nodes.clone())),
        ));
    }

    for relation in store.relations() {
        let Some(kind) = FeatureKind::from_tags(&relation.tags) else {
            continue;
        };
        let is_area_relation = relation
            .tags
            .get("type")
            .is_none_or(|t| AREA_RELATION_TYPES.contains(&t.as_str()));
        if !is_area_relation {
            continue;
        }

        let segments: Vec<Segment> = relation
            .members
            .iter()
            .filter_map(|member| {
                let role = Role::from_member_role(&member.role)?;
                let way = store.way(member.way)?;
                Some(Segment::new(way.nodes.clone(), Some(role)))
            })
            .filter(|segment| segment.points.len() >= 2)
            .collect();

        if segments.is_empty() {
            debug!("relation/{} has no usable member ways", relation.id);
            continue;
        }

        features.push(Feature::new(
            FeatureId::relation(relation.id),
            kind,
            FeatureSource::MultiPartBoundary(segments),
        ));
    }

    features.sort_by_key(|f| f.id);
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::OverpassResponse;
    use crate::domain::{PointId, StreetClass};

    fn store(json: &str) -> PrimitiveStore {
        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        PrimitiveStore::from_response(&response)
    }

    #[test]
    fn test_extract_way_features() {
        let s = store(
            r#"{"elements": [
                {"type": "way", "id": 1, "nodes": [1, 2, 3, 1], "tags": {"building": "yes"}},
                {"type": "way", "id": 2, "nodes": [4, 5], "tags": {"highway": "residential"}},
                {"type": "way", "id": 3, "nodes": [6, 7], "tags": {"highway": "proposed"}},
                {"type": "way", "id": 4, "nodes": [8], "tags": {"building": "yes"}},
                {"type": "way", "id": 5, "nodes": [1, 2]}
            ]}"#,
        );

        let features = extract_features(&s);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, FeatureId::way(1));
        assert_eq!(features[0].kind, FeatureKind::Building);
        assert_eq!(
            features[1].kind,
            FeatureKind::Street(StreetClass::Residential)
        );
    }

    #[test]
    fn test_extract_relation_members() {
        let s = store(
            r#"{"elements": [
                {"type": "relation", "id": 50, "tags": {"type": "multipolygon", "building": "yes"},
                 "members": [
                    {"type": "way", "ref": 10, "role": "outer"},
                    {"type": "way", "ref": 11, "role": "inner"},
                    {"type": "way", "ref": 12, "role": "part"},
                    {"type": "way", "ref": 99, "role": "outer"}
                 ]},
                {"type": "relation", "id": 51, "tags": {"type": "route", "highway": "primary"},
                 "members": [{"type": "way", "ref": 10, "role": ""}]},
                {"type": "way", "id": 10, "nodes": [1, 2, 3, 1]},
                {"type": "way", "id": 11, "nodes": [4, 5, 6, 4]},
                {"type": "way", "id": 12, "nodes": [7, 8, 9, 7]}
            ]}"#,
        );

        let features = extract_features(&s);
        assert_eq!(features.len(), 1);
        let FeatureSource::MultiPartBoundary(segments) = &features[0].source else {
            panic!("expected a multi-part boundary");
        };
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].role, Some(Role::Outer));
        assert_eq!(segments[1].role, Some(Role::Inner));
        assert_eq!(segments[1].points[0], PointId(4));
    }
}
