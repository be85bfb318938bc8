use std::fmt;

/// OSM node identifier, unique within one query response
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A surveyed point in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: PointId,
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(id: u64, lat: f64, lon: f64) -> Self {
        Self {
            id: PointId(id),
            lat,
            lon,
        }
    }
}

/// Role of a way inside a grouped boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Outer,
    Inner,
}

impl Role {
    /// Map an OSM member role string to a boundary role.
    ///
    /// An empty role is read as `outer`, which is how most editors leave
    /// untagged multipolygon members; `outline` is the outer role of
    /// `type=building` relations. Anything else (`part`, `label`, ...) is
    /// not part of the boundary.
    pub fn from_member_role(role: &str) -> Option<Role> {
        match role {
            "outer" | "outline" | "" => Some(Role::Outer),
            "inner" => Some(Role::Inner),
            _ => None,
        }
    }
}

/// Raw line sequence: an ordered list of point ids, optionally role-tagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub points: Vec<PointId>,
    pub role: Option<Role>,
}

impl Segment {
    pub fn new(points: Vec<PointId>, role: Option<Role>) -> Self {
        Self { points, role }
    }

    pub fn untagged(points: Vec<PointId>) -> Self {
        Self::new(points, None)
    }

    pub fn first(&self) -> Option<PointId> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<PointId> {
        self.points.last().copied()
    }

    /// First and last ids match and there is something in between
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 2 && self.first() == self.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_member_role() {
        assert_eq!(Role::from_member_role("outer"), Some(Role::Outer));
        assert_eq!(Role::from_member_role(""), Some(Role::Outer));
        assert_eq!(Role::from_member_role("outline"), Some(Role::Outer));
        assert_eq!(Role::from_member_role("inner"), Some(Role::Inner));
        assert_eq!(Role::from_member_role("part"), None);
    }

    #[test]
    fn test_segment_closed() {
        let closed = Segment::untagged(vec![PointId(1), PointId(2), PointId(3), PointId(1)]);
        let open = Segment::untagged(vec![PointId(1), PointId(2), PointId(3)]);
        assert!(closed.is_closed());
        assert!(!open.is_closed());
        assert!(!Segment::untagged(vec![PointId(1)]).is_closed());
    }
}
