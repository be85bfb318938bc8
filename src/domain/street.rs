/// Street classification based on OSM highway tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StreetClass {
    Motorway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Path,
}

impl StreetClass {
    /// Classify a highway tag value into a StreetClass
    pub fn from_highway_tag(tag: &str) -> Option<StreetClass> {
        match tag {
            "motorway" | "motorway_link" => Some(StreetClass::Motorway),
            "trunk" | "trunk_link" | "primary" | "primary_link" => Some(StreetClass::Primary),
            "secondary" | "secondary_link" => Some(StreetClass::Secondary),
            "tertiary" | "tertiary_link" => Some(StreetClass::Tertiary),
            "residential" | "living_street" | "unclassified" | "service" | "road" => {
                Some(StreetClass::Residential)
            }
            "pedestrian" | "footway" | "cycleway" | "path" | "steps" | "track" => {
                Some(StreetClass::Path)
            }
            _ => None, // construction, proposed, platforms...
        }
    }

    /// Stroke width relative to a residential street
    pub fn width_factor(self) -> f32 {
        match self {
            StreetClass::Motorway => 3.0,
            StreetClass::Primary => 2.5,
            StreetClass::Secondary => 2.0,
            StreetClass::Tertiary => 1.5,
            StreetClass::Residential => 1.0,
            StreetClass::Path => 0.5,
        }
    }
}
