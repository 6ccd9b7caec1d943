//! Design-level documentation of the algorithms encoded in the main feature-extraction
//! `.sql` scripts (spec §4.9). The core delegates all spatial computation to the DBMS;
//! this module carries no executable geometry code, only the state-machine contract the
//! scripts must jointly uphold, and thin markers used by tests that assert script
//! filenames exist in the order this state machine expects.

/// Per-building state machine driven by one script per transition, in loader order
/// (spec §4.9, "State machine"). Each variant names the downstream table a building
/// is expected to have a row in once that stage's script has run for it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildingStage {
    /// No extraction script has touched this building yet.
    Fresh,
    /// (a) Child feature harvesting: dirty (building, surface) candidates recorded.
    RawSurfacesHarvested,
    /// (b) Geometry dump: each raw surface decomposed into planar polygons.
    PolygonsDumped,
    /// (c) Ground resolution: each ground claimed by at most one building.
    GroundResolved,
    /// (d) Roof resolution: each roof assigned its highest-overlap building.
    RoofResolved,
    /// (e) Wall resolution ("sandwich"): walls assigned by tiered nearest-building rank.
    WallResolved,
    /// (f) Per-polygon surface attributes computed (area, tilt, azimuth, height).
    SurfaceAttributesComputed,
    /// (g)/(h) Per-building aggregation: footprint, complexity classes, volumes, storeys.
    BuildingAggregated,
    /// (i) Attached-neighbour detection.
    NeighboursDetected,
    /// (j) Typology labelling: nearest TABULA variant assigned.
    Labelled,
}

impl BuildingStage {
    /// The ordered sequence every building's extraction passes through. Each script in
    /// `sql/scripts/main` is expected to move buildings from one stage to the next and
    /// to restrict itself to buildings not already past its stage (or to upsert on
    /// conflict), so a rerun against the same building-ID set is a no-op apart from
    /// recomputed replaced rows (spec §4.9, "Idempotence").
    pub const ORDER: [BuildingStage; 10] = [
        BuildingStage::Fresh,
        BuildingStage::RawSurfacesHarvested,
        BuildingStage::PolygonsDumped,
        BuildingStage::GroundResolved,
        BuildingStage::RoofResolved,
        BuildingStage::WallResolved,
        BuildingStage::SurfaceAttributesComputed,
        BuildingStage::BuildingAggregated,
        BuildingStage::NeighboursDetected,
        BuildingStage::Labelled,
    ];
}

/// Method tags recorded alongside a resolved ground surface (spec §4.9(c)).
pub mod ground_resolution_method {
    /// The building had exactly one ground candidate; it was assigned directly.
    pub const ONLY_GROUND_SURFACE: &str = "only_ground_surface";
    /// No candidate ground had positive shared boundary length with any wall; the
    /// highest-ranked remaining ground was assigned anyway as a last resort.
    pub const UNRESOLVED_NO_POSITIVE_SHARED_LEN: &str = "unresolved_no_positive_shared_len";
}

/// Tiering used by wall resolution to rank candidate buildings (spec §4.9(e)).
/// Lower is better; a wall is only assigned if the best candidate's 2D distance to
/// that building's ground boundary is at most [`WALL_ASSIGNMENT_MAX_DISTANCE_M`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum WallCandidateTier {
    /// Wall intersects both the candidate's resolved ground and a resolved roof.
    GroundAndRoof = 1,
    /// Wall intersects only the candidate's resolved ground.
    GroundOnly = 2,
    /// Wall intersects only a resolved roof.
    RoofOnly = 3,
}

/// Maximum 2D distance, in metres, between a wall and a candidate building's ground
/// boundary for that candidate to be assignable at all (spec §4.9(e)).
pub const WALL_ASSIGNMENT_MAX_DISTANCE_M: f64 = 2.0;

/// Two candidates are considered a party-wall pair when both are top-tier
/// ([`WallCandidateTier::GroundAndRoof`]) and their distances differ by at most this
/// many metres (spec §4.9(e)).
pub const PARTY_WALL_DISTANCE_TOLERANCE_M: f64 = 0.30;

/// Collinearity threshold on cross-product magnitude below which three vertices are
/// treated as collinear when searching for a non-degenerate normal (spec §4.9(f)).
pub const NORMAL_COLLINEARITY_EPSILON: f64 = 1e-10;

/// Number of vertex triples tried before giving up on finding a non-collinear normal
/// (spec §4.9(f)).
pub const NORMAL_MAX_VERTEX_COMBINATIONS: usize = 10;

/// Sentinel azimuth recorded for near-vertical-normal surfaces, for which azimuth is
/// not meaningful (spec §4.9(f)).
pub const AZIMUTH_SENTINEL_VERTICAL: f64 = -1.0;

/// Maximum distance, in metres, a vertex may sit off the polygon's fitted plane for
/// the polygon to still be recorded as planar (spec §4.9(f): "Record planarity").
pub const PLANARITY_TOLERANCE_M: f64 = 0.01;

/// Percentile used to derive min/max building height from wall/roof heights, with a
/// fallback to the plain maximum when the percentile is undefined for small samples
/// (spec §4.9(g)).
pub const HEIGHT_PERCENTILE: f64 = 95.0;

/// Footprint boundary-vertex-count thresholds bucketing a building into complexity
/// class 0, 1, or 2 (spec §4.9(g)): `<=4` -> 0, `5..=10` -> 1, `>10` -> 2.
pub fn footprint_complexity_class(boundary_vertex_count: usize) -> u8 {
    match boundary_vertex_count {
        0..=4 => 0,
        5..=10 => 1,
        _ => 2,
    }
}

/// Resolved-roof-count thresholds bucketing a building into roof complexity class
/// 0, 1, or 2 (spec §4.9(g)): `1` -> 0, `2..=4` -> 1, `>4` -> 2.
pub fn roof_complexity_class(resolved_roof_count: usize) -> u8 {
    match resolved_roof_count {
        0 | 1 => 0,
        2..=4 => 1,
        _ => 2,
    }
}

/// Distance, in metres, within which two buildings' centroids must lie before they're
/// even considered as a candidate neighbour pair (spec §4.9(i)).
pub const NEIGHBOUR_CENTROID_MAX_DISTANCE_M: f64 = 50.0;

/// Neighbour-count thresholds bucketing a building's sociability class (spec §4.9(i)):
/// `0` -> 0 (alone), `1` -> 1, `>=2` -> 2.
pub fn neighbour_class(distinct_neighbour_count: usize) -> u8 {
    match distinct_neighbour_count {
        0 => 0,
        1 => 1,
        _ => 2,
    }
}

/// The nine normalised features used for TABULA variant-distance ranking (spec
/// §4.9(j)), in the fixed order the min/max scaling and Euclidean distance are
/// computed over.
pub const TYPOLOGY_FEATURES: [&str; 9] = [
    "volume",
    "footprint_area",
    "storeys",
    "neighbour_class",
    "footprint_complexity_class",
    "roof_complexity_class",
    "roof_area_total",
    "wall_area_total",
    "floor_area_total",
];
