/// The level-of-detail tier a job or template binding applies to. Per spec §9's
/// REDESIGN FLAGS, this is carried as typed data on `Job` rather than re-derived by
/// substring match every time it's needed, while the substring convention (`LOD2`/`LOD3`
/// appearing in a job's type label) is preserved for the existing external behaviour.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LodLevel {
    Lod2,
    Lod3,
}

impl LodLevel {
    /// Name of the source schema for this LOD (`lod2`/`lod3`).
    pub fn as_schema_name(&self) -> &'static str {
        match self {
            LodLevel::Lod2 => "lod2",
            LodLevel::Lod3 => "lod3",
        }
    }

    /// The integer level slot rendered into `{lod_level}` (2 or 3).
    pub fn as_level_int(&self) -> i32 {
        match self {
            LodLevel::Lod2 => 2,
            LodLevel::Lod3 => 3,
        }
    }

    pub fn label_prefix(&self) -> &'static str {
        match self {
            LodLevel::Lod2 => "LOD2",
            LodLevel::Lod3 => "LOD3",
        }
    }

    /// Infers LOD from a job type label by substring match, per spec §4.8 step 2.
    /// `None` for non-LOD jobs (setup, supplementary).
    pub fn from_label(label: &str) -> Option<Self> {
        if label.contains("LOD2") {
            Some(LodLevel::Lod2)
        } else if label.contains("LOD3") {
            Some(LodLevel::Lod3)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_lod_from_label() {
        assert_eq!(LodLevel::from_label("LOD2: 01_harvest.sql"), Some(LodLevel::Lod2));
        assert_eq!(LodLevel::from_label("LOD3: 01_harvest.sql"), Some(LodLevel::Lod3));
        assert_eq!(LodLevel::from_label("setup: 01_functions.sql"), None);
    }
}
