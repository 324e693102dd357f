//! LOD bone remapping
//!
//! At reduced LOD levels some bones stop being animated. Vertices weighted
//! to such a bone follow its nearest animated ancestor instead, so skin at
//! aggressive LODs still tracks overall body motion.

use crate::error::{BakeError, TopologyIssue};
use crate::hierarchy::Skeleton;

/// Nearest bone at or above `bone` that is animated at `lod`
///
/// Returns `None` when the walk passes the root without finding one. Roots
/// are always LOD-valid in an analyzed skeleton, so this only happens for
/// out-of-range LOD levels.
pub fn remap_bone_for_lod(skeleton: &Skeleton, lod: u8, bone: usize) -> Option<usize> {
    let mut current = Some(bone);
    while let Some(index) = current {
        if skeleton.supports_lod(index, lod) {
            return Some(index);
        }
        current = skeleton.bone(index).parent;
    }
    None
}

/// Precomputed substitute bone for every canonical bone at one LOD level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodRemap {
    lod: u8,
    table: Vec<usize>,
}

impl LodRemap {
    pub fn new(skeleton: &Skeleton, lod: u8) -> Result<Self, BakeError> {
        let table = (0..skeleton.len())
            .map(|bone| {
                remap_bone_for_lod(skeleton, lod, bone).ok_or_else(|| {
                    BakeError::from(TopologyIssue::NoLodAncestor {
                        bone: skeleton.bone(bone).name.clone(),
                        lod,
                    })
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { lod, table })
    }

    pub fn lod(&self) -> u8 {
        self.lod
    }

    /// Substitute for a canonical bone index
    pub fn map(&self, bone: usize) -> usize {
        self.table[bone]
    }

    /// Number of bones that are replaced by an ancestor
    pub fn culled_count(&self) -> usize {
        self.table.iter().enumerate().filter(|(i, m)| i != *m).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::analyze_hierarchy;
    use crate::model::BoneDesc;

    fn skeleton() -> Skeleton {
        let bones = vec![
            BoneDesc::new("root", None),
            BoneDesc::new("child", Some("root")).with_lod_support(1),
            BoneDesc::new("grandchild", Some("child")).with_lod_support(0),
            BoneDesc::new("tip", Some("grandchild")),
        ];
        analyze_hierarchy(&bones, 3).unwrap()
    }

    #[test]
    fn test_bone_supported_at_lod_maps_to_itself() {
        let skeleton = skeleton();
        for bone in 0..skeleton.len() {
            assert_eq!(remap_bone_for_lod(&skeleton, 0, bone), Some(bone));
        }
    }

    #[test]
    fn test_culled_bone_maps_to_nearest_ancestor() {
        let skeleton = skeleton();
        let grandchild = skeleton.index_of("grandchild").unwrap();
        let child = skeleton.index_of("child").unwrap();
        assert_eq!(remap_bone_for_lod(&skeleton, 1, grandchild), Some(child));
        assert_eq!(remap_bone_for_lod(&skeleton, 2, grandchild), Some(0));

        // "tip" is supported at every LOD even though its parent is not
        let tip = skeleton.index_of("tip").unwrap();
        assert_eq!(remap_bone_for_lod(&skeleton, 2, tip), Some(tip));
    }

    #[test]
    fn test_out_of_range_lod_has_no_substitute() {
        let skeleton = skeleton();
        assert_eq!(remap_bone_for_lod(&skeleton, 5, 2), None);
        assert!(matches!(
            LodRemap::new(&skeleton, 5),
            Err(BakeError::UnsupportedTopology(TopologyIssue::NoLodAncestor { .. }))
        ));
    }

    #[test]
    fn test_lod_remap_table() {
        let skeleton = skeleton();
        let remap = LodRemap::new(&skeleton, 2).unwrap();
        assert_eq!(remap.lod(), 2);
        assert_eq!(remap.map(1), 0);
        assert_eq!(remap.map(2), 0);
        assert_eq!(remap.culled_count(), 2);
    }
}
