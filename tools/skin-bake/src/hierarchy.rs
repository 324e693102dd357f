//! Skeleton analysis
//!
//! Validates the bone set and produces the canonical bone order every later
//! stage relies on: bones sorted by depth (roots first), ties keeping input
//! order, so each bone's index is greater than its parent's.

use bake_common::{BakedBone, BoneTransform};
use hashbrown::HashMap;

use crate::error::{BakeError, TopologyIssue};
use crate::model::BoneDesc;

/// Maximum number of bones in a skeleton
pub const MAX_BONES: usize = 256;

/// Maximum number of LOD levels (one bit each in the baked LOD mask)
pub const MAX_LOD_LEVELS: u8 = 8;

/// A bone in canonical order
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    /// Canonical parent index
    pub parent: Option<usize>,
    pub bind: BoneTransform,
    /// Highest LOD level at which the bone is animated independently
    pub lod_support: u8,
    /// Distance from the root (1 for roots)
    pub depth: u32,
    /// Position in the caller's bone list
    pub source_index: usize,
}

/// Canonically ordered, immutable skeleton
#[derive(Debug, Clone)]
pub struct Skeleton {
    bones: Vec<Bone>,
    lookup: HashMap<String, usize>,
    lod_count: u8,
}

impl Skeleton {
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> &Bone {
        &self.bones[index]
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn lod_count(&self) -> u8 {
        self.lod_count
    }

    /// Canonical index of a bone by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup.get(name).copied()
    }

    /// Parent index per canonical bone
    pub fn parent_indices(&self) -> Vec<Option<usize>> {
        self.bones.iter().map(|b| b.parent).collect()
    }

    /// Whether the bone is animated independently at `lod`
    pub fn supports_lod(&self, index: usize, lod: u8) -> bool {
        self.bones[index].lod_support >= lod
    }

    /// Bit L set for every LOD level L the bone supports
    pub fn lod_mask(&self, index: usize) -> u8 {
        (0..self.lod_count)
            .filter(|&lod| self.supports_lod(index, lod))
            .fold(0u8, |mask, lod| mask | (1 << lod))
    }

    /// Bone list in the baked asset representation
    pub fn to_baked(&self) -> Vec<BakedBone> {
        self.bones
            .iter()
            .enumerate()
            .map(|(i, bone)| BakedBone {
                name: bone.name.clone(),
                parent: bone.parent.map(|p| p as u16),
                lod_mask: self.lod_mask(i),
            })
            .collect()
    }
}

/// Validate a bone set and put it in canonical order
///
/// # Errors
///
/// - [`BakeError::UnsupportedTopology`] when there are no bones, more than
///   [`MAX_BONES`], a parent outside the set, or a parent cycle
/// - [`BakeError::DuplicateName`] when two bones share a name
/// - [`BakeError::InvalidSettings`] when `lod_count` is not in 1..=8
pub fn analyze_hierarchy(bones: &[BoneDesc], lod_count: u8) -> Result<Skeleton, BakeError> {
    if lod_count == 0 || lod_count > MAX_LOD_LEVELS {
        return Err(BakeError::InvalidSettings(format!(
            "lod_count {} must be between 1 and {}",
            lod_count, MAX_LOD_LEVELS
        )));
    }
    if bones.is_empty() {
        return Err(TopologyIssue::Empty.into());
    }
    if bones.len() > MAX_BONES {
        return Err(TopologyIssue::TooManyBones {
            count: bones.len(),
            max: MAX_BONES,
        }
        .into());
    }

    let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(bones.len());
    for (i, bone) in bones.iter().enumerate() {
        if by_name.insert(bone.name.as_str(), i).is_some() {
            return Err(BakeError::DuplicateName {
                kind: "bone",
                name: bone.name.clone(),
            });
        }
    }

    // Parent links in input order
    let parents = bones
        .iter()
        .map(|bone| match &bone.parent {
            None => Ok(None),
            Some(parent) => by_name.get(parent.as_str()).map(|&p| Some(p)).ok_or_else(|| {
                TopologyIssue::MissingParent {
                    bone: bone.name.clone(),
                    parent: parent.clone(),
                }
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let depths = compute_depths(bones, &parents)?;

    // Stable sort keeps input order among bones of equal depth
    let mut order: Vec<usize> = (0..bones.len()).collect();
    order.sort_by_key(|&i| depths[i]);

    let mut canonical = vec![0usize; bones.len()];
    for (new_index, &old_index) in order.iter().enumerate() {
        canonical[old_index] = new_index;
    }

    let max_lod = lod_count - 1;
    let ordered: Vec<Bone> = order
        .iter()
        .map(|&i| {
            let desc = &bones[i];
            let parent = parents[i].map(|p| canonical[p]);
            // Roots are LOD-valid by convention
            let lod_support = match (parent, desc.lod_support) {
                (None, _) | (_, None) => max_lod,
                (Some(_), Some(lod)) => lod.min(max_lod),
            };
            Bone {
                name: desc.name.clone(),
                parent,
                bind: desc.bind,
                lod_support,
                depth: depths[i],
                source_index: i,
            }
        })
        .collect();

    let lookup = ordered
        .iter()
        .enumerate()
        .map(|(i, b)| (b.name.clone(), i))
        .collect();

    tracing::debug!(
        "Canonical bone order: {} bones, max depth {}",
        ordered.len(),
        depths.iter().max().copied().unwrap_or(0)
    );

    Ok(Skeleton {
        bones: ordered,
        lookup,
        lod_count,
    })
}

/// Depth of every bone (1 for roots), detecting parent cycles
fn compute_depths(bones: &[BoneDesc], parents: &[Option<usize>]) -> Result<Vec<u32>, BakeError> {
    let mut depths: Vec<Option<u32>> = vec![None; bones.len()];

    for start in 0..bones.len() {
        // Walk up until a root or an already known depth
        let mut chain = Vec::new();
        let mut current = Some(start);
        let mut base = 0;
        while let Some(i) = current {
            if let Some(d) = depths[i] {
                base = d;
                break;
            }
            if chain.len() > bones.len() {
                return Err(TopologyIssue::ParentCycle {
                    bone: bones[start].name.clone(),
                }
                .into());
            }
            chain.push(i);
            current = parents[i];
        }

        for (offset, &i) in chain.iter().rev().enumerate() {
            depths[i] = Some(base + offset as u32 + 1);
        }
    }

    Ok(depths.into_iter().map(|d| d.unwrap_or(1)).collect())
}
