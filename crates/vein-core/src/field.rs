//! The node field: region membership, material storage, weighted material
//! sampling, and the connected-vein query used by cascading effects.
//!
//! Regions are horizontal bands by depth inside a square extent; nodes are
//! stored sparsely. The protected anchor material can never be replaced
//! here, which makes the immunity invariant hold no matter which effect is
//! doing the destroying.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use contracts::{Material, Position, RegionId};

use crate::roll::RollStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    InvalidRegion(Position),
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidRegion(position) => {
                write!(f, "position {position} is outside every region")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeField {
    nodes: BTreeMap<Position, Material>,
    /// Half-extent of the field on the x and z axes.
    extent: i32,
    /// Weighted material composition per region.
    composition: BTreeMap<RegionId, Vec<(Material, u32)>>,
}

impl NodeField {
    pub fn new(extent: i32) -> Self {
        let mut composition = BTreeMap::new();
        composition.insert(
            RegionId::Surface,
            vec![(Material::Stone, 80), (Material::Coal, 20)],
        );
        composition.insert(
            RegionId::UpperSeams,
            vec![
                (Material::Stone, 60),
                (Material::Coal, 25),
                (Material::Iron, 15),
            ],
        );
        composition.insert(
            RegionId::DeepSeams,
            vec![
                (Material::Stone, 50),
                (Material::Coal, 15),
                (Material::Iron, 20),
                (Material::Gold, 10),
                (Material::Diamond, 5),
            ],
        );
        composition.insert(
            RegionId::MoltenRoots,
            vec![
                (Material::Stone, 40),
                (Material::Iron, 20),
                (Material::Gold, 25),
                (Material::Diamond, 15),
            ],
        );
        Self {
            nodes: BTreeMap::new(),
            extent,
            composition,
        }
    }

    // --- Region membership ---

    pub fn region_of(&self, position: Position) -> Option<RegionId> {
        if position.x.abs() > self.extent || position.z.abs() > self.extent {
            return None;
        }
        Some(match position.y {
            y if y >= 0 => RegionId::Surface,
            y if y >= -10 => RegionId::UpperSeams,
            y if y >= -30 => RegionId::DeepSeams,
            _ => RegionId::MoltenRoots,
        })
    }

    // --- Node storage ---

    pub fn set_node(&mut self, position: Position, material: Material) {
        if material == Material::Air {
            self.nodes.remove(&position);
        } else {
            self.nodes.insert(position, material);
        }
    }

    pub fn material_at(&self, position: Position) -> Material {
        self.nodes.get(&position).copied().unwrap_or(Material::Air)
    }

    /// Replace a node's material. Refuses to touch the protected anchor
    /// material; returns whether the replacement happened.
    pub fn replace_material(&mut self, position: Position, material: Material) -> bool {
        if self.material_at(position).is_protected() {
            return false;
        }
        self.set_node(position, material);
        true
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Weighted sampling ---

    /// Draw a material weighted by the region's composition.
    pub fn random_material_for_region(
        &self,
        region: RegionId,
        rolls: &mut RollStream,
    ) -> Material {
        let Some(weights) = self.composition.get(&region) else {
            return Material::Stone;
        };
        let total: u32 = weights.iter().map(|(_, weight)| weight).sum();
        if total == 0 {
            return Material::Stone;
        }
        let mut remaining = rolls.roll_range(0, total - 1);
        for (material, weight) in weights {
            if remaining < *weight {
                return *material;
            }
            remaining -= weight;
        }
        Material::Stone
    }

    // --- Connected-vein query ---

    /// Breadth-first set of positions connected to `start` holding exactly
    /// `material`, capped in size. The start position itself is excluded.
    pub fn connected_same_material(
        &self,
        start: Position,
        material: Material,
        cap: u32,
    ) -> Vec<Position> {
        let mut found = Vec::new();
        if cap == 0 || material == Material::Air {
            return found;
        }
        let mut visited = BTreeSet::new();
        visited.insert(start);
        let mut frontier = VecDeque::new();
        frontier.push_back(start);

        while let Some(current) = frontier.pop_front() {
            for neighbor in current.neighbors() {
                if !visited.insert(neighbor) {
                    continue;
                }
                if self.material_at(neighbor) != material {
                    continue;
                }
                found.push(neighbor);
                if found.len() as u32 >= cap {
                    return found;
                }
                frontier.push_back(neighbor);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_with(nodes: &[(Position, Material)]) -> NodeField {
        let mut field = NodeField::new(16);
        for (position, material) in nodes {
            field.set_node(*position, *material);
        }
        field
    }

    #[test]
    fn regions_band_by_depth_inside_the_extent() {
        let field = NodeField::new(4);
        assert_eq!(
            field.region_of(Position::new(0, 5, 0)),
            Some(RegionId::Surface)
        );
        assert_eq!(
            field.region_of(Position::new(1, -5, 1)),
            Some(RegionId::UpperSeams)
        );
        assert_eq!(
            field.region_of(Position::new(-2, -20, 3)),
            Some(RegionId::DeepSeams)
        );
        assert_eq!(
            field.region_of(Position::new(0, -64, 0)),
            Some(RegionId::MoltenRoots)
        );
        assert_eq!(field.region_of(Position::new(5, 0, 0)), None);
    }

    #[test]
    fn protected_material_cannot_be_replaced() {
        let anchor = Position::new(0, -40, 0);
        let mut field = field_with(&[(anchor, Material::Warden)]);
        assert!(!field.replace_material(anchor, Material::Air));
        assert_eq!(field.material_at(anchor), Material::Warden);
    }

    #[test]
    fn replacing_with_air_removes_the_node() {
        let spot = Position::new(1, -1, 1);
        let mut field = field_with(&[(spot, Material::Coal)]);
        assert!(field.replace_material(spot, Material::Air));
        assert_eq!(field.material_at(spot), Material::Air);
        assert_eq!(field.node_count(), 0);
    }

    #[test]
    fn weighted_sampling_respects_the_composition() {
        let field = NodeField::new(8);
        let mut rolls = RollStream::new(42);
        let mut diamonds = 0_u32;
        for _ in 0..2000 {
            let material = field.random_material_for_region(RegionId::Surface, &mut rolls);
            assert!(matches!(material, Material::Stone | Material::Coal));
            if material == Material::Diamond {
                diamonds += 1;
            }
        }
        assert_eq!(diamonds, 0);
    }

    #[test]
    fn connected_vein_is_capped_and_excludes_the_start() {
        let origin = Position::new(0, -5, 0);
        let mut nodes = vec![(origin, Material::Iron)];
        for step in 1..=10 {
            nodes.push((Position::new(step, -5, 0), Material::Iron));
        }
        let field = field_with(&nodes);

        let vein = field.connected_same_material(origin, Material::Iron, 4);
        assert_eq!(vein.len(), 4);
        assert!(!vein.contains(&origin));

        let vein = field.connected_same_material(origin, Material::Iron, 64);
        assert_eq!(vein.len(), 10);
    }

    #[test]
    fn connected_vein_stops_at_material_boundaries() {
        let origin = Position::new(0, -5, 0);
        let field = field_with(&[
            (origin, Material::Gold),
            (Position::new(1, -5, 0), Material::Gold),
            (Position::new(2, -5, 0), Material::Stone),
            (Position::new(3, -5, 0), Material::Gold),
        ]);
        let vein = field.connected_same_material(origin, Material::Gold, 64);
        assert_eq!(vein, vec![Position::new(1, -5, 0)]);
    }
}
