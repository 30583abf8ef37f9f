/*!
Surface materials and per-pair contact rules.

Every collider carries a [`SurfaceMaterial`] tag in its `user_data`. When two colliders touch,
[`SurfaceContactHooks`] looks the unordered pair up in a [`ContactMaterialTable`] and rewrites
the solver contacts' friction/restitution. Pairs without a rule get the table's default.

Notes
- The player/ground rule has zero friction: the player is velocity-driven every frame, so any
  ground friction would only fight the commanded horizontal velocity.
- Model colliders have no explicit rule and use the default.
*/

use std::collections::HashMap;

use rapier3d::prelude::*;

use crate::constants::{DEFAULT_FRICTION, DEFAULT_RESTITUTION};

/// Named surface material stored on every collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SurfaceMaterial {
    Player = 1,
    Ground = 2,
    Wall = 3,
    Path = 4,
    Post = 5,
    Model = 6,
}

impl SurfaceMaterial {
    pub const ALL: [SurfaceMaterial; 6] = [
        Self::Player,
        Self::Ground,
        Self::Wall,
        Self::Path,
        Self::Post,
        Self::Model,
    ];

    #[inline]
    pub fn to_user_data(self) -> u128 {
        self as u8 as u128
    }

    #[inline]
    pub fn from_user_data(data: u128) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.to_user_data() == data)
    }
}

/// Friction/restitution applied to a contact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
        }
    }
}

/// Contact rules keyed by unordered material pairs.
#[derive(Clone, Debug, Default)]
pub struct ContactMaterialTable {
    pub default: ContactMaterial,
    rules: HashMap<(SurfaceMaterial, SurfaceMaterial), ContactMaterial>,
}

impl ContactMaterialTable {
    /// Rules between the player and every piece of base geometry.
    pub fn viewer_defaults() -> Self {
        let mut table = Self::default();
        table.insert(
            SurfaceMaterial::Player,
            SurfaceMaterial::Ground,
            ContactMaterial {
                friction: 0.0,
                restitution: 0.1,
            },
        );
        table.insert(
            SurfaceMaterial::Player,
            SurfaceMaterial::Wall,
            ContactMaterial {
                friction: 0.0,
                restitution: 0.2,
            },
        );
        table.insert(
            SurfaceMaterial::Player,
            SurfaceMaterial::Path,
            ContactMaterial {
                friction: 0.0,
                restitution: 0.1,
            },
        );
        table.insert(
            SurfaceMaterial::Player,
            SurfaceMaterial::Post,
            ContactMaterial {
                friction: 0.0,
                restitution: 0.3,
            },
        );
        table
    }

    #[inline]
    fn key(a: SurfaceMaterial, b: SurfaceMaterial) -> (SurfaceMaterial, SurfaceMaterial) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn insert(&mut self, a: SurfaceMaterial, b: SurfaceMaterial, material: ContactMaterial) {
        self.rules.insert(Self::key(a, b), material);
    }

    /// Explicit rule for the pair, if any.
    pub fn rule(&self, a: SurfaceMaterial, b: SurfaceMaterial) -> Option<ContactMaterial> {
        self.rules.get(&Self::key(a, b)).copied()
    }

    /// Material applied to a contact between `a` and `b`.
    #[inline]
    pub fn resolve(&self, a: SurfaceMaterial, b: SurfaceMaterial) -> ContactMaterial {
        self.rule(a, b).unwrap_or(self.default)
    }
}

/// Physics hooks applying a [`ContactMaterialTable`] to solver contacts.
pub struct SurfaceContactHooks {
    pub table: ContactMaterialTable,
}

impl SurfaceContactHooks {
    fn material_of(colliders: &ColliderSet, handle: ColliderHandle) -> Option<SurfaceMaterial> {
        colliders
            .get(handle)
            .and_then(|c| SurfaceMaterial::from_user_data(c.user_data))
    }
}

impl PhysicsHooks for SurfaceContactHooks {
    fn modify_solver_contacts(&self, context: &mut ContactModificationContext) {
        let material = match (
            Self::material_of(context.colliders, context.collider1),
            Self::material_of(context.colliders, context.collider2),
        ) {
            (Some(a), Some(b)) => self.table.resolve(a, b),
            _ => self.table.default,
        };

        for contact in context.solver_contacts.iter_mut() {
            contact.friction = material.friction;
            contact.restitution = material.restitution;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_data_round_trips_every_material() {
        for m in SurfaceMaterial::ALL {
            assert_eq!(SurfaceMaterial::from_user_data(m.to_user_data()), Some(m));
        }
        assert_eq!(SurfaceMaterial::from_user_data(0), None);
    }

    #[test]
    fn rules_are_unordered() {
        let table = ContactMaterialTable::viewer_defaults();
        assert_eq!(
            table.rule(SurfaceMaterial::Ground, SurfaceMaterial::Player),
            table.rule(SurfaceMaterial::Player, SurfaceMaterial::Ground),
        );
        assert_eq!(
            table
                .resolve(SurfaceMaterial::Ground, SurfaceMaterial::Player)
                .friction,
            0.0
        );
    }

    #[test]
    fn player_has_rules_for_all_base_geometry() {
        let table = ContactMaterialTable::viewer_defaults();
        for other in [
            SurfaceMaterial::Ground,
            SurfaceMaterial::Wall,
            SurfaceMaterial::Path,
            SurfaceMaterial::Post,
        ] {
            assert!(table.rule(SurfaceMaterial::Player, other).is_some());
        }
    }

    #[test]
    fn model_contacts_use_default() {
        let table = ContactMaterialTable::viewer_defaults();
        assert_eq!(
            table.resolve(SurfaceMaterial::Player, SurfaceMaterial::Model),
            ContactMaterial::default()
        );
    }
}
