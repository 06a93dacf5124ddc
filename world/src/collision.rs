//! Sub-stepped collision resolution against the tile map and nearby bodies.

use glam::Vec3;
use hordefall_core::{CellCoord, CollisionPartner, PhysicsTuning, TileMapView};

/// Half the edge length of a tile; every collider shares this extent.
const HALF_TILE: f32 = 0.5;

/// Moving sphere resolved by the [`Resolver`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Body {
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) radius: f32,
}

impl Body {
    pub(crate) const fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            radius,
        }
    }
}

/// Dynamic neighbour that pushes ground enemies away.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Contact {
    pub(crate) partner: CollisionPartner,
    pub(crate) position: Vec3,
    pub(crate) radius: f32,
}

#[derive(Clone, Copy, Debug)]
struct Collider {
    anchor: Vec3,
    normal: Vec3,
    partner: CollisionPartner,
    distance_sq: f32,
}

/// Resolves bodies against walls, ground, bounds and contacts.
///
/// The collider buffer is reused between calls.
#[derive(Debug, Default)]
pub(crate) struct Resolver {
    colliders: Vec<Collider>,
}

impl Resolver {
    /// Moves the body by its velocity over `dt` seconds and reports the last
    /// partner it touched in any sub-step.
    pub(crate) fn advance(
        &mut self,
        body: &mut Body,
        dt: f32,
        step_height: f32,
        map: TileMapView<'_>,
        contacts: &[Contact],
        physics: &PhysicsTuning,
    ) -> Option<CollisionPartner> {
        let travel = body.velocity * dt;
        let mut remaining = travel.length();
        if !remaining.is_finite() || remaining <= 0.0 {
            return None;
        }

        let direction = travel / remaining;
        let mut collided = None;
        while remaining > 0.0 {
            let step = remaining.min(physics.max_substep);
            body.position += direction * step;
            if let Some(partner) = self.resolve(body, step_height, map, contacts, physics) {
                collided = Some(partner);
            }
            remaining -= step;
        }
        collided
    }

    fn resolve(
        &mut self,
        body: &mut Body,
        step_height: f32,
        map: TileMapView<'_>,
        contacts: &[Contact],
        physics: &PhysicsTuning,
    ) -> Option<CollisionPartner> {
        let mut position = body.position;
        if position.z < physics.height_band.min || position.z > physics.height_band.max {
            return Some(CollisionPartner::World);
        }

        self.colliders.clear();
        self.gather_walls(position, step_height, map);
        self.push(
            Vec3::new(position.x, position.y, 0.0),
            Vec3::Z,
            CollisionPartner::World,
        );

        for contact in contacts {
            let offset = position.truncate() - contact.position.truncate();
            let distance_sq = offset.length_squared();
            let reach = contact.radius + body.radius + physics.contact_margin;
            if distance_sq > reach * reach || distance_sq < physics.min_separation_sq {
                continue;
            }
            let direction = offset / distance_sq.sqrt();
            self.push(
                contact.position + (direction * contact.radius).extend(1.0),
                direction.extend(0.0),
                contact.partner,
            );
        }

        for collider in &mut self.colliders {
            collider.distance_sq = position.distance_squared(collider.anchor);
        }
        // Colliders share one extent, so the nearest anchor is the nearest surface.
        self.colliders
            .sort_by(|a, b| a.distance_sq.total_cmp(&b.distance_sq));

        let reach = body.radius + HALF_TILE;
        let mut collided = None;
        for collider in &self.colliders {
            if position.z >= collider.anchor.z {
                continue;
            }
            let distance = (position - collider.anchor).dot(collider.normal);
            if distance > body.radius {
                continue;
            }

            if collider.normal.z != 0.0 {
                debug_assert_eq!(collider.normal, Vec3::Z);
                let offset = (position - collider.anchor).truncate().abs();
                if offset.x > reach || offset.y > reach {
                    continue;
                }
                position.z = collider.anchor.z;
                if body.velocity.z < 0.0 {
                    body.velocity.z = 0.0;
                }
            } else {
                let on_plane = position - collider.normal * distance;
                if on_plane
                    .truncate()
                    .distance_squared(collider.anchor.truncate())
                    > reach * reach
                {
                    continue;
                }
                position += collider.normal * (body.radius - distance + physics.push_epsilon);
            }
            collided = Some(collider.partner);
        }

        let extent = map.extent();
        if position.x < 0.0 {
            position.x = 0.0;
            collided = Some(CollisionPartner::World);
        }
        if position.y < 0.0 {
            position.y = 0.0;
            collided = Some(CollisionPartner::World);
        }
        if position.x > extent {
            position.x = extent;
            collided = Some(CollisionPartner::World);
        }
        if position.y > extent {
            position.y = extent;
            collided = Some(CollisionPartner::World);
        }

        body.position = position;
        collided
    }

    fn gather_walls(&mut self, position: Vec3, step_height: f32, map: TileMapView<'_>) {
        let last = map.size().saturating_sub(1) as f32;
        let first_column = (position.x - 1.0).floor().clamp(0.0, last) as u32;
        let last_column = (position.x + 1.0).floor().clamp(0.0, last) as u32;
        let first_row = (position.y - 1.0).floor().clamp(0.0, last) as u32;
        let last_row = (position.y + 1.0).floor().clamp(0.0, last) as u32;

        for row in first_row..=last_row {
            for column in first_column..=last_column {
                let cell = CellCoord::new(column, row);
                if !map.is_wall(cell) {
                    continue;
                }
                let height = map.height(cell).unwrap_or_default();
                let (x, y) = (column as f32, row as f32);

                if step_height != 0.0 {
                    self.push(
                        Vec3::new(x + HALF_TILE, y + HALF_TILE, height),
                        Vec3::Z,
                        CollisionPartner::World,
                    );
                }
                if position.z >= height - step_height {
                    continue;
                }
                if position.x > x + 1.0 {
                    self.push(Vec3::new(x + 1.0, y + HALF_TILE, height), Vec3::X, CollisionPartner::World);
                }
                if position.x < x {
                    self.push(Vec3::new(x, y + HALF_TILE, height), Vec3::NEG_X, CollisionPartner::World);
                }
                if position.y > y + 1.0 {
                    self.push(Vec3::new(x + HALF_TILE, y + 1.0, height), Vec3::Y, CollisionPartner::World);
                }
                if position.y < y {
                    self.push(Vec3::new(x + HALF_TILE, y, height), Vec3::NEG_Y, CollisionPartner::World);
                }
            }
        }
    }

    fn push(&mut self, anchor: Vec3, normal: Vec3, partner: CollisionPartner) {
        self.colliders.push(Collider {
            anchor,
            normal,
            partner,
            distance_sq: 0.0,
        });
    }
}
