//! Line-of-sight сервис — контракт host-геометрии
//!
//! Host ставит свою реализацию поверх своего raycast (physics engine,
//! voxel grid, что угодно). Для headless прогонов и тестов — `BlockWorld`
//! с осевыми блокерами и slab raycast.

use bevy::prelude::*;

/// Контракт host-геометрии: есть ли свободная прямая от `from` до `to`.
///
/// Семантика луча:
/// - луч ограничен `max_range`: блокер дальше max_range не учитывается
/// - блокер режет луч только если лежит ДО цели — препятствие за целью
///   (или сама цель) видимость не ломает
pub trait SightProbe: Send + Sync {
    fn line_of_sight(&self, from: Vec3, to: Vec3, max_range: f32) -> bool;
}

/// Resource-обёртка для probe (host заменяет через insert_resource)
#[derive(Resource)]
pub struct SightService(pub Box<dyn SightProbe>);

impl Default for SightService {
    fn default() -> Self {
        Self(Box::new(BlockWorld::default()))
    }
}

impl SightService {
    pub fn line_of_sight(&self, from: Vec3, to: Vec3, max_range: f32) -> bool {
        self.0.line_of_sight(from, to, max_range)
    }
}

/// Осевой блокер (стена, ящик)
#[derive(Debug, Clone, Copy)]
pub struct SightBlocker {
    pub min: Vec3,
    pub max: Vec3,
}

impl SightBlocker {
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Дефолтный probe: статические AABB блокеры
#[derive(Debug, Clone, Default)]
pub struct BlockWorld {
    pub blockers: Vec<SightBlocker>,
}

impl BlockWorld {
    pub fn new(blockers: Vec<SightBlocker>) -> Self {
        Self { blockers }
    }
}

impl SightProbe for BlockWorld {
    fn line_of_sight(&self, from: Vec3, to: Vec3, max_range: f32) -> bool {
        let to_target = to - from;
        let distance = to_target.length();
        if distance <= f32::EPSILON {
            return true;
        }
        let direction = to_target / distance;

        // Блокер мешает только до цели и в пределах дальности луча
        let cutoff = distance.min(max_range);
        for blocker in &self.blockers {
            if let Some(t) = ray_aabb_intersection(from, direction, blocker) {
                if t < cutoff {
                    return false;
                }
            }
        }
        true
    }
}

/// Slab-метод. `direction` нормализован; возвращает ближайшее t >= 0.
///
/// Осепараллельные лучи корректны через ±inf в recip().
fn ray_aabb_intersection(origin: Vec3, direction: Vec3, aabb: &SightBlocker) -> Option<f32> {
    let inv = direction.recip();
    let t1 = (aabb.min - origin) * inv;
    let t2 = (aabb.max - origin) * inv;
    let t_enter = t1.min(t2).max_element();
    let t_exit = t1.max(t2).min_element();

    if t_exit < t_enter.max(0.0) {
        return None;
    }
    Some(t_enter.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall_at_x(x: f32) -> SightBlocker {
        SightBlocker::from_center_size(Vec3::new(x, 0.0, 0.0), Vec3::new(0.5, 4.0, 4.0))
    }

    #[test]
    fn test_open_world_sees_everything() {
        let world = BlockWorld::default();
        assert!(world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 20.0));
    }

    #[test]
    fn test_wall_blocks_sight() {
        let world = BlockWorld::new(vec![wall_at_x(5.0)]);
        assert!(!world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 20.0));
    }

    #[test]
    fn test_wall_behind_target_does_not_block() {
        let world = BlockWorld::new(vec![wall_at_x(15.0)]);
        assert!(world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 20.0));
    }

    #[test]
    fn test_wall_beyond_range_does_not_block() {
        // Блокер на 5м, но луч ограничен 3м — за пределами дальности
        let world = BlockWorld::new(vec![wall_at_x(5.0)]);
        assert!(world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 3.0));
    }

    #[test]
    fn test_sideways_wall_does_not_block() {
        let world = BlockWorld::new(vec![SightBlocker::from_center_size(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::splat(1.0),
        )]);
        assert!(world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 20.0));
    }

    #[test]
    fn test_degenerate_zero_length_ray() {
        let world = BlockWorld::new(vec![wall_at_x(5.0)]);
        assert!(world.line_of_sight(Vec3::ZERO, Vec3::ZERO, 20.0));
    }

    #[test]
    fn test_ray_from_inside_blocker() {
        let world = BlockWorld::new(vec![SightBlocker::from_center_size(
            Vec3::ZERO,
            Vec3::splat(2.0),
        )]);
        // Наблюдатель внутри блокера: t_enter = 0 < cutoff — перекрыто
        assert!(!world.line_of_sight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 20.0));
    }
}
