//! Avatar motion: acceleration, friction, clamping and screen wrap

use super::player::Player;

/// World size and movement tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaRules {
    /// World width
    pub width: f32,
    /// World height
    pub height: f32,
    /// Distance past an edge before a player teleports to the opposite side
    pub wrap_margin: f32,
    /// Per-axis velocity limit (units per tick)
    pub max_velocity: f32,
    /// Velocity gained per second while a direction is held
    pub acceleration: f32,
    /// Per-tick velocity multiplier on an idle axis
    pub friction: f32,
    /// Player collider radius
    pub collider_radius: f32,
    /// Seconds spent Dead before respawning
    pub death_timeout: f32,
}

impl Default for ArenaRules {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            wrap_margin: 20.0,
            max_velocity: 20.0,
            acceleration: 60.0,
            friction: 0.8,
            collider_radius: 40.0,
            death_timeout: 4.0,
        }
    }
}

/// Physics system for updating player positions and velocities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance one player's motion by `dt` seconds.
    /// Players that never sent input are left untouched.
    pub fn integrate(player: &mut Player, dt: f32, rules: &ArenaRules) {
        let Some(controls) = player.controls else {
            return;
        };

        let step = rules.acceleration * dt;

        if controls.left {
            player.v_x -= step;
        }
        if controls.right {
            player.v_x += step;
        }
        if controls.up {
            player.v_y -= step;
        }
        if controls.down {
            player.v_y += step;
        }

        // Friction only on axes with no held direction
        if !controls.left && !controls.right {
            player.v_x *= rules.friction;
        }
        if !controls.up && !controls.down {
            player.v_y *= rules.friction;
        }

        player.v_x = player.v_x.clamp(-rules.max_velocity, rules.max_velocity);
        player.v_y = player.v_y.clamp(-rules.max_velocity, rules.max_velocity);

        player.angle = player.v_y.atan2(player.v_x).to_degrees();

        player.x += player.v_x;
        player.y += player.v_y;

        player.x = Self::wrap(player.x, rules.width, rules.wrap_margin);
        player.y = Self::wrap(player.y, rules.height, rules.wrap_margin);
    }

    /// Hard teleport across one axis once a coordinate leaves `[-margin, size + margin]`
    pub fn wrap(value: f32, size: f32, margin: f32) -> f32 {
        if value > size + margin {
            -margin
        } else if value < -margin {
            size + margin
        } else {
            value
        }
    }

    /// Squared distance between two player centers
    pub fn distance_sq(a: &Player, b: &Player) -> f32 {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::player::RpsState;
    use crate::ws::protocol::Controls;

    const DT: f32 = 1.0 / 30.0;

    fn player_with(controls: Controls) -> Player {
        let mut p = Player::new(400.0, 250.0, RpsState::Rock);
        p.controls = Some(controls);
        p
    }

    #[test]
    fn test_unset_controls_is_noop() {
        let rules = ArenaRules::default();
        let mut p = Player::new(100.0, 100.0, RpsState::Paper);
        p.v_x = 5.0;
        p.v_y = -3.0;
        let before = p.clone();

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert_eq!(p, before);
    }

    #[test]
    fn test_acceleration_right() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            right: true,
            ..Default::default()
        });

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert!((p.v_x - 2.0).abs() < 1e-4);
        assert_eq!(p.v_y, 0.0);
        assert!((p.x - 402.0).abs() < 1e-3);
        assert!(p.angle.abs() < 1e-4);
    }

    #[test]
    fn test_opposing_flags_cancel() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            left: true,
            right: true,
            ..Default::default()
        });
        p.v_x = 10.0;

        PhysicsSystem::integrate(&mut p, DT, &rules);
        // Both flags held: no friction, accelerations cancel
        assert!((p.v_x - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_friction_on_idle_axis() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            down: true,
            ..Default::default()
        });
        p.v_x = 10.0;

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert!((p.v_x - 8.0).abs() < 1e-4);
        assert!((p.v_y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_velocity_clamped() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            left: true,
            up: true,
            ..Default::default()
        });

        // A very late tick must still respect the limit
        PhysicsSystem::integrate(&mut p, 5.0, &rules);
        assert_eq!(p.v_x, -rules.max_velocity);
        assert_eq!(p.v_y, -rules.max_velocity);

        for _ in 0..100 {
            PhysicsSystem::integrate(&mut p, DT, &rules);
            assert!(p.v_x.abs() <= rules.max_velocity);
            assert!(p.v_y.abs() <= rules.max_velocity);
        }
    }

    #[test]
    fn test_angle_follows_velocity() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            down: true,
            ..Default::default()
        });

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert!((p.angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_wrap_past_right_edge() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls::default());
        p.x = rules.width + rules.wrap_margin + 1.0;

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert_eq!(p.x, -rules.wrap_margin);
        assert_eq!(p.v_x, 0.0);
    }

    #[test]
    fn test_wrap_preserves_velocity() {
        let rules = ArenaRules::default();
        let mut p = player_with(Controls {
            up: true,
            ..Default::default()
        });
        p.y = -rules.wrap_margin + 1.0;
        p.v_y = -rules.max_velocity;

        PhysicsSystem::integrate(&mut p, DT, &rules);
        assert_eq!(p.y, rules.height + rules.wrap_margin);
        assert_eq!(p.v_y, -rules.max_velocity);
    }

    #[test]
    fn test_wrap_boundaries() {
        assert_eq!(PhysicsSystem::wrap(820.0, 800.0, 20.0), 820.0);
        assert_eq!(PhysicsSystem::wrap(820.5, 800.0, 20.0), -20.0);
        assert_eq!(PhysicsSystem::wrap(-20.0, 800.0, 20.0), -20.0);
        assert_eq!(PhysicsSystem::wrap(-20.5, 800.0, 20.0), 820.0);
    }
}
