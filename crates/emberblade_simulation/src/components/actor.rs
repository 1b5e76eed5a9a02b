//! Base actor components: Actor, Health, Mana

use bevy::prelude::*;

/// Actor (player, enemy, boss) — base component for living entities
///
/// Automatically adds Health through Required Components.
#[derive(Component, Debug, Clone, Default, Reflect)]
#[reflect(Component)]
#[require(Health)]
pub struct Actor {
    /// Stable faction ID (hostility is cross-faction)
    pub faction_id: u64,
}

/// Outcome of a single damage application.
///
/// The caller emits notifications based on this, so every variant carries
/// the post-mutation value where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Damage landed, entity still alive
    Applied { remaining: u32 },
    /// Damage landed and emptied the pool — death happened on THIS call
    Fatal,
    /// Target is actively deflecting: no damage, no invincibility
    Deflected,
    /// Target dead or inside an invincibility window: plain no-op
    Ignored,
}

/// Heart-based health pool
///
/// Invariants: 0 ≤ current ≤ max; `is_dead` is sticky until `revive()`.
/// Mutated only through its own API so death can never fire twice.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: u32,
    pub max: u32,
    /// Remaining invincibility window (seconds), ticked down every frame
    pub invincibility_timer: f32,
    /// Window started by each successful hit (0.0 = no i-frames)
    pub invincibility_duration: f32,
    pub is_dead: bool,
    /// Shared flag set by the deflect skill, read on every damage attempt
    pub is_deflecting: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(3) // Default 3 hearts
    }
}

impl Health {
    pub fn new(max_hearts: u32) -> Self {
        Self {
            current: max_hearts,
            max: max_hearts,
            invincibility_timer: 0.0,
            invincibility_duration: 0.0,
            is_dead: false,
            is_deflecting: false,
        }
    }

    /// Hearts plus post-hit i-frames (players get them, enemies don't)
    pub fn with_invincibility(max_hearts: u32, duration: f32) -> Self {
        Self {
            invincibility_duration: duration,
            ..Self::new(max_hearts)
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_invincible(&self) -> bool {
        self.invincibility_timer > 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }

    /// Applies damage with the deflect/dead/invincibility gates.
    ///
    /// Order matters: deflect wins over everything (and does NOT start
    /// invincibility), then dead/invincible no-ops, then the subtraction.
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if self.is_deflecting {
            return DamageOutcome::Deflected;
        }
        if self.is_dead || self.is_invincible() {
            return DamageOutcome::Ignored;
        }

        self.current = self.current.saturating_sub(amount);
        self.invincibility_timer = self.invincibility_duration;

        if self.current == 0 {
            self.is_dead = true;
            DamageOutcome::Fatal
        } else {
            DamageOutcome::Applied {
                remaining: self.current,
            }
        }
    }

    /// Heals up to max. Returns the post-mutation value, `None` if dead.
    pub fn heal(&mut self, amount: u32) -> Option<u32> {
        if self.is_dead {
            return None;
        }
        self.current = (self.current + amount).min(self.max);
        Some(self.current)
    }

    /// Rescales the pool, clamping current down if needed.
    /// Returns the post-mutation current value.
    pub fn set_max_hearts(&mut self, max_hearts: u32) -> u32 {
        self.max = max_hearts;
        self.current = self.current.min(self.max);
        self.current
    }

    /// Clears the dead flag and refills the pool.
    pub fn revive(&mut self) -> u32 {
        self.is_dead = false;
        self.current = self.max;
        self.invincibility_timer = 0.0;
        self.current
    }

    pub fn tick(&mut self, delta: f32) {
        if self.invincibility_timer > 0.0 {
            self.invincibility_timer = (self.invincibility_timer - delta).max(0.0);
        }
    }
}

/// Mana pool for skills
///
/// Invariant: 0.0 ≤ current ≤ max
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Mana {
    pub current: f32,
    pub max: f32,
    pub regen_rate: f32, // units per second
}

impl Default for Mana {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Mana {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 1.0,
        }
    }

    pub fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    pub fn consume(&mut self, cost: f32) -> bool {
        if self.can_afford(cost) {
            self.current -= cost;
            true
        } else {
            false
        }
    }

    pub fn regenerate(&mut self, delta_time: f32) {
        self.current = (self.current + self.regen_rate * delta_time).min(self.max);
    }
}
