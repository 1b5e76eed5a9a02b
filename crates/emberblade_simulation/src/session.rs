//! Game session: countdown timer, score, best-score memory
//!
//! One run lasts a fixed time. Kills award the victim's ScoreValue; the run
//! ends when the timer expires or the player dies. Best score survives
//! session resets but not process restarts.

use bevy::prelude::*;

use crate::combat::EntityDied;
use crate::components::Player;
use crate::spawn::ScoreValue;
use crate::SimulationSet;

pub const SESSION_DURATION: f32 = 120.0;

#[derive(Resource, Debug, Clone)]
pub struct GameSession {
    pub score: u32,
    pub best_score: u32,
    pub time_remaining: f32,
    pub game_over: bool,
}

impl Default for GameSession {
    fn default() -> Self {
        Self {
            score: 0,
            best_score: 0,
            time_remaining: SESSION_DURATION,
            game_over: false,
        }
    }
}

impl GameSession {
    pub fn add_score(&mut self, points: u32) {
        if self.game_over {
            return;
        }
        self.score += points;
        if self.score > self.best_score {
            self.best_score = self.score;
        }
    }

    /// Ends the run; idempotent so timer expiry and player death can race.
    pub fn end(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.game_over = true;
        true
    }

    /// Starts a fresh run, keeping the best score.
    pub fn reset(&mut self) {
        self.score = 0;
        self.time_remaining = SESSION_DURATION;
        self.game_over = false;
    }
}

/// System: countdown
pub fn tick_session(mut session: ResMut<GameSession>, time: Res<Time<Fixed>>) {
    if session.game_over {
        return;
    }

    session.time_remaining -= time.delta_secs();
    if session.time_remaining <= 0.0 {
        session.time_remaining = 0.0;
        if session.end() {
            crate::logger::log_info(&format!(
                "⏱ Time up! Final score {} (best {})",
                session.score, session.best_score
            ));
        }
    }
}

/// System: score from kills
pub fn award_score(
    mut session: ResMut<GameSession>,
    mut death_events: EventReader<EntityDied>,
    scores: Query<&ScoreValue>,
) {
    for event in death_events.read() {
        let Ok(value) = scores.get(event.entity) else {
            continue;
        };
        session.add_score(value.points);
        crate::logger::log(&format!(
            "Score +{} → {} ({:?} down)",
            value.points, session.score, event.entity
        ));
    }
}

/// System: player death ends the run
pub fn detect_player_death(
    mut session: ResMut<GameSession>,
    mut death_events: EventReader<EntityDied>,
    players: Query<(), With<Player>>,
) {
    for event in death_events.read() {
        if players.get(event.entity).is_ok() && session.end() {
            crate::logger::log_info(&format!(
                "💀 Player down. Final score {} (best {})",
                session.score, session.best_score
            ));
        }
    }
}

/// Session plugin
pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSession>().add_systems(
            FixedUpdate,
            (tick_session, award_score, detect_player_death)
                .chain()
                .in_set(SimulationSet::Session),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_score_survives_reset() {
        let mut session = GameSession::default();
        session.add_score(300);
        session.reset();

        assert_eq!(session.score, 0);
        assert_eq!(session.best_score, 300);
        assert!(!session.game_over);
    }

    #[test]
    fn test_no_score_after_game_over() {
        let mut session = GameSession::default();
        session.add_score(100);
        assert!(session.end());
        assert!(!session.end()); // second end is a no-op

        session.add_score(100);
        assert_eq!(session.score, 100);
    }
}
