//! Reference simulation
//!
//! A tiny deterministic platformer used by the CLI and by tests. Player 1
//! walks with the d-pad or left stick, jumps with `a`, and collects coins
//! whose positions come from a seeded PCG stream.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Simulation, SimulationError};
use crate::debug::{ActionParamValue, DebugRegistry, DebugValue, ValueType};
use crate::replay::{Button, ControllerInput};

const WALK_SPEED: f64 = 2.0;
const JUMP_VELOCITY: f64 = -8.0;
const GRAVITY: f64 = 0.5;
const COIN_RANGE: f64 = 200.0;
const COIN_RADIUS: f64 = 2.0;

/// Deterministic platformer exposing its state through the debug registry
#[derive(Debug, Clone)]
pub struct ReferenceSim {
    rng: Pcg32,
    player_x: f64,
    player_y: f64,
    velocity_x: f64,
    velocity_y: f64,
    on_ground: bool,
    level: i64,
    score: i64,
    coin_x: f64,
    ticks: i64,
}

impl Default for ReferenceSim {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceSim {
    pub fn new() -> Self {
        Self {
            rng: Pcg32::seed_from_u64(0),
            player_x: 0.0,
            player_y: 0.0,
            velocity_x: 0.0,
            velocity_y: 0.0,
            on_ground: true,
            level: 1,
            score: 0,
            coin_x: 0.0,
            ticks: 0,
        }
    }

    fn reset_player(&mut self) {
        self.player_x = 0.0;
        self.player_y = 0.0;
        self.velocity_x = 0.0;
        self.velocity_y = 0.0;
        self.on_ground = true;
    }

    fn respawn_coin(&mut self) {
        self.coin_x = self.rng.random_range(0.0..COIN_RANGE).floor();
    }

    fn horizontal_intent(input: &ControllerInput) -> f64 {
        if input.held(Button::Right) {
            WALK_SPEED
        } else if input.held(Button::Left) {
            -WALK_SPEED
        } else {
            WALK_SPEED * f64::from(input.left_stick_x) / 127.0
        }
    }
}

impl Simulation for ReferenceSim {
    fn seed(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
    }

    fn init(&mut self, registry: &mut DebugRegistry) -> Result<(), SimulationError> {
        registry.register_variable("player_x", ValueType::Float)?;
        registry.register_variable("player_y", ValueType::Float)?;
        registry.register_variable("velocity_x", ValueType::Float)?;
        registry.register_variable("velocity_y", ValueType::Float)?;
        registry.register_variable("on_ground", ValueType::Bool)?;
        registry.register_variable("level", ValueType::Int)?;
        registry.register_variable("score", ValueType::Int)?;
        registry.register_variable("coin_x", ValueType::Float)?;
        registry.register_variable("ticks", ValueType::Int)?;

        registry.action_begin("Load Level")?;
        registry.action_param("level", ActionParamValue::Int(1))?;
        registry.action_end()?;

        registry.action_begin("Teleport")?;
        registry.action_param("x", ActionParamValue::Float(0.0))?;
        registry.action_param("y", ActionParamValue::Float(0.0))?;
        registry.action_end()?;

        registry.action_begin("Reset State")?;
        registry.action_end()?;

        self.respawn_coin();
        Ok(())
    }

    fn update(&mut self, _tick: u64, inputs: &[ControllerInput]) -> Result<(), SimulationError> {
        let input = inputs.first().copied().unwrap_or_default();

        self.velocity_x = Self::horizontal_intent(&input);

        if input.held(Button::A) && self.on_ground {
            self.velocity_y = JUMP_VELOCITY;
            self.on_ground = false;
        } else if !self.on_ground {
            self.velocity_y += GRAVITY;
        }

        self.player_x += self.velocity_x;
        self.player_y += self.velocity_y;

        // Floor at y = 0, negative y is up
        if self.player_y >= 0.0 {
            self.player_y = 0.0;
            self.velocity_y = 0.0;
            self.on_ground = true;
        }

        if (self.player_x - self.coin_x).abs() < COIN_RADIUS {
            self.score += 1;
            self.respawn_coin();
        }

        self.ticks += 1;
        Ok(())
    }

    fn read_variable(&self, name: &str) -> Option<DebugValue> {
        let value = match name {
            "player_x" => DebugValue::Float(self.player_x),
            "player_y" => DebugValue::Float(self.player_y),
            "velocity_x" => DebugValue::Float(self.velocity_x),
            "velocity_y" => DebugValue::Float(self.velocity_y),
            "on_ground" => DebugValue::Bool(self.on_ground),
            "level" => DebugValue::Int(self.level),
            "score" => DebugValue::Int(self.score),
            "coin_x" => DebugValue::Float(self.coin_x),
            "ticks" => DebugValue::Int(self.ticks),
            _ => return None,
        };
        Some(value)
    }

    fn call_action(&mut self, name: &str, args: &[ActionParamValue]) -> Result<(), String> {
        match (name, args) {
            ("Load Level", [ActionParamValue::Int(level)]) => {
                if *level < 1 {
                    return Err(format!("level must be positive, got {}", level));
                }
                self.level = *level;
                self.reset_player();
                Ok(())
            }
            ("Teleport", [ActionParamValue::Float(x), ActionParamValue::Float(y)]) => {
                self.player_x = *x;
                self.player_y = y.min(0.0);
                self.on_ground = self.player_y >= 0.0;
                Ok(())
            }
            ("Reset State", []) => {
                self.reset_player();
                self.score = 0;
                Ok(())
            }
            _ => Err(format!("no handler for '{}' with {} argument(s)", name, args.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_sim(seed: u64) -> ReferenceSim {
        let mut sim = ReferenceSim::new();
        let mut registry = DebugRegistry::new();
        sim.seed(seed);
        sim.init(&mut registry).unwrap();
        sim
    }

    #[test]
    fn test_jump_sets_velocity() {
        let mut sim = init_sim(0);
        sim.update(0, &[ControllerInput::from_buttons(Button::A.mask())])
            .unwrap();
        assert_eq!(sim.read_variable("velocity_y"), Some(DebugValue::Float(-8.0)));
        assert_eq!(sim.read_variable("on_ground"), Some(DebugValue::Bool(false)));
    }

    #[test]
    fn test_walk_right() {
        let mut sim = init_sim(0);
        let right = ControllerInput::from_buttons(Button::Right.mask());
        for tick in 0..5 {
            sim.update(tick, &[right]).unwrap();
        }
        assert_eq!(sim.read_variable("player_x"), Some(DebugValue::Float(10.0)));
    }

    #[test]
    fn test_jump_lands() {
        let mut sim = init_sim(0);
        sim.update(0, &[ControllerInput::from_buttons(Button::A.mask())])
            .unwrap();
        for tick in 1..40 {
            sim.update(tick, &[ControllerInput::default()]).unwrap();
        }
        assert_eq!(sim.read_variable("on_ground"), Some(DebugValue::Bool(true)));
        assert_eq!(sim.read_variable("player_y"), Some(DebugValue::Float(0.0)));
    }

    #[test]
    fn test_same_seed_same_coins() {
        let a = init_sim(42);
        let b = init_sim(42);
        assert_eq!(a.read_variable("coin_x"), b.read_variable("coin_x"));
    }

    #[test]
    fn test_load_level_action() {
        let mut sim = init_sim(0);
        sim.call_action("Load Level", &[ActionParamValue::Int(3)])
            .unwrap();
        assert_eq!(sim.read_variable("level"), Some(DebugValue::Int(3)));
        assert!(sim.call_action("Load Level", &[ActionParamValue::Int(0)]).is_err());
        assert!(sim.call_action("Load Level", &[]).is_err());
    }
}
