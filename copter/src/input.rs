use crate::{Rotor, RotorGroup};

pub const KEY_I: u32 = 105;
pub const KEY_K: u32 = 107;
pub const KEY_S: u32 = 115;
pub const KEY_W: u32 = 119;

/// How far the pitch trim may lean either way
pub const FORWARD_LIMIT: i32 = 5;
pub const TRIM_STEP: f32 = 1.0;
pub const THROTTLE_STEP: f32 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// i - ease off the rear rotors
    TrimRear,
    /// k - ease off the front rotors
    TrimFront,
    /// w - all rotors up
    ThrottleUp,
    /// s - all rotors down
    ThrottleDown,
}

impl Command {
    /// Map a keypress character code; anything unrecognised is None
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            KEY_I => Some(Command::TrimRear),
            KEY_K => Some(Command::TrimFront),
            KEY_W => Some(Command::ThrottleUp),
            KEY_S => Some(Command::ThrottleDown),
            _ => None,
        }
    }
}

/// Keyboard-driven rotor power, with a pitch trim counter in [-5, 5]
#[derive(Debug, Default, Clone)]
pub struct InputController {
    forward: i32,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&self) -> i32 {
        self.forward
    }

    /// Returns whether the key was recognised
    pub fn handle_key(&mut self, code: u32, rotors: &mut [Rotor]) -> bool {
        match Command::from_key_code(code) {
            Some(command) => {
                self.apply(command, rotors);
                true
            }
            None => false,
        }
    }

    pub fn apply(&mut self, command: Command, rotors: &mut [Rotor]) {
        match command {
            Command::TrimRear => {
                if self.forward < FORWARD_LIMIT {
                    change_power(rotors, Some(RotorGroup::Rear), -TRIM_STEP);
                    self.forward += 1;
                }
            }
            Command::TrimFront => {
                if self.forward > -FORWARD_LIMIT {
                    change_power(rotors, Some(RotorGroup::Front), -TRIM_STEP);
                    self.forward -= 1;
                }
            }
            Command::ThrottleUp => change_power(rotors, None, THROTTLE_STEP),
            Command::ThrottleDown => change_power(rotors, None, -THROTTLE_STEP),
        }
        log::debug!(
            "{command:?}: forward={} power={:?}",
            self.forward,
            rotors.iter().map(Rotor::power).collect::<Vec<_>>()
        );
    }
}

/// Change power of every rotor in `group` (all rotors for None), clamped to [0, 100]
pub fn change_power(rotors: &mut [Rotor], group: Option<RotorGroup>, delta: f32) {
    rotors
        .iter_mut()
        .filter(|rotor| group.is_none_or(|g| rotor.group == g))
        .for_each(|rotor| rotor.change_power(delta));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotor::detached_rotor;

    fn rotors() -> Vec<Rotor> {
        vec![
            detached_rotor("BR", RotorGroup::Rear),
            detached_rotor("FR", RotorGroup::Front),
            detached_rotor("BL", RotorGroup::Rear),
            detached_rotor("FL", RotorGroup::Front),
        ]
    }

    fn powers(rotors: &[Rotor]) -> Vec<f32> {
        rotors.iter().map(Rotor::power).collect()
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        for code in [0, 73, 87, 106, 120, 32] {
            assert!(!input.handle_key(code, &mut rotors));
        }
        assert_eq!(powers(&rotors), vec![0.0; 4]);
        assert_eq!(input.forward(), 0);
    }

    #[test]
    fn throttle_moves_all_rotors_in_steps_of_fifteen() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        assert!(input.handle_key(KEY_W, &mut rotors));
        input.handle_key(KEY_W, &mut rotors);
        assert_eq!(powers(&rotors), vec![30.0; 4]);
        input.handle_key(KEY_S, &mut rotors);
        assert_eq!(powers(&rotors), vec![15.0; 4]);
    }

    #[test]
    fn power_stays_clamped_for_any_throttle_sequence() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        // deterministic pseudo-random w/s sequence
        let mut seed: u32 = 0x2545_f491;
        for _ in 0..500 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let key = if seed % 3 == 0 { KEY_S } else { KEY_W };
            input.handle_key(key, &mut rotors);
            assert!(rotors.iter().all(|r| (0.0..=100.0).contains(&r.power())));
        }
        for _ in 0..10 {
            input.handle_key(KEY_W, &mut rotors);
        }
        assert_eq!(powers(&rotors), vec![100.0; 4]);
        for _ in 0..10 {
            input.handle_key(KEY_S, &mut rotors);
        }
        assert_eq!(powers(&rotors), vec![0.0; 4]);
    }

    #[test]
    fn trim_touches_one_group_only() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        for _ in 0..4 {
            input.handle_key(KEY_W, &mut rotors);
        }
        input.handle_key(KEY_I, &mut rotors);
        assert_eq!(powers(&rotors), vec![59.0, 60.0, 59.0, 60.0]);
        assert_eq!(input.forward(), 1);
        input.handle_key(KEY_K, &mut rotors);
        input.handle_key(KEY_K, &mut rotors);
        assert_eq!(powers(&rotors), vec![59.0, 58.0, 59.0, 58.0]);
        assert_eq!(input.forward(), -1);
    }

    #[test]
    fn forward_stays_within_limits() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        for _ in 0..4 {
            input.handle_key(KEY_W, &mut rotors);
        }
        for _ in 0..20 {
            input.handle_key(KEY_I, &mut rotors);
            assert!(input.forward() <= FORWARD_LIMIT);
        }
        assert_eq!(input.forward(), 5);
        // trim stops once the limit is reached
        assert_eq!(powers(&rotors), vec![55.0, 60.0, 55.0, 60.0]);
        for _ in 0..30 {
            input.handle_key(KEY_K, &mut rotors);
            assert!(input.forward() >= -FORWARD_LIMIT);
        }
        assert_eq!(input.forward(), -5);
        assert_eq!(powers(&rotors), vec![55.0, 50.0, 55.0, 50.0]);
    }

    #[test]
    fn trim_at_zero_power_still_counts() {
        let mut input = InputController::new();
        let mut rotors = rotors();
        input.handle_key(KEY_I, &mut rotors);
        assert_eq!(input.forward(), 1);
        assert_eq!(powers(&rotors), vec![0.0; 4]);
    }
}
