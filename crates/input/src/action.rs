use glam::Vec3;

/// Keys the shell listens for. Anything else is ignored before it gets here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    X,
    Y,
    Z,
    I,
    O,
    P,
    Q,
    E,
    A,
    D,
    W,
    S,
}

/// A high-level input action.
///
/// Rotation actions carry which Euler axis to advance; translation actions
/// carry a unit direction that the rig scales by its step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Advance the model's pitch, yaw or roll.
    RotateModel(Axis),
    /// Advance the camera's pitch, yaw or roll.
    RotateCamera(Axis),
    /// Move the camera along a unit direction.
    MoveCamera(Vec3),
}

/// Euler axis selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Pitch,
    Yaw,
    Roll,
}

pub fn action_for_key(key: Key) -> Action {
    match key {
        Key::X => Action::RotateModel(Axis::Pitch),
        Key::Y => Action::RotateModel(Axis::Yaw),
        Key::Z => Action::RotateModel(Axis::Roll),
        Key::I => Action::RotateCamera(Axis::Pitch),
        Key::O => Action::RotateCamera(Axis::Yaw),
        Key::P => Action::RotateCamera(Axis::Roll),
        Key::Q => Action::MoveCamera(Vec3::NEG_Y),
        Key::E => Action::MoveCamera(Vec3::Y),
        Key::A => Action::MoveCamera(Vec3::NEG_X),
        Key::D => Action::MoveCamera(Vec3::X),
        Key::W => Action::MoveCamera(Vec3::NEG_Z),
        Key::S => Action::MoveCamera(Vec3::Z),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_keys() {
        assert_eq!(action_for_key(Key::X), Action::RotateModel(Axis::Pitch));
        assert_eq!(action_for_key(Key::Z), Action::RotateModel(Axis::Roll));
        assert_eq!(action_for_key(Key::O), Action::RotateCamera(Axis::Yaw));
    }

    #[test]
    fn movement_keys_come_in_opposite_pairs() {
        for (a, b) in [(Key::Q, Key::E), (Key::A, Key::D), (Key::W, Key::S)] {
            match (action_for_key(a), action_for_key(b)) {
                (Action::MoveCamera(u), Action::MoveCamera(v)) => assert_eq!(u, -v),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn w_moves_forward() {
        assert_eq!(action_for_key(Key::W), Action::MoveCamera(Vec3::NEG_Z));
    }
}
