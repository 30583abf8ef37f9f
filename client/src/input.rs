use bevy::prelude::*;
use leafwing_input_manager::prelude::*;
use viewer_shared::MoveFlag;

#[derive(Reflect, Actionlike, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViewerAction {
    Forward,
    Backward,
    Left,
    Right,
    /// Click on the viewport: request pointer capture.
    Capture,
    Release,
    ToggleDebug,
    /// Digit keys 1..=9 pick a catalog entry directly.
    Select(u8),
}

impl ViewerAction {
    pub const MOVES: [(ViewerAction, MoveFlag); 4] = [
        (ViewerAction::Forward, MoveFlag::Forward),
        (ViewerAction::Backward, MoveFlag::Backward),
        (ViewerAction::Left, MoveFlag::Left),
        (ViewerAction::Right, MoveFlag::Right),
    ];
}

const DIGITS: [KeyCode; 9] = [
    KeyCode::Digit1,
    KeyCode::Digit2,
    KeyCode::Digit3,
    KeyCode::Digit4,
    KeyCode::Digit5,
    KeyCode::Digit6,
    KeyCode::Digit7,
    KeyCode::Digit8,
    KeyCode::Digit9,
];

pub(super) fn plugin(app: &mut App) {
    app.add_plugins(InputManagerPlugin::<ViewerAction>::default());

    app.register_type::<ViewerAction>();

    app.insert_resource(default_input_map());
    app.insert_resource(ActionState::<ViewerAction>::default());
}

fn default_input_map() -> InputMap<ViewerAction> {
    let mut input_map = InputMap::<ViewerAction>::default();
    input_map.insert(ViewerAction::Forward, KeyCode::KeyW);
    input_map.insert(ViewerAction::Forward, KeyCode::ArrowUp);
    input_map.insert(ViewerAction::Backward, KeyCode::KeyS);
    input_map.insert(ViewerAction::Backward, KeyCode::ArrowDown);
    input_map.insert(ViewerAction::Left, KeyCode::KeyA);
    input_map.insert(ViewerAction::Left, KeyCode::ArrowLeft);
    input_map.insert(ViewerAction::Right, KeyCode::KeyD);
    input_map.insert(ViewerAction::Right, KeyCode::ArrowRight);
    input_map.insert(ViewerAction::Capture, MouseButton::Left);
    input_map.insert(ViewerAction::Release, KeyCode::Escape);
    input_map.insert(ViewerAction::ToggleDebug, KeyCode::F3);
    for (slot, key) in (0u8..).zip(DIGITS) {
        input_map.insert(ViewerAction::Select(slot), key);
    }
    input_map
}
