/*!
Input routing.

Keyboard keys, joystick drags, mouse deltas and touch drags all end up in one [`InputState`]:
a movement intent (four flags or an analog vector) and a look delta accumulated until the
frame drains it.

Design
- Mouse look only counts while the pointer is captured ([`LookCapture::Captured`]).
- Touch look never needs capture.
- [`InputState::take_look_delta`] is read-then-zero; the frame calls it exactly once.
- Screen coordinates are Y-down, so dragging up means forward / look up.
*/

use crate::{
    bitmask_flags::BitmaskFlags,
    config::JoystickMode,
    define_bitmask_flags,
    types::Vec2,
};

define_bitmask_flags!(MoveFlag, u8, {
    Forward,
    Backward,
    Left,
    Right,
});

impl MoveFlag {
    pub const ALL: [MoveFlag; 4] = [Self::Forward, Self::Backward, Self::Left, Self::Right];
}

/// Pointer-capture state of the look control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LookCapture {
    /// Not captured; mouse deltas are ignored.
    #[default]
    Locked,
    /// Captured; raw mouse deltas drive look.
    Captured,
}

#[derive(Clone, Debug, Default)]
pub struct InputState {
    moves: BitmaskFlags<u8>,
    analog: Option<Vec2>,
    look_delta: Vec2,
    capture: LookCapture,
}

impl InputState {
    pub fn set_move(&mut self, flag: MoveFlag, pressed: bool) {
        self.moves.set(flag, pressed);
    }

    #[inline]
    pub fn is_moving(&self, flag: MoveFlag) -> bool {
        self.moves.has(flag)
    }

    /// Set (or clear with `None`) the analog movement vector. It overrides the flags while set.
    pub fn set_analog(&mut self, analog: Option<Vec2>) {
        self.analog = analog.filter(|v| v.norm_squared() > 0.0);
    }

    /// Clear every movement input.
    pub fn release_all_moves(&mut self) {
        self.moves.clear();
        self.analog = None;
    }

    /// Movement intent: `x` is strafe (+right), `y` is forward.
    ///
    /// The vector is normalized only when its length exceeds one, so partial analog deflection
    /// walks slower while diagonals never walk faster.
    pub fn movement_intent(&self) -> Vec2 {
        let raw = self.analog.unwrap_or_else(|| {
            let axis = |pos: MoveFlag, neg: MoveFlag| {
                self.moves.has(pos) as i8 as f32 - self.moves.has(neg) as i8 as f32
            };
            Vec2::new(
                axis(MoveFlag::Right, MoveFlag::Left),
                axis(MoveFlag::Forward, MoveFlag::Backward),
            )
        });

        let len = raw.norm();
        if len > 1.0 { raw / len } else { raw }
    }

    #[inline]
    pub fn capture(&self) -> LookCapture {
        self.capture
    }

    /// Pointer capture was granted by the host.
    pub fn capture_granted(&mut self) {
        if self.capture != LookCapture::Captured {
            log::debug!("pointer captured");
            self.capture = LookCapture::Captured;
        }
    }

    /// Pointer capture was lost (escape, focus loss). Idempotent.
    pub fn capture_lost(&mut self) {
        if self.capture != LookCapture::Locked {
            log::debug!("pointer released");
            self.capture = LookCapture::Locked;
        }
    }

    /// Pointer capture request failed. Look stays inactive; movement is unaffected.
    pub fn capture_failed(&mut self, reason: &str) {
        log::warn!("pointer capture failed: {reason}");
        self.capture = LookCapture::Locked;
    }

    /// Raw mouse movement. Ignored unless captured.
    pub fn add_mouse_delta(&mut self, delta: Vec2) {
        if self.capture == LookCapture::Captured {
            self.look_delta += delta;
        }
    }

    /// Touch look movement (already in look pixels).
    pub fn add_touch_delta(&mut self, delta: Vec2) {
        self.look_delta += delta;
    }

    /// Look delta accumulated since the last call; zeroed on read.
    pub fn take_look_delta(&mut self) -> Vec2 {
        std::mem::replace(&mut self.look_delta, Vec2::zeros())
    }

    #[inline]
    pub fn pending_look_delta(&self) -> Vec2 {
        self.look_delta
    }

    /// Route a movement-joystick drag.
    pub fn apply_joystick(&mut self, stick: &Joystick, displacement: Vec2) {
        match stick.mode {
            JoystickMode::Discrete => {
                self.analog = None;
                for (flag, on) in stick.discrete(displacement) {
                    self.set_move(flag, on);
                }
            }
            JoystickMode::Analog => self.set_analog(Some(stick.analog(displacement))),
        }
    }
}

/// On-screen movement joystick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Joystick {
    pub mode: JoystickMode,
    /// Displacement (logical px) below which an axis does not register.
    pub dead_zone: f32,
    /// Displacement (logical px) mapped to full analog deflection.
    pub radius: f32,
}

impl Joystick {
    /// Four cardinal zones. Each axis activates independently once past the dead zone.
    pub fn discrete(&self, d: Vec2) -> [(MoveFlag, bool); 4] {
        [
            (MoveFlag::Forward, d.y < -self.dead_zone),
            (MoveFlag::Backward, d.y > self.dead_zone),
            (MoveFlag::Left, d.x < -self.dead_zone),
            (MoveFlag::Right, d.x > self.dead_zone),
        ]
    }

    /// Continuous intent (`x` right, `y` forward), zero inside the dead zone.
    pub fn analog(&self, d: Vec2) -> Vec2 {
        if d.norm() <= self.dead_zone {
            return Vec2::zeros();
        }
        let v = Vec2::new(d.x, -d.y) / self.radius.max(f32::EPSILON);
        let len = v.norm();
        if len > 1.0 { v / len } else { v }
    }
}

/// Turns a sequence of touch points into look deltas.
#[derive(Clone, Copy, Debug, Default)]
pub struct TouchLook {
    last: Option<Vec2>,
}

impl TouchLook {
    pub fn begin(&mut self, point: Vec2) {
        self.last = Some(point);
    }

    /// Delta from the previous touch point, scaled.
    pub fn moved(&mut self, point: Vec2, scale: f32) -> Vec2 {
        let delta = self.last.map_or(Vec2::zeros(), |last| (point - last) * scale);
        self.last = Some(point);
        delta
    }

    pub fn end(&mut self) {
        self.last = None;
    }
}

/// Mobile controls show only on narrow portrait viewports.
#[inline]
pub fn is_mobile_viewport(width: f32, height: f32, max_width: f32) -> bool {
    width <= max_width && height > width
}
