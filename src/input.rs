//! Maps raw keyboard, wheel, touch and button input onto marking-screen events.

use crate::models::AttendanceMark;
use crate::session::Event;

const WHEEL_THRESHOLD: f64 = 20.0;
const SWIPE_THRESHOLD: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Shift,
    ArrowUp,
    ArrowDown,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Present,
    Absent,
    FinishEarly,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    Key(Key),
    Wheel { delta_y: f64 },
    TouchStart { y: f64 },
    TouchMove { y: f64 },
    TouchEnd,
    Button(Button),
}

/// Holds the only state gestures need: where the current touch began.
#[derive(Debug, Default)]
pub struct GestureTranslator {
    touch_start: Option<f64>,
}

impl GestureTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, input: RawInput) -> Option<Event> {
        match input {
            RawInput::Key(key) => match key {
                Key::Enter => Some(Event::Mark(AttendanceMark::Present)),
                Key::Shift => Some(Event::Mark(AttendanceMark::Absent)),
                Key::ArrowUp => Some(Event::MoveUp),
                Key::ArrowDown => Some(Event::MoveDown),
                Key::Escape => Some(Event::FinishEarly),
                Key::Other => None,
            },
            RawInput::Wheel { delta_y } => {
                if delta_y.abs() < WHEEL_THRESHOLD {
                    None
                } else if delta_y > 0.0 {
                    Some(Event::MoveDown)
                } else {
                    Some(Event::MoveUp)
                }
            }
            RawInput::TouchStart { y } => {
                self.touch_start = Some(y);
                None
            }
            RawInput::TouchMove { y } => {
                let start = self.touch_start?;
                let diff = start - y;
                if diff.abs() <= SWIPE_THRESHOLD {
                    return None;
                }
                // one event per swipe
                self.touch_start = None;
                if diff > 0.0 {
                    Some(Event::MoveDown)
                } else {
                    Some(Event::MoveUp)
                }
            }
            RawInput::TouchEnd => {
                self.touch_start = None;
                None
            }
            RawInput::Button(button) => Some(match button {
                Button::Present => Event::Mark(AttendanceMark::Present),
                Button::Absent => Event::Mark(AttendanceMark::Absent),
                Button::FinishEarly => Event::FinishEarly,
            }),
        }
    }
}

/// Parses one token typed at the terminal into raw input.
pub fn parse_token(line: &str) -> Option<RawInput> {
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("enter").to_ascii_lowercase();
    let input = match head.as_str() {
        "enter" | "p" => RawInput::Key(Key::Enter),
        "shift" | "a" => RawInput::Key(Key::Shift),
        "up" | "k" => RawInput::Key(Key::ArrowUp),
        "down" | "j" => RawInput::Key(Key::ArrowDown),
        "esc" | "f" => RawInput::Key(Key::Escape),
        "present" => RawInput::Button(Button::Present),
        "absent" => RawInput::Button(Button::Absent),
        "finish" => RawInput::Button(Button::FinishEarly),
        "wheel" => RawInput::Wheel {
            delta_y: parts.next()?.parse().ok()?,
        },
        _ => return None,
    };
    Some(input)
}

/// `swipe <from> <to>` expands into a full touch sequence.
pub fn parse_swipe(line: &str) -> Option<[RawInput; 3]> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "swipe" {
        return None;
    }
    let from: f64 = parts.next()?.parse().ok()?;
    let to: f64 = parts.next()?.parse().ok()?;
    Some([
        RawInput::TouchStart { y: from },
        RawInput::TouchMove { y: to },
        RawInput::TouchEnd,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_map_to_events() {
        let mut t = GestureTranslator::new();
        assert_eq!(
            t.translate(RawInput::Key(Key::Enter)),
            Some(Event::Mark(AttendanceMark::Present))
        );
        assert_eq!(
            t.translate(RawInput::Key(Key::Shift)),
            Some(Event::Mark(AttendanceMark::Absent))
        );
        assert_eq!(t.translate(RawInput::Key(Key::ArrowUp)), Some(Event::MoveUp));
        assert_eq!(t.translate(RawInput::Key(Key::ArrowDown)), Some(Event::MoveDown));
        assert_eq!(t.translate(RawInput::Key(Key::Escape)), Some(Event::FinishEarly));
        assert_eq!(t.translate(RawInput::Key(Key::Other)), None);
    }

    #[test]
    fn small_wheel_deltas_are_ignored() {
        let mut t = GestureTranslator::new();
        assert_eq!(t.translate(RawInput::Wheel { delta_y: 19.0 }), None);
        assert_eq!(t.translate(RawInput::Wheel { delta_y: -19.9 }), None);
        assert_eq!(t.translate(RawInput::Wheel { delta_y: 20.0 }), Some(Event::MoveDown));
        assert_eq!(t.translate(RawInput::Wheel { delta_y: -45.0 }), Some(Event::MoveUp));
    }

    #[test]
    fn swipe_emits_once_per_gesture() {
        let mut t = GestureTranslator::new();
        assert_eq!(t.translate(RawInput::TouchStart { y: 300.0 }), None);
        assert_eq!(t.translate(RawInput::TouchMove { y: 280.0 }), None);
        assert_eq!(t.translate(RawInput::TouchMove { y: 250.0 }), Some(Event::MoveDown));
        assert_eq!(t.translate(RawInput::TouchMove { y: 100.0 }), None);
        assert_eq!(t.translate(RawInput::TouchEnd), None);

        t.translate(RawInput::TouchStart { y: 100.0 });
        assert_eq!(t.translate(RawInput::TouchMove { y: 140.0 }), Some(Event::MoveUp));
    }

    #[test]
    fn touch_move_without_start_is_ignored() {
        let mut t = GestureTranslator::new();
        assert_eq!(t.translate(RawInput::TouchMove { y: 10.0 }), None);
        t.translate(RawInput::TouchStart { y: 200.0 });
        t.translate(RawInput::TouchEnd);
        assert_eq!(t.translate(RawInput::TouchMove { y: 0.0 }), None);
    }

    #[test]
    fn parses_terminal_tokens() {
        assert_eq!(parse_token(""), Some(RawInput::Key(Key::Enter)));
        assert_eq!(parse_token("A"), Some(RawInput::Key(Key::Shift)));
        assert_eq!(parse_token("wheel -30"), Some(RawInput::Wheel { delta_y: -30.0 }));
        assert_eq!(parse_token("wheel"), None);
        assert_eq!(parse_token("finish"), Some(RawInput::Button(Button::FinishEarly)));
        assert_eq!(parse_token("dance"), None);
        let swipe = parse_swipe("swipe 400 300").unwrap();
        assert_eq!(swipe[1], RawInput::TouchMove { y: 300.0 });
        assert!(parse_swipe("swipe 400").is_none());
    }
}
