// ── Click state machine ──
//
// Pure per-button transition from a raw action to the derived
// `(active, click_type)` pair. Press actions (`down`/`up`/`hold`) drive
// `active`; gesture actions (`single`/`double`/`hold`) drive `click_type`.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Raw action string reported by the hub for one button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RawAction {
    Down,
    Up,
    Hold,
    Single,
    Double,
}

/// Last recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    Single,
    Double,
    Hold,
}

/// Derived state of one button.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickState {
    pub active: bool,
    pub click_type: Option<ClickType>,
}

impl ClickState {
    /// Next state after `action`.
    pub fn apply(self, action: RawAction) -> Self {
        match action {
            RawAction::Down => Self {
                active: true,
                ..self
            },
            RawAction::Up => Self {
                active: false,
                ..self
            },
            RawAction::Hold => Self {
                active: true,
                click_type: Some(ClickType::Hold),
            },
            RawAction::Single => Self {
                click_type: Some(ClickType::Single),
                ..self
            },
            RawAction::Double => Self {
                click_type: Some(ClickType::Double),
                ..self
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [RawAction; 5] = [
        RawAction::Down,
        RawAction::Up,
        RawAction::Hold,
        RawAction::Single,
        RawAction::Double,
    ];

    fn starts() -> Vec<ClickState> {
        let mut states = Vec::new();
        for active in [false, true] {
            for click_type in [None, Some(ClickType::Single), Some(ClickType::Double), Some(ClickType::Hold)] {
                states.push(ClickState { active, click_type });
            }
        }
        states
    }

    #[test]
    fn transition_law_holds_from_every_state() {
        for start in starts() {
            for action in ALL {
                let next = start.apply(action);
                match action {
                    RawAction::Down => {
                        assert!(next.active);
                        assert_eq!(next.click_type, start.click_type);
                    }
                    RawAction::Up => {
                        assert!(!next.active);
                        assert_eq!(next.click_type, start.click_type);
                    }
                    RawAction::Hold => {
                        assert!(next.active);
                        assert_eq!(next.click_type, Some(ClickType::Hold));
                    }
                    RawAction::Single => {
                        assert_eq!(next.active, start.active);
                        assert_eq!(next.click_type, Some(ClickType::Single));
                    }
                    RawAction::Double => {
                        assert_eq!(next.active, start.active);
                        assert_eq!(next.click_type, Some(ClickType::Double));
                    }
                }
            }
        }
    }

    #[test]
    fn press_and_release_sequence() {
        let state = ClickState::default()
            .apply(RawAction::Down)
            .apply(RawAction::Up)
            .apply(RawAction::Single);
        assert_eq!(
            state,
            ClickState {
                active: false,
                click_type: Some(ClickType::Single),
            }
        );

        let held = state.apply(RawAction::Down).apply(RawAction::Hold);
        assert!(held.active);
        assert_eq!(held.click_type, Some(ClickType::Hold));
        assert!(!held.apply(RawAction::Up).active);
    }

    #[test]
    fn raw_actions_parse_exact_lowercase_only() {
        assert_eq!("down".parse::<RawAction>().unwrap(), RawAction::Down);
        assert!("DOWN".parse::<RawAction>().is_err());
        assert!("Hold".parse::<RawAction>().is_err());
        assert_eq!("double".parse::<RawAction>().unwrap(), RawAction::Double);
        assert!("triple".parse::<RawAction>().is_err());
        assert_eq!(ClickType::Hold.as_ref(), "hold");
    }
}
