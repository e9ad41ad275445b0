//! Selection and mode dispatch
//!
//! Derives, every tick and from scratch, which target is active and in which
//! mode it is driven. The only inputs are the monotonic button press
//! counters and the capability flags of the selected target.
//!
//! Two presses advance the selection by one step. Button 1 doubles as the
//! mode toggle for slice- and state-capable targets.

use serde::{Deserialize, Serialize};

/// How the selection index is derived from the press counters
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Button 0 steps forward, button 1 steps backward
    #[default]
    DualButton,
    /// Button 0 steps forward only
    SingleButton,
}

/// Per-tick operating mode of the selected target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlMode {
    #[default]
    Normal,
    Slicing,
    PublishingState,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub can_slice: bool,
    pub can_publish_state: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchState {
    pub selected_index: usize,
    pub mode: ControlMode,
}

fn count(counts: &[u64], button: usize) -> u64 {
    counts.get(button).copied().unwrap_or(0)
}

fn steps(counts: &[u64], button: usize) -> i64 {
    i64::try_from(count(counts, button) / 2).unwrap_or(i64::MAX)
}

/// Index of the selected target, always in `[0, target_count)`
pub fn select_index(counts: &[u64], target_count: usize, mode: SelectionMode) -> usize {
    if target_count == 0 {
        return 0;
    }
    let n = i64::try_from(target_count).unwrap_or(i64::MAX);
    let position = match mode {
        SelectionMode::DualButton => steps(counts, 0).saturating_sub(steps(counts, 1)),
        SelectionMode::SingleButton => steps(counts, 0),
    };
    let mut index = position % n;
    if index < 0 {
        index += n;
    }
    usize::try_from(index).unwrap_or(0)
}

/// Mode of the selected target; slicing wins when both flags are set
pub fn control_mode(capabilities: Capabilities, counts: &[u64]) -> ControlMode {
    let toggled = (count(counts, 1) / 2) % 2 == 1;
    if capabilities.can_slice {
        if toggled {
            ControlMode::Slicing
        } else {
            ControlMode::Normal
        }
    } else if capabilities.can_publish_state {
        if toggled {
            ControlMode::PublishingState
        } else {
            ControlMode::Normal
        }
    } else {
        ControlMode::Normal
    }
}

/// Recomputes the dispatch state for this tick
///
/// `capabilities` is indexed like the target list.
pub fn dispatch(
    counts: &[u64],
    capabilities: &[Capabilities],
    mode: SelectionMode,
) -> DispatchState {
    let selected_index = select_index(counts, capabilities.len(), mode);
    let selected = capabilities
        .get(selected_index)
        .copied()
        .unwrap_or_default();
    DispatchState {
        selected_index,
        mode: control_mode(selected, counts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLICER: Capabilities = Capabilities {
        can_slice: true,
        can_publish_state: false,
    };
    const PUBLISHER: Capabilities = Capabilities {
        can_slice: false,
        can_publish_state: true,
    };

    #[test]
    fn two_presses_advance_one_step() {
        let mode = SelectionMode::DualButton;
        assert_eq!(select_index(&[0, 0], 3, mode), 0);
        assert_eq!(select_index(&[1, 0], 3, mode), 0);
        assert_eq!(select_index(&[2, 0], 3, mode), 1);
        assert_eq!(select_index(&[5, 0], 3, mode), 2);
        assert_eq!(select_index(&[6, 0], 3, mode), 0);
    }

    #[test]
    fn dual_button_difference_wraps_into_range() {
        let mode = SelectionMode::DualButton;
        assert_eq!(select_index(&[0, 10], 4, mode), 3);
        assert_eq!(select_index(&[0, 2], 4, mode), 3);
        assert_eq!(select_index(&[2, 4], 3, mode), 2);
        for b0 in 0..20u64 {
            for b1 in 0..20u64 {
                assert!(select_index(&[b0, b1], 4, mode) < 4);
            }
        }
    }

    #[test]
    fn single_button_ignores_second_button() {
        let mode = SelectionMode::SingleButton;
        assert_eq!(select_index(&[4, 10], 3, mode), 2);
        assert_eq!(select_index(&[4, 0], 3, mode), 2);
    }

    #[test]
    fn missing_counters_read_as_zero() {
        assert_eq!(select_index(&[], 3, SelectionMode::DualButton), 0);
        assert_eq!(control_mode(SLICER, &[4]), ControlMode::Normal);
    }

    #[test]
    fn mode_follows_parity_of_half_button_one() {
        assert_eq!(control_mode(SLICER, &[0, 0]), ControlMode::Normal);
        assert_eq!(control_mode(SLICER, &[0, 1]), ControlMode::Normal);
        assert_eq!(control_mode(SLICER, &[0, 2]), ControlMode::Slicing);
        assert_eq!(control_mode(SLICER, &[0, 3]), ControlMode::Slicing);
        assert_eq!(control_mode(SLICER, &[0, 4]), ControlMode::Normal);
        assert_eq!(control_mode(PUBLISHER, &[0, 2]), ControlMode::PublishingState);
        assert_eq!(
            control_mode(Capabilities::default(), &[0, 2]),
            ControlMode::Normal
        );
    }

    #[test]
    fn slicing_takes_precedence() {
        let both = Capabilities {
            can_slice: true,
            can_publish_state: true,
        };
        assert_eq!(control_mode(both, &[0, 2]), ControlMode::Slicing);
    }

    #[test]
    fn mode_uses_only_selected_target() {
        let caps = [Capabilities::default(), SLICER, PUBLISHER];
        // button 1 moves the selection back as well as toggling
        let state = dispatch(&[4, 2], &caps, SelectionMode::DualButton);
        assert_eq!(state.selected_index, 1);
        assert_eq!(state.mode, ControlMode::Slicing);

        let state = dispatch(&[0, 2], &caps, SelectionMode::DualButton);
        assert_eq!(state.selected_index, 2);
        assert_eq!(state.mode, ControlMode::PublishingState);

        let state = dispatch(&[2, 2], &caps, SelectionMode::DualButton);
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.mode, ControlMode::Normal);
    }
}
