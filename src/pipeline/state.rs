//! Lifecycle states and the single-step transitions between them.

use std::fmt;

/// Lifecycle state of an element or pipeline.
///
/// States are totally ordered `Null < Ready < Paused < Playing` and are
/// only ever entered from an adjacent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum State {
    /// Initial state; no external resources are held.
    #[default]
    Null,
    /// Resources acquired, no data flowing.
    Ready,
    /// Prerolled and ready to run; position is frozen.
    Paused,
    /// Data is flowing.
    Playing,
}

impl State {
    const ORDER: [State; 4] = [State::Null, State::Ready, State::Paused, State::Playing];

    fn rank(self) -> usize {
        self as usize
    }

    /// The adjacent state one step closer to `target`.
    ///
    /// Returns `None` when already at `target`.
    pub fn step_towards(self, target: State) -> Option<State> {
        match self.cmp(&target) {
            std::cmp::Ordering::Less => Some(Self::ORDER[self.rank() + 1]),
            std::cmp::Ordering::Greater => Some(Self::ORDER[self.rank() - 1]),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// The sequence of single steps leading from `self` to `target`.
    ///
    /// ```rust
    /// use mediagraph::pipeline::{State, StateChange};
    ///
    /// let path = State::Null.path_to(State::Paused);
    /// assert_eq!(path, vec![StateChange::NullToReady, StateChange::ReadyToPaused]);
    /// assert!(State::Ready.path_to(State::Ready).is_empty());
    /// ```
    pub fn path_to(self, target: State) -> Vec<StateChange> {
        let mut path = Vec::new();
        let mut current = self;
        while let Some(next) = current.step_towards(target) {
            if let Some(step) = StateChange::between(current, next) {
                path.push(step);
            }
            current = next;
        }
        path
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Null => "NULL",
            State::Ready => "READY",
            State::Paused => "PAUSED",
            State::Playing => "PLAYING",
        };
        f.write_str(name)
    }
}

/// A single step between adjacent states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateChange {
    /// Null -> Ready: acquire resources.
    NullToReady,
    /// Ready -> Paused: preroll.
    ReadyToPaused,
    /// Paused -> Playing: start data flow.
    PausedToPlaying,
    /// Playing -> Paused: stop data flow.
    PlayingToPaused,
    /// Paused -> Ready: drop stream state.
    PausedToReady,
    /// Ready -> Null: release every resource.
    ReadyToNull,
}

impl StateChange {
    /// The step from `from` to `to`, if the two states are adjacent.
    pub fn between(from: State, to: State) -> Option<Self> {
        use State::*;
        match (from, to) {
            (Null, Ready) => Some(Self::NullToReady),
            (Ready, Paused) => Some(Self::ReadyToPaused),
            (Paused, Playing) => Some(Self::PausedToPlaying),
            (Playing, Paused) => Some(Self::PlayingToPaused),
            (Paused, Ready) => Some(Self::PausedToReady),
            (Ready, Null) => Some(Self::ReadyToNull),
            _ => None,
        }
    }

    /// State before the step.
    pub fn current(self) -> State {
        match self {
            Self::NullToReady => State::Null,
            Self::ReadyToPaused | Self::ReadyToNull => State::Ready,
            Self::PausedToPlaying | Self::PausedToReady => State::Paused,
            Self::PlayingToPaused => State::Playing,
        }
    }

    /// State after the step.
    pub fn next(self) -> State {
        match self {
            Self::ReadyToNull => State::Null,
            Self::NullToReady | Self::PausedToReady => State::Ready,
            Self::ReadyToPaused | Self::PlayingToPaused => State::Paused,
            Self::PausedToPlaying => State::Playing,
        }
    }

    /// The step that undoes this one.
    pub fn reverse(self) -> Self {
        match self {
            Self::NullToReady => Self::ReadyToNull,
            Self::ReadyToPaused => Self::PausedToReady,
            Self::PausedToPlaying => Self::PlayingToPaused,
            Self::PlayingToPaused => Self::PausedToPlaying,
            Self::PausedToReady => Self::ReadyToPaused,
            Self::ReadyToNull => Self::NullToReady,
        }
    }

    /// Whether the step moves towards Playing.
    pub fn is_upward(self) -> bool {
        self.next() > self.current()
    }
}

impl fmt::Display for StateChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.current(), self.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_ordering() {
        assert!(State::Null < State::Ready);
        assert!(State::Ready < State::Paused);
        assert!(State::Paused < State::Playing);
        assert_eq!(State::default(), State::Null);
    }

    #[test]
    fn test_full_round_trip_path() {
        let up = State::Null.path_to(State::Playing);
        let down = State::Playing.path_to(State::Null);

        let mut visited = vec![State::Null];
        visited.extend(up.iter().chain(down.iter()).map(|s| s.next()));
        assert_eq!(
            visited,
            vec![
                State::Null,
                State::Ready,
                State::Paused,
                State::Playing,
                State::Paused,
                State::Ready,
                State::Null,
            ]
        );
    }

    #[test]
    fn test_steps_are_adjacent() {
        for step in State::Null.path_to(State::Playing) {
            assert_eq!(StateChange::between(step.current(), step.next()), Some(step));
            assert_eq!(step.reverse().reverse(), step);
            assert!(step.is_upward());
        }
        assert_eq!(StateChange::between(State::Null, State::Playing), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(State::Playing.to_string(), "PLAYING");
        assert_eq!(StateChange::ReadyToNull.to_string(), "READY -> NULL");
    }
}
