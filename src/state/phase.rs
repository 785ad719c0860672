//! Phase machine of one card game round.

use thiserror::Error;

/// Lifecycle phases of one card game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No round in progress; a new one may start.
    Ready,
    /// The deck is being shuffled.
    Shuffling,
    /// Cards are being dealt to hands and piles.
    Distributing,
    /// Turns and bell races are accepted.
    Playing,
    /// A winner has been declared; a new round may start.
    Finished,
}

/// Events that move the phase machine forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Begin a round by shuffling a fresh deck.
    Shuffle,
    /// Shuffle complete; deal the cards.
    Distribute,
    /// Deal complete; open the table.
    BeginPlay,
    /// Exactly one player is left.
    Finish,
    /// Drop whatever is in progress and go back to ready.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: PhaseEvent,
}

/// Phase machine for `ready -> shuffling -> distributing -> playing -> (ready | finished)`.
#[derive(Debug, Clone)]
pub struct PhaseMachine {
    phase: GamePhase,
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Ready,
        }
    }
}

impl PhaseMachine {
    /// Create a machine in the ready phase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: PhaseEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        Ok(next)
    }

    fn compute_transition(&self, event: PhaseEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Ready | GamePhase::Finished, PhaseEvent::Shuffle) => GamePhase::Shuffling,
            (GamePhase::Shuffling, PhaseEvent::Distribute) => GamePhase::Distributing,
            (GamePhase::Distributing, PhaseEvent::BeginPlay) => GamePhase::Playing,
            (GamePhase::Playing, PhaseEvent::Finish) => GamePhase::Finished,
            (_, PhaseEvent::Reset) => GamePhase::Ready,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(machine: &mut PhaseMachine, event: PhaseEvent) -> GamePhase {
        machine.apply(event).unwrap()
    }

    #[test]
    fn initial_state_is_ready() {
        let machine = PhaseMachine::new();
        assert_eq!(machine.phase(), GamePhase::Ready);
    }

    #[test]
    fn full_round_through_the_table() {
        let mut machine = PhaseMachine::new();

        assert_eq!(apply(&mut machine, PhaseEvent::Shuffle), GamePhase::Shuffling);
        assert_eq!(
            apply(&mut machine, PhaseEvent::Distribute),
            GamePhase::Distributing
        );
        assert_eq!(apply(&mut machine, PhaseEvent::BeginPlay), GamePhase::Playing);
        assert_eq!(apply(&mut machine, PhaseEvent::Finish), GamePhase::Finished);
        assert_eq!(apply(&mut machine, PhaseEvent::Shuffle), GamePhase::Shuffling);
    }

    #[test]
    fn reset_is_accepted_from_any_phase() {
        let mut machine = PhaseMachine::new();
        apply(&mut machine, PhaseEvent::Shuffle);
        apply(&mut machine, PhaseEvent::Distribute);
        apply(&mut machine, PhaseEvent::BeginPlay);

        assert_eq!(apply(&mut machine, PhaseEvent::Reset), GamePhase::Ready);
        assert_eq!(apply(&mut machine, PhaseEvent::Reset), GamePhase::Ready);
    }

    #[test]
    fn cannot_restart_while_playing() {
        let mut machine = PhaseMachine::new();
        apply(&mut machine, PhaseEvent::Shuffle);
        apply(&mut machine, PhaseEvent::Distribute);
        apply(&mut machine, PhaseEvent::BeginPlay);

        let err = machine.apply(PhaseEvent::Shuffle).unwrap_err();
        assert_eq!(err.from, GamePhase::Playing);
        assert_eq!(err.event, PhaseEvent::Shuffle);
        assert_eq!(machine.phase(), GamePhase::Playing);
    }

    #[test]
    fn invalid_transition_leaves_phase_untouched() {
        let mut machine = PhaseMachine::new();
        let err = machine.apply(PhaseEvent::Finish).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: GamePhase::Ready,
                event: PhaseEvent::Finish,
            }
        );
        assert_eq!(machine.phase(), GamePhase::Ready);
    }
}
