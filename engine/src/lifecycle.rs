//! Pure phase/nudge deadline machine.
//!
//! [`LifecycleState`] owns no timers. It tracks the two deadlines a live room
//! can have (the current phase's countdown and, during SHARING, the nudge
//! interval) and converts "time has passed" into an ordered list of emissions.
//! The async driver in `runtime` sleeps until [`next_deadline`] and
//! calls [`advance_to`]; tests drive it with arbitrary instants and never wait.
//!
//! [`next_deadline`]: LifecycleState::next_deadline
//! [`advance_to`]: LifecycleState::advance_to

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use hearth_types::{PhaseConfig, PhaseId, PhaseSchedule};

use crate::random::RandomSource;

/// Nudge cadence and pool for the SHARING phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NudgeConfig {
    pub interval: Duration,
    pub pool: Vec<String>,
}

impl NudgeConfig {
    /// Reference cadence: one nudge every 45 seconds, drawn from the standard
    /// encouragement pool.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            interval: Duration::from_secs(45),
            pool: vec![
                "Let's pause and hear from someone else.".to_string(),
                "If you haven't shared yet and would like to, now is a good time.".to_string(),
                "Remember to reflect instead of advising.".to_string(),
            ],
        }
    }

    fn is_armed(&self) -> bool {
        self.interval > Duration::ZERO && !self.pool.is_empty()
    }
}

impl Default for NudgeConfig {
    fn default() -> Self {
        Self::reference()
    }
}

/// A system-side output decided by the lifecycle machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// A phase became active; its system prompt is emitted exactly once.
    PhaseEntered { phase: PhaseId, prompt: String },
    /// Periodic encouragement, SHARING phase only.
    Nudge { text: String },
}

/// Deadline state for one room. Strictly linear phase sequence, no branching.
#[derive(Debug)]
pub struct LifecycleState {
    schedule: PhaseSchedule,
    nudges: NudgeConfig,
    phase: PhaseId,
    /// Expiry of the current phase; `None` once CLOSE has elapsed.
    phase_deadline: Option<Instant>,
    /// Next nudge instant; armed only while in SHARING.
    next_nudge: Option<Instant>,
}

impl LifecycleState {
    /// Enter ARRIVAL at `now`. The returned emission is ARRIVAL's system
    /// prompt; nothing is emitted before this call.
    pub fn start(schedule: PhaseSchedule, nudges: NudgeConfig, now: Instant) -> (Self, Emission) {
        let prompt = schedule.get(PhaseId::Arrival).system_prompt().to_string();
        let deadline = now + schedule.get(PhaseId::Arrival).duration();
        let state = Self {
            schedule,
            nudges,
            phase: PhaseId::Arrival,
            phase_deadline: Some(deadline),
            next_nudge: None,
        };
        (
            state,
            Emission::PhaseEntered {
                phase: PhaseId::Arrival,
                prompt,
            },
        )
    }

    #[must_use]
    pub fn current_phase(&self) -> PhaseId {
        self.phase
    }

    /// Config of the phase that is currently active.
    #[must_use]
    pub fn current_config(&self) -> &PhaseConfig {
        self.schedule.get(self.phase)
    }

    /// Whether CLOSE has run out. A finished room accepts no further phase
    /// transitions and emits nothing more.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase_deadline.is_none()
    }

    /// Time left in the current phase, zero once finished.
    #[must_use]
    pub fn time_remaining(&self, now: Instant) -> Duration {
        self.phase_deadline
            .map_or(Duration::ZERO, |deadline| {
                deadline.saturating_duration_since(now)
            })
    }

    /// The earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.phase_deadline, self.next_nudge) {
            (Some(phase), Some(nudge)) => Some(phase.min(nudge)),
            (Some(deadline), None) | (None, Some(deadline)) => Some(deadline),
            (None, None) => None,
        }
    }

    /// Fire every deadline that is due at `now`, in the order the deadlines
    /// fall. On a phase/nudge tie the phase transition wins and the pending
    /// nudge is dropped - nudges never leak past the end of SHARING.
    pub fn advance_to(&mut self, now: Instant, random: &mut impl RandomSource) -> Vec<Emission> {
        let mut emissions = Vec::new();
        loop {
            let phase_due = self.phase_deadline.filter(|deadline| *deadline <= now);
            let nudge_due = self.next_nudge.filter(|deadline| *deadline <= now);
            match (phase_due, nudge_due) {
                (Some(phase_at), Some(nudge_at)) if nudge_at < phase_at => {
                    self.fire_nudge(nudge_at, random, &mut emissions);
                }
                (Some(phase_at), _) => {
                    self.fire_phase_expiry(phase_at, &mut emissions);
                }
                (None, Some(nudge_at)) => {
                    self.fire_nudge(nudge_at, random, &mut emissions);
                }
                (None, None) => break,
            }
        }
        emissions
    }

    fn fire_nudge(
        &mut self,
        at: Instant,
        random: &mut impl RandomSource,
        emissions: &mut Vec<Emission>,
    ) {
        let text = self.nudges.pool[random.pick_index(self.nudges.pool.len())].clone();
        emissions.push(Emission::Nudge { text });
        self.next_nudge = Some(at + self.nudges.interval);
    }

    fn fire_phase_expiry(&mut self, at: Instant, emissions: &mut Vec<Emission>) {
        match self.phase.next() {
            Some(next) => self.enter_phase(next, at, emissions),
            None => {
                // CLOSE elapsed: end of active facilitation
                debug!(phase = %self.phase, "lifecycle finished");
                self.phase_deadline = None;
                self.next_nudge = None;
            }
        }
    }

    fn enter_phase(&mut self, phase: PhaseId, at: Instant, emissions: &mut Vec<Emission>) {
        debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
        let config = self.schedule.get(phase);
        self.phase_deadline = Some(at + config.duration());
        self.next_nudge = if phase == PhaseId::Sharing && self.nudges.is_armed() {
            Some(at + self.nudges.interval)
        } else {
            None
        };
        emissions.push(Emission::PhaseEntered {
            phase,
            prompt: config.system_prompt().to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    fn started(now: Instant) -> (LifecycleState, Emission) {
        LifecycleState::start(PhaseSchedule::reference(), NudgeConfig::reference(), now)
    }

    fn phases(emissions: &[Emission]) -> Vec<PhaseId> {
        emissions
            .iter()
            .filter_map(|e| match e {
                Emission::PhaseEntered { phase, .. } => Some(*phase),
                Emission::Nudge { .. } => None,
            })
            .collect()
    }

    fn nudge_count(emissions: &[Emission]) -> usize {
        emissions
            .iter()
            .filter(|e| matches!(e, Emission::Nudge { .. }))
            .count()
    }

    #[test]
    fn start_enters_arrival_once() {
        let now = Instant::now();
        let (state, emission) = started(now);
        assert_eq!(state.current_phase(), PhaseId::Arrival);
        assert!(matches!(
            emission,
            Emission::PhaseEntered {
                phase: PhaseId::Arrival,
                ..
            }
        ));
        assert_eq!(state.time_remaining(now), Duration::from_secs(30));
    }

    #[test]
    fn full_run_visits_each_phase_once_with_two_nudges() {
        let now = Instant::now();
        let (mut state, _) = started(now);
        let mut random = SequenceRandom::new(vec![0.0]);

        // Run well past the total 240s timeline in one step
        let emissions = state.advance_to(now + Duration::from_secs(600), &mut random);

        assert_eq!(
            phases(&emissions),
            vec![PhaseId::Sharing, PhaseId::Reflection, PhaseId::Close]
        );
        // SHARING spans 30s..150s; nudges at 75s and 120s, the 165s one never fires
        assert_eq!(nudge_count(&emissions), 2);
        assert!(state.is_finished());
        assert_eq!(state.current_phase(), PhaseId::Close);
    }

    #[test]
    fn emissions_fall_in_deadline_order() {
        let now = Instant::now();
        let (mut state, _) = started(now);
        let mut random = SequenceRandom::new(vec![0.0]);
        let emissions = state.advance_to(now + Duration::from_secs(600), &mut random);

        // 30s SHARING, 75s nudge, 120s nudge, 150s REFLECTION, 210s CLOSE
        assert_eq!(emissions.len(), 5);
        assert!(matches!(
            emissions[0],
            Emission::PhaseEntered {
                phase: PhaseId::Sharing,
                ..
            }
        ));
        assert!(matches!(emissions[1], Emission::Nudge { .. }));
        assert!(matches!(emissions[2], Emission::Nudge { .. }));
        assert!(matches!(
            emissions[3],
            Emission::PhaseEntered {
                phase: PhaseId::Reflection,
                ..
            }
        ));
        assert!(matches!(
            emissions[4],
            Emission::PhaseEntered {
                phase: PhaseId::Close,
                ..
            }
        ));
    }

    #[test]
    fn nudge_timer_is_cancelled_the_instant_sharing_ends() {
        // Interval dividing the SHARING duration exactly puts a nudge on the
        // boundary; the phase transition must win the tie
        let schedule = PhaseSchedule::reference();
        let nudges = NudgeConfig {
            interval: Duration::from_secs(40),
            pool: vec!["nudge".to_string()],
        };
        let now = Instant::now();
        let (mut state, _) = LifecycleState::start(schedule, nudges, now);
        let mut random = SequenceRandom::new(vec![0.0]);

        let emissions = state.advance_to(now + Duration::from_secs(600), &mut random);
        // Nudges at 70s, 110s; the 150s one coincides with REFLECTION entry and is dropped
        assert_eq!(nudge_count(&emissions), 2);
    }

    #[test]
    fn no_nudges_outside_sharing() {
        let now = Instant::now();
        let (mut state, _) = started(now);
        let mut random = SequenceRandom::new(vec![0.0]);

        let before_sharing = state.advance_to(now + Duration::from_secs(29), &mut random);
        assert_eq!(nudge_count(&before_sharing), 0);

        // Step through SHARING, then past it
        state.advance_to(now + Duration::from_secs(150), &mut random);
        let after_sharing = state.advance_to(now + Duration::from_secs(209), &mut random);
        assert_eq!(nudge_count(&after_sharing), 0);
    }

    #[test]
    fn incremental_advances_match_one_big_advance() {
        let now = Instant::now();
        let (mut stepped, _) = started(now);
        let (mut jumped, _) = started(now);
        let mut random_a = SequenceRandom::new(vec![0.0]);
        let mut random_b = SequenceRandom::new(vec![0.0]);

        let mut collected = Vec::new();
        for second in 1..=600 {
            collected.extend(stepped.advance_to(now + Duration::from_secs(second), &mut random_a));
        }
        let all = jumped.advance_to(now + Duration::from_secs(600), &mut random_b);
        assert_eq!(collected, all);
    }

    #[test]
    fn finished_state_emits_nothing_more() {
        let now = Instant::now();
        let (mut state, _) = started(now);
        let mut random = SequenceRandom::new(vec![0.0]);
        state.advance_to(now + Duration::from_secs(600), &mut random);
        assert!(state.is_finished());
        assert_eq!(state.next_deadline(), None);
        assert_eq!(state.time_remaining(now + Duration::from_secs(600)), Duration::ZERO);

        let emissions = state.advance_to(now + Duration::from_secs(3600), &mut random);
        assert!(emissions.is_empty());
    }

    #[test]
    fn nudge_selection_uses_injected_randomness() {
        let now = Instant::now();
        let (mut state, _) = started(now);
        // Third pool entry both times
        let mut random = SequenceRandom::new(vec![0.99]);
        let emissions = state.advance_to(now + Duration::from_secs(150), &mut random);
        let nudges: Vec<&str> = emissions
            .iter()
            .filter_map(|e| match e {
                Emission::Nudge { text } => Some(text.as_str()),
                Emission::PhaseEntered { .. } => None,
            })
            .collect();
        assert_eq!(
            nudges,
            vec![
                "Remember to reflect instead of advising.",
                "Remember to reflect instead of advising."
            ]
        );
    }
}
