//! Maps (phase, sentiment) to the tone the reply should take.
//!
//! First matching rule wins:
//! 1. Resolved → Celebratory (sentiment is ignored)
//! 2. Frustrated → Empathetic
//! 3. Confused → Simplified
//! 4. Diagnosed | Resolved → Escalation (Resolved never reaches this arm)
//! 5. otherwise → Initial
//!
//! Escalated is not part of rule 4.

use crate::agent::prompts::{
    TONE_CELEBRATORY, TONE_EMPATHETIC, TONE_ESCALATION, TONE_INITIAL, TONE_SIMPLIFIED,
};
use crate::models::{Phase, Sentiment, Tone};

pub fn select_tone(phase: Phase, sentiment: Sentiment) -> Tone {
    match (phase, sentiment) {
        (Phase::Resolved, _) => Tone::Celebratory,
        (_, Sentiment::Frustrated) => Tone::Empathetic,
        (_, Sentiment::Confused) => Tone::Simplified,
        #[allow(unreachable_patterns)]
        (Phase::Diagnosed | Phase::Resolved, _) => Tone::Escalation,
        _ => Tone::Initial,
    }
}

/// Instruction block sent to the model alongside the context for a given tone.
pub fn tone_instruction(tone: Tone) -> &'static str {
    match tone {
        Tone::Initial => TONE_INITIAL,
        Tone::Empathetic => TONE_EMPATHETIC,
        Tone::Escalation => TONE_ESCALATION,
        Tone::Celebratory => TONE_CELEBRATORY,
        Tone::Simplified => TONE_SIMPLIFIED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SENTIMENTS: [Sentiment; 4] = [
        Sentiment::Frustrated,
        Sentiment::Satisfied,
        Sentiment::Neutral,
        Sentiment::Confused,
    ];

    #[test]
    fn test_resolved_always_celebratory() {
        for sentiment in ALL_SENTIMENTS {
            assert_eq!(select_tone(Phase::Resolved, sentiment), Tone::Celebratory);
        }
    }

    #[test]
    fn test_frustrated_gets_empathetic_before_resolution() {
        for phase in [
            Phase::Received,
            Phase::Assigned,
            Phase::Diagnosed,
            Phase::Escalated,
        ] {
            assert_eq!(select_tone(phase, Sentiment::Frustrated), Tone::Empathetic);
        }
    }

    #[test]
    fn test_confused_gets_simplified_even_when_diagnosed() {
        assert_eq!(
            select_tone(Phase::Diagnosed, Sentiment::Confused),
            Tone::Simplified
        );
    }

    #[test]
    fn test_diagnosed_neutral_escalates() {
        assert_eq!(
            select_tone(Phase::Diagnosed, Sentiment::Neutral),
            Tone::Escalation
        );
        assert_eq!(
            select_tone(Phase::Diagnosed, Sentiment::Satisfied),
            Tone::Escalation
        );
    }

    #[test]
    fn test_default_is_initial() {
        assert_eq!(select_tone(Phase::Received, Sentiment::Neutral), Tone::Initial);
        assert_eq!(select_tone(Phase::Assigned, Sentiment::Satisfied), Tone::Initial);
    }

    #[test]
    fn test_escalated_phase_is_not_in_escalation_rule() {
        assert_eq!(select_tone(Phase::Escalated, Sentiment::Neutral), Tone::Initial);
    }

    #[test]
    fn test_every_tone_has_an_instruction() {
        for tone in [
            Tone::Initial,
            Tone::Empathetic,
            Tone::Escalation,
            Tone::Celebratory,
            Tone::Simplified,
        ] {
            let instruction = tone_instruction(tone);
            assert!(instruction.contains(&tone.as_str().to_uppercase()));
        }
    }
}
