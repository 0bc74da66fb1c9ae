//! counterpoint/bach-counterpoint/src/melodic.rs
//! Melodic quality scoring for candidate ranking.

use bach_time::Tick;

/// A phrase-level pitch target with an approach bonus.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseGoal {
    /// Target pitch; 0 disables the bonus.
    pub target_pitch: u8,
    /// Target tick; 0 disables the bonus.
    pub target_tick: Tick,
    /// Maximum bonus added when the candidate is at the goal.
    pub bonus: f32,
}

/// Recent pitch history of one voice, for scoring candidate pitches when
/// the coordinator has alternatives to choose from.
///
/// All fields default to "unknown" so an empty context scores neutrally.
#[derive(Debug, Clone, Copy, Default)]
pub struct MelodicContext {
    /// Last pitches, most recent first; 0 = unknown.
    pub prev_pitches: [u8; 3],
    /// How many of `prev_pitches` are valid (0-3).
    pub prev_count: u8,
    /// -1 descending, 0 unknown, +1 ascending.
    pub prev_direction: i8,
    /// Whether the previous pitch is the key's leading tone.
    pub is_leading_tone: bool,
}

/// Bonus for approaching a phrase goal: pitch proximity (inverse linear
/// within an octave) times a temporal ramp toward the target tick.
#[must_use]
pub fn goal_approach_bonus(pitch: u8, tick: Tick, goal: &PhraseGoal) -> f32 {
    if goal.target_pitch == 0 || goal.target_tick == 0 {
        return 0.0;
    }
    let distance = i32::from(pitch.abs_diff(goal.target_pitch));
    const MAX_DISTANCE: i32 = 12;
    if distance >= MAX_DISTANCE {
        return 0.0;
    }
    let pitch_factor = 1.0 - distance as f32 / MAX_DISTANCE as f32;
    let temporal_factor =
        if tick >= goal.target_tick { 1.0 } else { tick as f32 / goal.target_tick as f32 };
    goal.bonus * pitch_factor * temporal_factor
}

impl MelodicContext {
    /// Build a context from a voice's recent pitches (most recent first).
    #[must_use]
    pub fn from_recent(recent: &[u8], is_leading_tone: bool) -> Self {
        let mut ctx = Self { is_leading_tone, ..Self::default() };
        for (slot, &pitch) in ctx.prev_pitches.iter_mut().zip(recent.iter()) {
            *slot = pitch;
        }
        ctx.prev_count = recent.len().min(3) as u8;
        if ctx.prev_count >= 2 {
            let diff = i32::from(ctx.prev_pitches[0]) - i32::from(ctx.prev_pitches[1]);
            ctx.prev_direction = diff.signum() as i8;
        }
        ctx
    }

    /// Score a candidate pitch's voice leading in `[0, 1]`.
    ///
    /// Additive rules from the base 0.5: +0.3 step after a leap in the
    /// opposite direction, +0.2 stepwise motion, +0.1 imperfect-consonance
    /// interval, -0.2 third consecutive repeated pitch, -0.3 tritone leap,
    /// -0.5 unresolved leading tone (+0.1 for the correct resolution), and
    /// an optional phrase-goal approach bonus.
    #[must_use]
    pub fn score(&self, candidate: u8, goal: Option<&PhraseGoal>, tick: Tick) -> f32 {
        if self.prev_count == 0 {
            let mut base = 0.5;
            if let Some(goal) = goal {
                base += goal_approach_bonus(candidate, tick, goal);
            }
            return base.clamp(0.0, 1.0);
        }

        let mut score = 0.5f32;
        let prev = self.prev_pitches[0];
        let interval = i32::from(candidate.abs_diff(prev));
        let directed = i32::from(candidate) - i32::from(prev);
        let direction = directed.signum();

        // Step after leap in the opposite direction.
        if self.prev_count >= 2 && self.prev_direction != 0 {
            let prev_interval = i32::from(prev.abs_diff(self.prev_pitches[1]));
            if prev_interval >= 4
                && (1..=2).contains(&interval)
                && direction != 0
                && direction != i32::from(self.prev_direction)
            {
                score += 0.3;
            }
        }

        if (1..=2).contains(&interval) {
            score += 0.2;
        }

        let reduced = interval % 12;
        if matches!(reduced, 3 | 4 | 8 | 9) {
            score += 0.1;
        }

        if interval == 0 && self.prev_count >= 2 && self.prev_pitches[0] == self.prev_pitches[1] {
            score -= 0.2;
        }

        if reduced == 6 {
            score -= 0.3;
        }

        if self.is_leading_tone {
            if directed == 1 {
                score += 0.1;
            } else if interval != 1 {
                score -= 0.5;
            }
        }

        if let Some(goal) = goal {
            score += goal_approach_bonus(candidate, tick, goal);
        }

        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_is_neutral() {
        let ctx = MelodicContext::default();
        assert_eq!(ctx.score(60, None, 0), 0.5);
    }

    #[test]
    fn leap_recovery_is_rewarded() {
        // 60 → 67 (leap up), candidate 65 (step down): recovery.
        let ctx = MelodicContext::from_recent(&[67, 60], false);
        let recovery = ctx.score(65, None, 0);
        let continuation = ctx.score(72, None, 0);
        assert!(recovery > continuation);
        assert!(recovery >= 0.9); // 0.5 + 0.3 + 0.2 before clamping
    }

    #[test]
    fn repeated_pitch_is_penalized_on_the_third_hit() {
        let ctx = MelodicContext::from_recent(&[60, 60], false);
        assert!(ctx.score(60, None, 0) < 0.5);
    }

    #[test]
    fn tritone_leap_is_penalized() {
        let ctx = MelodicContext::from_recent(&[60], false);
        assert!(ctx.score(66, None, 0) < ctx.score(64, None, 0));
    }

    #[test]
    fn leading_tone_wants_its_semitone_up() {
        let ctx = MelodicContext::from_recent(&[71], true);
        let resolved = ctx.score(72, None, 0);
        let abandoned = ctx.score(67, None, 0);
        assert!(resolved > abandoned);
        assert!(abandoned < 0.3);
    }

    #[test]
    fn goal_bonus_ramps_with_time_and_proximity() {
        let goal = PhraseGoal { target_pitch: 72, target_tick: 960, bonus: 0.3 };
        let far = goal_approach_bonus(72, 0, &goal);
        let near = goal_approach_bonus(72, 960, &goal);
        assert!(far < near);
        assert!((near - 0.3).abs() < 1e-6);
        assert_eq!(goal_approach_bonus(90, 960, &goal), 0.0);
    }
}
