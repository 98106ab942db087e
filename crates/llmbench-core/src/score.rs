use crate::model::{EvalMethod, JsonMap, SuccessState};

/// Scores validated outputs against an example's expectations. `human`
/// always defers to a later rating; `equality` requires every expected key
/// to be strictly equal in the validated outputs (no type coercion). Keys
/// present only in the validated outputs are ignored.
pub fn score(method: EvalMethod, expected: &JsonMap, validated: &JsonMap) -> SuccessState {
    match method {
        EvalMethod::Human => SuccessState::PendingHumanReview,
        EvalMethod::Equality => {
            for (key, want) in expected {
                match validated.get(key) {
                    Some(got) if got == want => {}
                    _ => return SuccessState::Fail,
                }
            }
            SuccessState::Pass
        }
    }
}
