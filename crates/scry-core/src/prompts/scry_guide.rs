//! Spirit Scry guide prompt: turns a profile and a question into the text sent to the model.
//!
//! Everything here is a fixed lookup or template; the same profile and question always
//! produce the same prompt. Question and history text are inserted verbatim.

use crate::profile::{Exchange, Profile};

/// Fallback when `depth` is outside 1–5.
pub const BALANCED_DEPTH: &str = "balanced explanations";
/// Fallback when `goal` is not a known goal.
pub const BALANCED_GOAL: &str = "balanced guidance";
/// Used when no affinity reaches [`INCLINATION_THRESHOLD`].
pub const BALANCED_INCLINATION: &str = "balanced perspective";
/// An affinity at or above this score contributes its descriptor.
pub const INCLINATION_THRESHOLD: i64 = 4;
/// Exchanges replayed as conversation context.
pub const CONTEXT_TURNS: usize = 3;

/// Register of the response for a depth level.
pub fn depth_description(depth: i64) -> &'static str {
    match depth {
        1 => "simple analogies and practical wisdom",
        2 => "balanced explanations with some depth",
        3 => "detailed philosophical exploration",
        4 => "advanced metaphysical concepts with academic rigor",
        5 => "profound, transcendent wisdom from multiple traditions",
        _ => BALANCED_DEPTH,
    }
}

/// Focus of the response for a stored goal name. Only the exact lowercase names match.
pub fn goal_description(goal: &str) -> &'static str {
    match goal {
        "understanding" => "focus on clear explanations and intellectual insight",
        "practice" => "provide practical exercises and daily applications",
        "inspiration" => "offer poetic and uplifting perspectives",
        "counsel" => "give compassionate guidance and support",
        _ => BALANCED_GOAL,
    }
}

/// One of the three affinity axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Scientific,
    Mystical,
    Philosophical,
}

impl Affinity {
    /// Evaluation order; also the order descriptors appear in the prompt.
    pub const ALL: [Affinity; 3] = [Affinity::Scientific, Affinity::Mystical, Affinity::Philosophical];

    pub fn descriptor(&self) -> &'static str {
        match self {
            Affinity::Scientific => "strong scientific/rational perspective",
            Affinity::Mystical => "strong mystical/esoteric perspective",
            Affinity::Philosophical => "strong philosophical/theoretical perspective",
        }
    }

    pub fn score(&self, profile: &Profile) -> i64 {
        match self {
            Affinity::Scientific => profile.scientific,
            Affinity::Mystical => profile.mystical,
            Affinity::Philosophical => profile.philosophical,
        }
    }
}

pub fn inclination_description(profile: &Profile) -> String {
    let strong: Vec<&str> = Affinity::ALL
        .iter()
        .filter(|a| a.score(profile) >= INCLINATION_THRESHOLD)
        .map(Affinity::descriptor)
        .collect();
    if strong.is_empty() {
        BALANCED_INCLINATION.to_string()
    } else {
        strong.join(" and ")
    }
}

/// "Recent conversation context" block for the given exchanges; empty when there are none.
pub fn context_block(recent: &[Exchange]) -> String {
    if recent.is_empty() {
        return String::new();
    }
    let mut block = String::from("Recent conversation context:\n");
    for exchange in recent {
        block.push_str(&format!("User: {}\nGuide: {}\n\n", exchange.question, exchange.answer));
    }
    block
}

pub fn build_prompt(profile: &Profile, question: &str) -> String {
    let inclination = inclination_description(profile);
    let depth = depth_description(profile.depth);
    let goal = goal_description(&profile.goal);
    let context = context_block(profile.recent_exchanges(CONTEXT_TURNS));

    format!(
        "You are Spirit Scry, an adaptive spiritual guide. The user has a {inclination}. \n\
         The response should use {depth} and {goal}.\n\
         \n\
         {context}\n\
         Current question: {question}\n\
         \n\
         Provide a response that meets the user where they are spiritually, \
         using appropriate language and concepts for their profile."
    )
}
