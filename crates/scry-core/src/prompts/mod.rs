//! Prompt templates for the Spirit Scry guide persona.

pub mod scry_guide;

pub use scry_guide::{
    build_prompt, context_block, depth_description, goal_description, inclination_description,
    Affinity, BALANCED_DEPTH, BALANCED_GOAL, BALANCED_INCLINATION, CONTEXT_TURNS, INCLINATION_THRESHOLD,
};
