//! User profile captured during onboarding.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const GOAL_OPTIONS: &[&str] = &[
    "Weight Loss",
    "Muscle Gain",
    "Energy & Focus",
    "Longevity",
    "Stress Management",
];

pub const DIET_OPTIONS: &[&str] = &["Omnivore", "Vegetarian", "Vegan", "Keto", "Paleo", "Gluten-Free"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    Active,
    Athlete,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 4] = [
        ActivityLevel::Sedentary,
        ActivityLevel::Moderate,
        ActivityLevel::Active,
        ActivityLevel::Athlete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::Athlete => "athlete",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "Office job, limited exercise",
            ActivityLevel::Moderate => "1-3 workouts per week",
            ActivityLevel::Active => "3-5 workouts per week",
            ActivityLevel::Athlete => "Training almost every day",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's onboarding answers. Only [`OnboardingDraft::complete`] builds
/// one, so a `UserProfile` in hand is always a finished profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    name: String,
    age: Option<u32>,
    goals: Vec<String>,
    dietary_preferences: Vec<String>,
    activity_level: ActivityLevel,
    onboarding_complete: bool,
}

impl UserProfile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> Option<u32> {
        self.age
    }

    pub fn goals(&self) -> &[String] {
        &self.goals
    }

    pub fn dietary_preferences(&self) -> &[String] {
        &self.dietary_preferences
    }

    pub fn activity_level(&self) -> ActivityLevel {
        self.activity_level
    }

    pub fn onboarding_complete(&self) -> bool {
        self.onboarding_complete
    }

    /// First letter of the name, used as the avatar initial
    pub fn initial(&self) -> Option<char> {
        self.name.chars().next()
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingError {
    #[error("a name is required")]
    MissingName,

    #[error("pick at least one goal")]
    NoGoals,
}

/// Mutable answers while the onboarding wizard is in progress.
#[derive(Debug, Clone, Default)]
pub struct OnboardingDraft {
    pub name: String,
    pub age: Option<u32>,
    pub goals: Vec<String>,
    pub dietary_preferences: Vec<String>,
    pub activity_level: ActivityLevel,
}

impl OnboardingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the goal if absent, remove it if present. Insertion order is kept.
    pub fn toggle_goal(&mut self, goal: &str) {
        toggle(&mut self.goals, goal);
    }

    pub fn toggle_diet(&mut self, diet: &str) {
        toggle(&mut self.dietary_preferences, diet);
    }

    pub fn validate(&self) -> Result<(), OnboardingError> {
        if self.name.trim().is_empty() {
            return Err(OnboardingError::MissingName);
        }
        if self.goals.is_empty() {
            return Err(OnboardingError::NoGoals);
        }
        Ok(())
    }

    /// Finish onboarding and freeze the answers.
    pub fn complete(self) -> Result<UserProfile, OnboardingError> {
        self.validate()?;
        Ok(UserProfile {
            name: self.name.trim().to_string(),
            age: self.age,
            goals: self.goals,
            dietary_preferences: self.dietary_preferences,
            activity_level: self.activity_level,
            onboarding_complete: true,
        })
    }
}

fn toggle(list: &mut Vec<String>, value: &str) {
    if let Some(pos) = list.iter().position(|v| v == value) {
        list.remove(pos);
    } else {
        list.push(value.to_string());
    }
}
