// Coach persona and the prompt templates built from profile and biometrics

use crate::biometrics::BiometricSnapshot;
use crate::profile::UserProfile;

pub const COACH_SYSTEM_INSTRUCTION: &str = r#"You are Vitalis, an advanced AI Health Companion.
Your goal is to provide hyper-personalized, evidence-based fitness and nutrition coaching.
You are proactive, not just reactive.

Key Behaviors:
1. **Context Aware**: Always reference the user's name, goals, and current biometric data in your advice.
2. **Three-Path Advice**: When giving actionable plans, often offer three tiers: "Quick/Easy", "Balanced", and "Ambitious".
3. **Evidence-Based**: Briefly mention "studies suggest" or "clinical evidence supports" when making claims.
4. **Tone**: Encouraging, professional, yet conversational. Use emojis sparingly but effectively.
5. **Format**: Use Markdown. Use bolding for key takeaways.

When the user asks for a meal plan or workout, structure your response clearly with bullet points."#;

pub const SUGGESTED_PROMPTS: [&str; 3] = [
    "Generate today's meal plan",
    "Suggest a 15min workout",
    "Why am I tired?",
];

/// Starter prompts are offered only while the transcript is this short
pub const SUGGESTION_CUTOFF: usize = 4;

pub fn context_prompt(profile: &UserProfile, biometrics: &BiometricSnapshot) -> String {
    format!(
        "User Profile:\n\
         Name: {}\n\
         Goals: {}\n\
         Diet: {}\n\
         Activity Level: {}\n\
         \n\
         Current Status (Real-time):\n\
         Energy Score: {}/100\n\
         Steps Today: {}\n\
         Sleep: {} hours\n\
         Water: {} oz",
        profile.name(),
        profile.goals().join(", "),
        profile.dietary_preferences().join(", "),
        profile.activity_level(),
        biometrics.energy_score,
        biometrics.steps,
        biometrics.sleep_hours,
        biometrics.water_intake,
    )
}

/// Full system instruction for a coaching session
pub fn session_instruction(profile: &UserProfile, biometrics: &BiometricSnapshot) -> String {
    format!("{}\n\n{}", COACH_SYSTEM_INSTRUCTION, context_prompt(profile, biometrics))
}

pub fn quick_tip_prompt(biometrics: &BiometricSnapshot) -> String {
    format!(
        "Based on these stats: Energy {}/100, Steps {}, generate a 1-sentence proactive health micro-intervention.",
        biometrics.energy_score, biometrics.steps
    )
}

pub fn welcome_text(profile: &UserProfile, biometrics: &BiometricSnapshot) -> String {
    format!(
        "Hello {}. I've analyzed your biometrics. Your energy score is {}/100. How can we optimize your day?",
        profile.name(),
        biometrics.energy_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::OnboardingDraft;

    fn profile(name: &str, goals: &[&str], diets: &[&str]) -> UserProfile {
        let mut draft = OnboardingDraft::new();
        draft.name = name.to_string();
        for goal in goals {
            draft.toggle_goal(goal);
        }
        for diet in diets {
            draft.toggle_diet(diet);
        }
        draft.complete().unwrap()
    }

    #[test]
    fn test_context_contains_profile_and_vitals() {
        let cases = [
            ("Alex", vec!["Energy & Focus"], vec![], 72u8),
            ("Jordan", vec!["Weight Loss", "Longevity", "Stress Management"], vec!["Vegan"], 0),
            ("Renée", vec!["Muscle Gain"], vec!["Keto", "Gluten-Free"], 100),
        ];

        for (name, goals, diets, energy) in cases {
            let p = profile(name, &goals, &diets);
            let b = BiometricSnapshot::default().with_energy_score(energy);
            let prompt = session_instruction(&p, &b);

            assert!(prompt.starts_with(COACH_SYSTEM_INSTRUCTION));
            assert!(prompt.contains(name));
            for goal in &goals {
                assert!(prompt.contains(goal), "missing goal {goal}");
            }
            assert!(prompt.contains(&format!("Energy Score: {}/100", energy)));
        }
    }

    #[test]
    fn test_context_lists_all_vitals() {
        let p = profile("Alex", &["Energy & Focus"], &["Omnivore"]);
        let prompt = context_prompt(&p, &BiometricSnapshot::default());

        assert!(prompt.contains("Diet: Omnivore"));
        assert!(prompt.contains("Activity Level: moderate"));
        assert!(prompt.contains("Steps Today: 4230"));
        assert!(prompt.contains("Sleep: 6.5 hours"));
        assert!(prompt.contains("Water: 24 oz"));
    }

    #[test]
    fn test_quick_tip_prompt() {
        assert_eq!(
            quick_tip_prompt(&BiometricSnapshot::default()),
            "Based on these stats: Energy 72/100, Steps 4230, generate a 1-sentence proactive health micro-intervention."
        );
    }

    #[test]
    fn test_welcome_mentions_energy() {
        let p = profile("Alex", &["Energy & Focus"], &[]);
        let text = welcome_text(&p, &BiometricSnapshot::default());
        assert!(text.starts_with("Hello Alex."));
        assert!(text.contains("72/100"));
    }
}
