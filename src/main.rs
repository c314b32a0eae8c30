// Terminal front end: onboarding questions, then a dashboard readout and chat loop

use serde_json::json;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};

use vitalis_lib::coach::TIP_PLACEHOLDER;
use vitalis_lib::logging;
use vitalis_lib::profile::{DIET_OPTIONS, GOAL_OPTIONS};
use vitalis_lib::{
    ActivityLevel, BiometricFeed, BiometricSnapshot, CoachConfig, CoachContext, CoachError, JitterSource,
    OnboardingDraft, UserProfile,
};

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Commands: /stats, /tip, /water <oz>, /sleep <hours>, /energy <0-100>, /help, /quit";

async fn ask(input: &mut Input, question: &str) -> Result<Option<String>, Box<dyn Error>> {
    println!("{}", question);
    Ok(input.next_line().await?.map(|l| l.trim().to_string()))
}

/// Parse "1,3" style picks against a numbered option list
fn pick_options(answer: &str, options: &[&str]) -> Vec<String> {
    answer
        .split(',')
        .filter_map(|part| part.trim().parse::<usize>().ok())
        .filter_map(|n| n.checked_sub(1).and_then(|i| options.get(i)))
        .map(|s| s.to_string())
        .collect()
}

fn numbered(options: &[&str]) -> String {
    options
        .iter()
        .enumerate()
        .map(|(i, o)| format!("  {}. {}", i + 1, o))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn onboard(input: &mut Input) -> Result<Option<UserProfile>, Box<dyn Error>> {
    println!("Welcome to Vitalis. Your proactive AI health companion.\n");
    let mut draft = OnboardingDraft::new();

    while draft.name.trim().is_empty() {
        match ask(input, "What should we call you?").await? {
            Some(name) => draft.name = name,
            None => return Ok(None),
        }
    }

    if let Some(age) = ask(input, "Age (optional, press enter to skip):").await? {
        draft.age = age.parse().ok();
    }

    while draft.goals.is_empty() {
        let question = format!("What are your primary goals? (e.g. 1,3)\n{}", numbered(GOAL_OPTIONS));
        let Some(answer) = ask(input, &question).await? else {
            return Ok(None);
        };
        for goal in pick_options(&answer, GOAL_OPTIONS) {
            draft.toggle_goal(&goal);
        }
    }

    let question = format!("Any dietary preferences? (optional)\n{}", numbered(DIET_OPTIONS));
    if let Some(answer) = ask(input, &question).await? {
        for diet in pick_options(&answer, DIET_OPTIONS) {
            draft.toggle_diet(&diet);
        }
    }

    let levels: Vec<String> = ActivityLevel::ALL
        .iter()
        .map(|l| format!("{} ({})", l, l.description()))
        .collect();
    let level_refs: Vec<&str> = levels.iter().map(String::as_str).collect();
    let question = format!("How active are you currently? [default 2]\n{}", numbered(&level_refs));
    if let Some(answer) = ask(input, &question).await? {
        if let Some(level) = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| ActivityLevel::ALL.get(i))
            .copied()
            .or_else(|| ActivityLevel::parse(&answer))
        {
            draft.activity_level = level;
        }
    }

    Ok(Some(draft.complete()?))
}

fn profile_header(profile: &UserProfile) -> String {
    let initial = profile.initial().map(|c| c.to_uppercase().to_string()).unwrap_or_default();
    let age = profile.age().map(|a| format!(", {}", a)).unwrap_or_default();
    format!(
        "[{}] {}{} | {} | goals: {}",
        initial,
        profile.name(),
        age,
        profile.activity_level(),
        profile.goals().join(", ")
    )
}

fn print_stats(snapshot: &BiometricSnapshot) {
    println!(
        "ENERGY {}/100 | STEPS {} | SLEEP {}h | WATER {}oz ({}oz behind) | HR {} bpm",
        snapshot.energy_score,
        snapshot.steps,
        snapshot.sleep_hours,
        snapshot.water_intake,
        snapshot.hydration_gap_oz(),
        snapshot.heart_rate
    );
}

async fn chat_loop(input: &mut Input, coach: &CoachContext, feed: &BiometricFeed) -> Result<(), Box<dyn Error>> {
    println!("{}", HELP);

    loop {
        let suggestions = coach.suggested_prompts();
        if !suggestions.is_empty() {
            println!("Try: {}", suggestions.join(" | "));
        }

        let Some(line) = ask(input, "> ").await? else {
            return Ok(());
        };
        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim);

        match (command, arg) {
            ("/quit", _) => return Ok(()),
            ("/help", _) => println!("{}", HELP),
            ("/stats", _) => print_stats(&feed.current()),
            ("/tip", _) => println!("{}", coach.generate_quick_tip(&feed.current()).await),
            ("/water", Some(oz)) => match oz.parse::<f64>() {
                Ok(oz) if oz > 0.0 => {
                    feed.update(|s| s.water_intake += oz);
                    coach.post_system_note(&format!("Logged {} oz of water", oz), json!({ "waterOz": oz }));
                    print_stats(&feed.current());
                }
                _ => println!("Usage: /water <oz>"),
            },
            ("/sleep", Some(hours)) => match hours.parse::<f64>() {
                Ok(hours) if hours >= 0.0 => feed.update(|s| s.sleep_hours = hours),
                _ => println!("Usage: /sleep <hours>"),
            },
            ("/energy", Some(score)) => match score.parse::<u8>() {
                Ok(score) => feed.update(|s| *s = s.with_energy_score(score)),
                _ => println!("Usage: /energy <0-100>"),
            },
            _ if line.is_empty() => {}
            _ => match coach.send_message(&line).await {
                Ok(reply) => println!("\nVITALIS: {}\n", reply),
                Err(CoachError::AwaitingReply) => println!("Still thinking about your last message..."),
                Err(e) => println!("{}", e),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init_console();
    let config = CoachConfig::from_env();
    if let Some(dir) = &config.log_dir {
        logging::init_file_sink(dir)?;
        let _ = logging::cleanup_old_logs(dir);
    }

    let mut input = BufReader::new(stdin()).lines();
    let Some(profile) = onboard(&mut input).await? else {
        return Ok(());
    };

    let coach = Arc::new(CoachContext::from_config(&config)?);
    let mut feed = BiometricFeed::start(BiometricSnapshot::default(), config.tick_interval, JitterSource::from_entropy());

    println!("\nVITALIS // MISSION CONTROL");
    println!("{}", profile_header(&profile));
    if !config.is_configured() {
        println!("Offline mode: set VITALIS_API_KEY or GEMINI_API_KEY to enable coaching.");
    }
    print_stats(&feed.current());
    println!("{}", TIP_PLACEHOLDER);

    let tip_coach = Arc::clone(&coach);
    let snapshot = feed.current();
    let tip = tokio::spawn(async move { tip_coach.generate_quick_tip(&snapshot).await });

    match coach.open_session(&profile, &feed.current()) {
        Ok(_) => {
            if let Some(welcome) = coach.transcript().last() {
                println!("\nVITALIS: {}\n", welcome.text);
            }
        }
        Err(e) => println!("Chat unavailable: {}", e),
    }

    if let Ok(text) = tip.await {
        println!("TIP: {}", text);
    }

    let result = chat_loop(&mut input, &coach, &feed).await;
    feed.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_options_ignores_out_of_range() {
        assert_eq!(pick_options("1, 3,9,x", GOAL_OPTIONS), vec!["Weight Loss", "Energy & Focus"]);
        assert!(pick_options("0", GOAL_OPTIONS).is_empty());
    }

    #[test]
    fn test_profile_header_shows_initial_and_age() {
        let mut draft = OnboardingDraft::new();
        draft.name = "alex".to_string();
        draft.age = Some(34);
        draft.toggle_goal("Longevity");
        let header = profile_header(&draft.clone().complete().unwrap());
        assert_eq!(header, "[A] alex, 34 | moderate | goals: Longevity");

        draft.age = None;
        let header = profile_header(&draft.complete().unwrap());
        assert!(header.starts_with("[A] alex | "));
    }
}
