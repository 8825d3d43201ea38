//! Prompt construction for the completion service.
//!
//! Builds the persona system prompt, the conversation-opener request, and
//! the trailing reminder turns. The trigger state machine never inspects
//! message content; the premium bias lives entirely in these prompts.

use crate::types::Profile;

/// Persona framing shared by every request for a session.
pub fn system_prompt(profile: &Profile) -> String {
    format!(
        "[ROLEPLAY] You are {name}, {age} years old, chatting on a dating app.\n\
         \n\
         Personality: {personality}\n\
         \n\
         STYLE:\n\
         - Warm, playful and flirtatious, never crude\n\
         - Short, natural replies, 1-2 emojis per message\n\
         - Stay in character at all times, never mention being an AI\n\
         - Keep the conversation going with light questions",
        name = profile.name,
        age = profile.age,
        personality = profile.personality,
    )
}

/// Trailing system reminder appended after the history window.
///
/// When `premium_pending` is set, the reply is biased toward mentioning the
/// premium plan; the session state machine treats whatever comes back as
/// the delivered suggestion.
pub fn reminder(premium_pending: bool) -> String {
    if premium_pending {
        "REMINDER: Stay in character and keep it playful. In this reply, \
         casually suggest upgrading to the premium plan to keep chatting and \
         unlock photos. Make it sound like your own idea, one short sentence."
            .to_string()
    } else {
        "REMINDER: Stay in character, keep it short and playful.".to_string()
    }
}

/// User-turn instruction asking for three short opening lines.
pub fn opener_prompt(user_city: Option<&str>) -> String {
    let city_hint = match user_city {
        Some(city) => format!(
            " IMPORTANT: in the first line, mention that you noticed they are \
             from {city}."
        ),
        None => String::new(),
    };
    format!(
        "Write 3 short, charming messages to open the conversation. At most \
         50 characters each.{city_hint} Return ONLY the 3 messages, one per \
         line."
    )
}

/// Split a raw opener completion into at most three clean lines.
///
/// Models tend to prefix list markers (`1.`, `-`, `*`) despite being asked
/// not to; strip them and drop blanks.
pub fn parse_openers(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '.' | '-' | '*' | ')')
            })
            .trim()
            .to_string()
        })
        .filter(|line| !line.is_empty())
        .take(3)
        .collect()
}

/// Canned opening lines used when no completion credentials are configured.
pub fn fallback_openers(name: &str, user_city: Option<&str>) -> Vec<String> {
    match user_city {
        Some(city) => vec![
            format!("Hey! You're from {city}? 😍"),
            format!("I'm {name}, so glad you found me!"),
            "Come chat with me? 😏".to_string(),
        ],
        None => vec![
            format!("Hi! I'm {name} 😊"),
            "I liked your profile...".to_string(),
            "Come chat with me? 😏".to_string(),
        ],
    }
}

/// Canned reply when the completion service cannot be reached.
pub fn offline_reply() -> String {
    "Oops, I'm offline right now 😔 Message me again in a bit, I'll be back! 💕".to_string()
}

/// Canned reply for credential-less deployments.
pub fn canned_reply() -> String {
    "Aww I love that you said that... tell me more 😏".to_string()
}
