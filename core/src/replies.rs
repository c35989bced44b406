//! Fixed bot copy used by the chat surfaces.

use crate::escalation::CheckInResponse;
use crate::mood::Mood;

pub const CRISIS_FOLLOW_UP: &str = "I'm concerned about what you've shared. Would you like me to connect you with professional support resources?";

pub const GENTLE_CHECK_IN: &str = "I noticed you might have been going through a difficult time earlier. How are you feeling now? Remember, I'm here if you need support.";

pub const EMERGENCY_RESOURCES: &str = "Emergency Resources:\n\
Crisis Hotline: 988 (24/7)\n\
Crisis Text Line: Text HOME to 741741\n\
Emergency: Call 911\n\
You are not alone. Help is available 24/7.";

pub const CRISIS_ALERT: &str = "If you're having a hard time, you don't have to face it alone. Call or text 988 any time, day or night.";

pub const MOOD_PROMPT: &str = "How are you feeling right now?";

/// Support options offered after a keyword match.
pub const CRISIS_OPTIONS: &[&str] = &[
    "Crisis Hotline",
    "Chat with Counselor",
    "Text Crisis Line",
    "Emergency Services",
    "Peer Support",
    "Self-Care Tools",
];

const ANXIETY: &str = "I understand that anxiety can feel overwhelming. It's completely normal to feel this way sometimes. Would you like to try a quick breathing exercise together, or would you prefer to talk about what's making you feel anxious?";
const SADNESS: &str = "I hear that you're going through a difficult time, and I want you to know that your feelings are valid. It takes courage to reach out. What's been weighing on your mind lately?";
const GOOD_DAY: &str = "That's wonderful to hear! I'm glad you're having a good day. What made today special for you? Celebrating these positive moments is important for your wellbeing.";
const STRESS: &str = "Feeling stressed or overwhelmed is something many people experience. You're not alone in this. Would you like to explore some stress management techniques, or would you prefer to talk about what's causing these feelings?";
const SUPPORT: &str = "I'm here to support you in whatever way I can. Whether you need someone to listen, want to explore coping strategies, or need resources for professional help, I'm here. What kind of support would be most helpful right now?";
const CALM: &str = "Let's work on finding some calm together. I can guide you through a relaxation exercise, suggest some mindfulness techniques, or we can simply talk about peaceful things. What sounds most appealing to you?";

pub const DEFAULT_REPLIES: &[&str] = &[
    "Thank you for sharing that with me. I'm here to listen and support you. Can you tell me more about how you're feeling?",
    "I appreciate you opening up. Your feelings and experiences matter. What's been the most challenging part of your day?",
    "It sounds like you have a lot going on. I'm here to help you work through whatever you're facing. What would be most helpful to talk about?",
    "I'm glad you reached out. Sometimes just talking can help us process our thoughts and feelings. What's been the most difficult thing you've faced today?",
];

/// Topic rules checked in order; the first rule with a matching cue wins.
const TOPICS: &[(&[&str], &str)] = &[
    (&["anxious", "anxiety"], ANXIETY),
    (&["sad", "depressed", "down"], SADNESS),
    (&["good day", "happy", "great"], GOOD_DAY),
    (&["stress", "overwhelmed"], STRESS),
    (&["help", "support"], SUPPORT),
    (&["relax", "calm"], CALM),
];

/// Pick a supportive reply for `message`. `pick` selects among the default
/// replies when no topic matches; callers pass a random number.
pub fn supportive_reply(message: &str, pick: usize) -> &'static str {
    let lowered = message.to_lowercase();
    TOPICS
        .iter()
        .find(|(cues, _)| cues.iter().any(|cue| lowered.contains(cue)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLIES[pick % DEFAULT_REPLIES.len()])
}

pub fn mood_feedback(mood: Mood) -> &'static str {
    match mood {
        Mood::Excellent => "Great to hear you're feeling excellent! Keep up the positive energy!",
        Mood::Good => "Glad you're having a good day! What's contributing to your positive mood?",
        Mood::Okay => "Thanks for checking in. Is there anything that might help you feel a bit better?",
        Mood::Low => "I understand you're feeling low. Remember, it's okay to have difficult days. Would you like some support?",
        Mood::Struggling => "I'm concerned about you. You're brave for reaching out. Let's find some support together.",
    }
}

pub fn check_in_reply(response: CheckInResponse) -> &'static str {
    match response {
        CheckInResponse::Better => "I'm glad to hear you're feeling better. That takes strength. Is there anything specific that helped?",
        CheckInResponse::Same => "Thank you for letting me know. Sometimes staying steady is an achievement in itself. What would help you feel a bit better right now?",
        CheckInResponse::Worse => "I'm concerned about you. You don't have to go through this alone. Would you like to talk about what's making things harder, or would you prefer some immediate support resources?",
        CheckInResponse::NeedHelp => EMERGENCY_RESOURCES,
    }
}
