//! Local chat loop: the full detector, policy, and idle-tick cadence running
//! in-process against stdin, without the API.

use std::time::Duration;

use chrono::Utc;
use dost_core::replies::{
    self, CRISIS_ALERT, CRISIS_FOLLOW_UP, CRISIS_OPTIONS, DEFAULT_REPLIES, EMERGENCY_RESOURCES,
    GENTLE_CHECK_IN, MOOD_PROMPT,
};
use dost_core::{
    CheckInResponse, EscalationAction, EscalationConfig, Mood, RiskSession, TracingEventSink,
};
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Message(String),
    Mood(Result<Mood, String>),
    CheckIn(Result<CheckInResponse, String>),
    Dismiss,
    Help,
    Quit,
    Blank,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line.to_string());
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(n, a)| (n, a.trim()))
        .unwrap_or((command, ""));

    match name {
        "mood" => Input::Mood(arg.parse().map_err(|e: dost_core::error::CoreError| e.to_string())),
        "checkin" | "check-in" => {
            Input::CheckIn(arg.parse().map_err(|e: dost_core::error::CoreError| e.to_string()))
        }
        "dismiss" => Input::Dismiss,
        "quit" | "exit" => Input::Quit,
        "help" => Input::Help,
        _ => Input::Message(line.to_string()),
    }
}

fn say(text: &str) {
    for line in text.lines() {
        println!("dost> {line}");
    }
}

fn print_help() {
    println!("Type a message, or one of:");
    println!("  /mood <excellent|good|okay|low|struggling>");
    println!("  /checkin <better|same|worse|need_help>");
    println!("  /dismiss   close the crisis alert");
    println!("  /quit");
}

/// Pending UI deadlines: the support modal opening and the alert hiding.
#[derive(Debug, Default)]
struct Timers {
    open_modal: Option<Instant>,
    hide_alert: Option<Instant>,
}

impl Timers {
    fn schedule(&mut self, action: EscalationAction, config: &EscalationConfig, now: Instant) {
        if action.shows_alert() {
            self.hide_alert = Some(now + config.alert_auto_hide);
        }
        if let Some(delay) = action.auto_open_delay() {
            self.open_modal = Some(now + delay);
        }
    }

    /// A dismissed alert stops its hide timer; a scheduled modal still opens.
    fn alert_dismissed(&mut self) {
        self.hide_alert = None;
    }
}

fn render(action: EscalationAction, config: &EscalationConfig, timers: &mut Timers) {
    match action {
        EscalationAction::None => {}
        EscalationAction::ShowAlert | EscalationAction::ShowAlertAndAutoOpen { .. } => {
            println!("[alert] {CRISIS_ALERT}");
        }
        EscalationAction::GentleCheckIn => {
            say(GENTLE_CHECK_IN);
            println!("       (answer with /checkin better|same|worse|need_help)");
        }
    }
    timers.schedule(action, config, Instant::now());
}

pub async fn run(typing_delay: bool) -> i32 {
    let config = EscalationConfig::from_env();
    let sink = TracingEventSink;
    let mut session = RiskSession::new(Uuid::now_v7(), &config, Utc::now());
    tracing::debug!(session_id = %session.id(), "Local chat session started");

    let mut ticks = time::interval(config.idle_tick_interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticks.tick().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut timers = Timers::default();

    say("Hi! I'm Dost, your wellness friend. What's on your mind right now?");
    say(MOOD_PROMPT);
    print_help();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        eprintln!("Failed to read stdin: {e}");
                        return 1;
                    }
                };

                match parse_input(&line) {
                    Input::Blank => {}
                    Input::Quit => break,
                    Input::Help => print_help(),
                    Input::Dismiss => {
                        session.dismiss_alert(Utc::now(), &sink);
                        timers.alert_dismissed();
                        say("Okay, I've closed that. I'm still here whenever you need me.");
                    }
                    Input::Mood(Err(e)) | Input::CheckIn(Err(e)) => println!("{e}"),
                    Input::Mood(Ok(mood)) => {
                        let action = session.select_mood(mood, Utc::now(), &sink);
                        say(replies::mood_feedback(mood));
                        render(action, &config, &mut timers);
                    }
                    Input::CheckIn(Ok(response)) => {
                        let action = session.respond_to_check_in(response, Utc::now(), &sink);
                        say(replies::check_in_reply(response));
                        if response == CheckInResponse::Worse {
                            time::sleep(config.check_in_alert_delay).await;
                        }
                        render(action, &config, &mut timers);
                    }
                    Input::Message(message) => {
                        if message.chars().count() > dost_core::config::MAX_MESSAGE_CHARS {
                            println!(
                                "Messages are limited to {} characters.",
                                dost_core::config::MAX_MESSAGE_CHARS
                            );
                            continue;
                        }

                        let outcome = session.process_message(&message, Utc::now(), &sink);
                        let (pick, jitter) = {
                            let mut rng = rand::thread_rng();
                            (rng.gen_range(0..DEFAULT_REPLIES.len()), rng.gen_range(1_000..3_000))
                        };
                        if typing_delay {
                            time::sleep(Duration::from_millis(jitter)).await;
                        }
                        say(replies::supportive_reply(&message, pick));

                        if outcome.detection.has_matches() {
                            if typing_delay {
                                time::sleep(config.crisis_follow_up_delay).await;
                            }
                            say(CRISIS_FOLLOW_UP);
                            println!("       options: {}", CRISIS_OPTIONS.join(" | "));
                        }
                        render(outcome.action, &config, &mut timers);
                    }
                }
            }
            _ = time::sleep_until(timers.open_modal.unwrap_or_else(Instant::now)),
                if timers.open_modal.is_some() =>
            {
                timers.open_modal = None;
                session.open_modal(Utc::now(), &sink);
                println!("[support]");
                say(EMERGENCY_RESOURCES);
            }
            _ = time::sleep_until(timers.hide_alert.unwrap_or_else(Instant::now)),
                if timers.hide_alert.is_some() =>
            {
                timers.hide_alert = None;
                println!("[alert hidden]");
            }
            _ = ticks.tick() => {
                session.idle_tick(Utc::now(), &sink);
                if session.take_pending_check_in() {
                    render(EscalationAction::GentleCheckIn, &config, &mut timers);
                }
            }
        }
    }

    say("Take care of yourself. I'm here whenever you want to talk.");
    0
}
