use anyhow::{Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tripmate_agent::runtime::AssistantRuntime;
use tripmate_agent::session::{ConversationSession, QuizAnswer, RelaxAction, TurnOutcome};
use tripmate_core::config::{AppConfig, LoadOptions};
use tripmate_core::domain::message::{ChatMessage, Role};
use tripmate_core::domain::params::{BookingParameters, ParamKey};
use tripmate_core::domain::quiz::QuizStep;
use tripmate_core::domain::suggestion::Suggestion;
use tripmate_core::errors::ApplicationError;
use tripmate_core::flows::DialogueMode;
use tripmate_core::labels::{
    amenity_emoji, city_emoji, establishment_type_emoji, format_vnd, humanize_value,
    option_label, parameter_label, relevance_label,
};

use super::bookings::build_runtime;
use super::{block_on, CommandResult, EXIT_CONFIG, EXIT_REMOTE};

const HELP: &str = "Lệnh: /say <câu>, /skip, /more, /relax budget|amenities|date, /book <số>, \
/search <câu>, /mode quiz|agent, /params, /reset, /quit";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatInput {
    Quit,
    Help,
    Reset,
    Params,
    Mode(DialogueMode),
    /// Free text forwarded as a new utterance.
    Say(String),
    Answer(QuizAnswer),
    SkipAmenities,
    More,
    Relax(RelaxAction),
    /// Zero-based suggestion position.
    Book(usize),
    Search(String),
    Invalid(String),
}

/// Reads one line of user input. With a question open, plain input answers
/// it; otherwise it starts a new utterance. Blank lines yield `None`.
pub fn interpret_input(line: &str, quiz: Option<&QuizStep>) -> Option<ChatInput> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some(command) = line.strip_prefix('/') {
        let (name, rest) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
        let rest = rest.trim();
        return Some(match name.to_ascii_lowercase().as_str() {
            "quit" | "exit" => ChatInput::Quit,
            "help" => ChatInput::Help,
            "reset" => ChatInput::Reset,
            "params" => ChatInput::Params,
            "skip" => ChatInput::SkipAmenities,
            "more" => ChatInput::More,
            "mode" => match rest.parse::<DialogueMode>() {
                Ok(mode) => ChatInput::Mode(mode),
                Err(error) => ChatInput::Invalid(error),
            },
            "relax" => match rest.parse::<RelaxAction>() {
                Ok(action) => ChatInput::Relax(action),
                Err(error) => ChatInput::Invalid(error),
            },
            "book" => match rest.parse::<usize>() {
                Ok(position) if position > 0 => ChatInput::Book(position - 1),
                _ => ChatInput::Invalid("usage: /book <số thứ tự gợi ý>".to_string()),
            },
            "say" if !rest.is_empty() => ChatInput::Say(rest.to_string()),
            "search" if !rest.is_empty() => ChatInput::Search(rest.to_string()),
            other => ChatInput::Invalid(format!("unknown command `/{other}`")),
        });
    }

    let Some(step) = quiz.filter(|step| step.key().is_some()) else {
        return Some(ChatInput::Say(line.to_string()));
    };

    if step.has_image_options() {
        return Some(match parse_positions(line, step.image_options.len()) {
            Some(positions) => ChatInput::Answer(QuizAnswer::Images(positions)),
            None => ChatInput::Invalid("chọn số thứ tự ảnh, ví dụ: 1,3".to_string()),
        });
    }

    if step.key() == Some(&ParamKey::AmenitiesPriority) {
        let selected = line
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| pick_option(item, &step.options).unwrap_or_else(|| item.to_string()))
            .collect();
        return Some(ChatInput::Answer(QuizAnswer::Amenities(selected)));
    }

    Some(ChatInput::Answer(match pick_option(line, &step.options) {
        Some(option) => QuizAnswer::Choice(option),
        None => QuizAnswer::Custom(line.to_string()),
    }))
}

/// A 1-based position or a case-insensitive exact match among `options`.
fn pick_option(input: &str, options: &[String]) -> Option<String> {
    if let Ok(position) = input.parse::<usize>() {
        if position >= 1 && position <= options.len() {
            return Some(options[position - 1].clone());
        }
    }
    options.iter().find(|option| option.eq_ignore_ascii_case(input)).cloned()
}

/// Comma-separated 1-based positions, converted to zero-based and deduplicated.
fn parse_positions(input: &str, len: usize) -> Option<Vec<usize>> {
    let mut positions = Vec::new();
    for raw in input.split(',').map(str::trim).filter(|raw| !raw.is_empty()) {
        let position = raw.parse::<usize>().ok().filter(|n| *n >= 1 && *n <= len)?;
        if !positions.contains(&(position - 1)) {
            positions.push(position - 1);
        }
    }
    (!positions.is_empty()).then_some(positions)
}

pub fn render_message(message: &ChatMessage) -> String {
    match message.role {
        Role::Assistant => format!("tripmate> {}", message.text),
        Role::User => format!("bạn> {}", message.text),
    }
}

/// Lines shown under a question. Amenity questions list what is already
/// selected, since answers add to that list.
pub fn render_step(step: &QuizStep, params: &BookingParameters) -> Vec<String> {
    let Some(key) = step.key() else {
        return Vec::new();
    };
    let selected =
        if *key == ParamKey::AmenitiesPriority { params.amenities() } else { Vec::new() };

    if step.has_image_options() {
        let mut lines: Vec<String> = step
            .image_options
            .iter()
            .enumerate()
            .map(|(index, image)| format!("  {}. {} ({})", index + 1, image.label, image.image_url))
            .collect();
        lines.push("  (có thể chọn nhiều ảnh, ví dụ: 1,3)".to_string());
        return lines;
    }

    let mut lines = Vec::new();
    if !selected.is_empty() {
        lines.push(format!("  Đã chọn: {}", selected.join(", ")));
    }
    lines.extend(step.options.iter().enumerate().map(|(index, option)| {
        if *key == ParamKey::AmenitiesPriority {
            let mark = if selected.contains(option) { " ✓" } else { "" };
            format!("  {}. {} {}{mark}", index + 1, amenity_emoji(option), option)
        } else {
            format!("  {}. {}", index + 1, option_label(key, option))
        }
    }));

    if *key == ParamKey::AmenitiesPriority {
        lines.push("  (nhập nhiều lựa chọn cách nhau bởi dấu phẩy, hoặc /skip)".to_string());
    } else if step.options.is_empty() {
        lines.push(format!("  (nhập {})", parameter_label(key).to_lowercase()));
    }
    lines
}

pub fn render_suggestions(suggestions: &[Suggestion]) -> Vec<String> {
    suggestions
        .iter()
        .enumerate()
        .map(|(index, suggestion)| {
            let kind = suggestion.item_type.as_deref().unwrap_or("HOTEL");
            let city = suggestion.city.as_deref().unwrap_or("N/A");
            let name = if suggestion.establishment_name.is_empty() {
                suggestion.establishment_id.as_str()
            } else {
                suggestion.establishment_name.as_str()
            };
            let mut line = format!(
                "  {}. {} {} | {} {} | {} | còn {} chỗ",
                index + 1,
                establishment_type_emoji(kind),
                name,
                city_emoji(city),
                city,
                format_vnd(suggestion.final_price),
                suggestion.units_available,
            );
            if let Some(score) = suggestion.relevance_score {
                line.push_str(&format!(" | {}", relevance_label(score)));
            }
            line
        })
        .collect()
}

pub fn run(options: LoadOptions) -> CommandResult {
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };
    let runtime = match build_runtime(&config) {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure("chat", "client_setup", message, EXIT_CONFIG),
    };

    let mut session = ConversationSession::new(config.assistant.mode);
    match block_on(chat_loop(&runtime, &mut session)) {
        Ok(Ok(())) => CommandResult::success(
            "chat",
            format!("session {} ended after {} messages", session.id(), session.transcript().len()),
        ),
        Ok(Err(error)) => CommandResult::failure("chat", "io", format!("{error:#}"), EXIT_REMOTE),
        Err(message) => CommandResult::failure("chat", "runtime", message, EXIT_REMOTE),
    }
}

async fn chat_loop(runtime: &AssistantRuntime, session: &mut ConversationSession) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut seen = 0;
    seen = flush_transcript(session, seen);
    println!("{HELP}");

    while let Some(line) = lines.next_line().await.context("failed to read from stdin")? {
        let Some(input) = interpret_input(&line, session.quiz()) else {
            continue;
        };
        debug!(event_name = "chat.input", session_id = %session.id(), input = ?input, "chat input");

        let result = match input {
            ChatInput::Quit => break,
            ChatInput::Help => {
                println!("{HELP}");
                continue;
            }
            ChatInput::Invalid(message) => {
                println!("{message}");
                continue;
            }
            ChatInput::Params => {
                for (key, value) in session.params().iter() {
                    let value = humanize_value(key, &value.to_string());
                    println!("  {}: {value}", parameter_label(key));
                }
                continue;
            }
            ChatInput::Mode(mode) => {
                session.set_mode(mode);
                println!("chế độ: {mode}");
                continue;
            }
            ChatInput::Reset => {
                session.reset();
                continue;
            }
            ChatInput::Search(query) => {
                match runtime.agent_search(session, &query).await {
                    Ok(results) => {
                        render_suggestions(&results).iter().for_each(|line| println!("{line}"))
                    }
                    Err(error) => println!("{}", error.user_message()),
                }
                continue;
            }
            ChatInput::Book(position) => {
                let today = Utc::now().date_naive();
                runtime.book(session, position, today).await.map(|receipt| {
                    debug!(event_name = "chat.booking.receipt", receipt = %receipt, "receipt");
                    TurnOutcome::Settled
                })
            }
            ChatInput::Say(text) => runtime.handle_utterance(session, &text).await,
            ChatInput::Answer(answer) => runtime.answer(session, answer).await,
            ChatInput::SkipAmenities => runtime.skip_amenities(session).await,
            ChatInput::More => runtime.more_suggestions(session).await,
            ChatInput::Relax(action) => runtime.relax(session, action).await,
        };

        let before = seen;
        seen = flush_transcript(session, seen);
        render_outcome(session, result, seen > before);
    }

    Ok(())
}

fn flush_transcript(session: &ConversationSession, seen: usize) -> usize {
    for message in session.transcript().since(seen) {
        println!("{}", render_message(message));
    }
    session.transcript().len()
}

fn render_outcome(
    session: &ConversationSession,
    result: Result<TurnOutcome, ApplicationError>,
    transcript_moved: bool,
) {
    match result {
        Ok(TurnOutcome::Prompt(step)) => {
            render_step(&step, session.params()).iter().for_each(|l| println!("{l}"))
        }
        Ok(TurnOutcome::Suggestions(count)) if count > 0 => {
            render_suggestions(session.suggestions()).iter().for_each(|l| println!("{l}"));
            println!("  (/book <số>, /more, /relax budget|amenities|date)");
        }
        Ok(TurnOutcome::Suggestions(_)) => {
            println!("  (/relax budget|amenities|date, /more)");
        }
        Ok(_) => {}
        Err(error) if !transcript_moved => println!("{}", error.user_message()),
        Err(_) => {}
    }
}
