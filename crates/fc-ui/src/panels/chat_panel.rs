//! Assistant chat panel

use chrono::{DateTime, Local, Utc};
use egui::{Align, ComboBox, Frame, Key, Layout, RichText, ScrollArea, TextEdit, Ui};
use fc_core::events::events::ChatModeChanged;
use fc_core::EventBus;
use fc_data::{ChatEntry, ChatRole, Conversation, ConversationState, UserMode};

use crate::{theme, UiState};

/// Starter questions shown under an empty transcript
pub const QUICK_PROMPTS: [&str; 4] = [
    "What is the temperature in the Indian Ocean?",
    "Compare salinity between regions",
    "Are there any anomalies?",
    "How deep do the floats go?",
];

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "You",
        ChatRole::Assistant => "FloatChat",
    }
}

fn entry_time(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

fn bubble(ui: &mut Ui, role: ChatRole, text: &str, time: Option<String>) {
    let (fill, align) = match role {
        ChatRole::User => (theme::accent_color().linear_multiply(0.35), Align::Max),
        ChatRole::Assistant => (ui.visuals().faint_bg_color, Align::Min),
    };
    ui.with_layout(Layout::top_down(align), |ui| {
        Frame::none()
            .fill(fill)
            .rounding(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(ui.available_width() * 0.85);
                let header = match time {
                    Some(time) => format!("{} · {}", role_name(role), time),
                    None => role_name(role).to_string(),
                };
                ui.label(RichText::new(header).small().weak());
                ui.label(text);
            });
    });
    ui.add_space(4.0);
}

pub fn chat_panel(ui: &mut Ui, ui_state: &mut UiState, conversation: &Conversation, event_bus: &EventBus) {
    ui.horizontal(|ui| {
        ui.heading("Assistant");
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            let mut mode = conversation.mode();
            ComboBox::from_id_source("chat_mode")
                .selected_text(mode.label())
                .show_ui(ui, |ui| {
                    for candidate in UserMode::ALL {
                        ui.selectable_value(&mut mode, candidate, candidate.label());
                    }
                });
            if mode != conversation.mode() {
                conversation.set_mode(mode);
                event_bus.publish(ChatModeChanged {
                    mode: mode.as_str().to_string(),
                });
            }
        });
    });
    ui.separator();

    let transcript: Vec<ChatEntry> = conversation.transcript();
    let state = conversation.state();
    let input_height = 64.0;

    ScrollArea::vertical()
        .id_source("chat_transcript")
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .max_height((ui.available_height() - input_height).max(80.0))
        .show(ui, |ui| {
            if transcript.is_empty() && state == ConversationState::Idle {
                ui.label(RichText::new("Ask about the floats on the globe.").weak());
                for prompt in QUICK_PROMPTS {
                    if ui.link(prompt).clicked() {
                        ui_state.chat_input = prompt.to_string();
                    }
                }
            }
            for entry in &transcript {
                bubble(ui, entry.role, &entry.content, Some(entry_time(entry.timestamp)));
            }
            match state {
                ConversationState::Idle => {}
                ConversationState::Thinking => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new("thinking…").italics().weak());
                    });
                }
                ConversationState::Typing { .. } => {
                    let partial = conversation.partial_reply().unwrap_or_default();
                    bubble(ui, ChatRole::Assistant, &format!("{partial}▌"), None);
                }
            }
        });

    ui.separator();
    ui.horizontal(|ui| {
        let input = ui.add(
            TextEdit::singleline(&mut ui_state.chat_input)
                .hint_text(format!("Ask as a {}…", conversation.mode().as_str()))
                .desired_width(ui.available_width() - 110.0),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

        if conversation.is_busy() {
            if ui.button("Stop").clicked() {
                conversation.cancel();
            }
        } else if ui.button("Send").clicked() || submitted {
            send(ui_state, conversation);
            input.request_focus();
        }
    });
}

fn send(ui_state: &mut UiState, conversation: &Conversation) {
    let message = std::mem::take(&mut ui_state.chat_input);
    if message.trim().is_empty() {
        return;
    }
    if let Err(e) = conversation.send(&message) {
        ui_state.chat_input = message;
        ui_state.push_error("Assistant", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::Scheduler;
    use fc_data::assistant::TypingSettings;
    use fc_data::CannedResponder;
    use std::sync::Arc;

    fn conversation() -> Conversation {
        Conversation::new(
            Arc::new(Scheduler::new()),
            Arc::new(CannedResponder::new()),
            TypingSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_send_clears_input() {
        let conversation = conversation();
        let mut state = UiState::default();
        state.chat_input = "How salty is the Arabian Sea?".to_string();

        send(&mut state, &conversation);
        assert!(state.chat_input.is_empty());
        assert!(conversation.is_busy());
        assert_eq!(conversation.transcript().len(), 1);
    }

    #[test]
    fn test_blank_input_is_not_sent() {
        let conversation = conversation();
        let mut state = UiState::default();
        state.chat_input = "   ".to_string();

        send(&mut state, &conversation);
        assert!(!conversation.is_busy());
        assert!(state.notices.is_empty());
    }

    #[test]
    fn test_role_names() {
        assert_eq!(role_name(ChatRole::User), "You");
        assert_eq!(role_name(ChatRole::Assistant), "FloatChat");
    }
}
