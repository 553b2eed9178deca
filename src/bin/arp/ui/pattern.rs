//! Pattern widget - the stepped notes with the cursor, the chord keys, and a
//! log of the notes sent

use std::collections::VecDeque;

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_arp::io::midi::MidiMessage;

use super::{UiStateUpdate, CHORD_KEYS};

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

pub fn note_name(pitch: u8) -> String {
    let octave = pitch as i32 / 12 - 1;
    format!("{}{}", NOTE_NAMES[pitch as usize % 12], octave)
}

pub fn render_pattern(frame: &mut Frame, area: Rect, state: &UiStateUpdate, chord: &[bool]) {
    let block = Block::default().title(" Pattern ").borders(Borders::ALL);

    let cursor = state.cursor.map(usize::from);
    let steps: Vec<Span> = state
        .pattern()
        .iter()
        .enumerate()
        .map(|(i, &pitch)| {
            let style = if Some(i) == cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Span::styled(format!(" {:<4}", note_name(pitch)), style)
        })
        .collect();

    let steps = if steps.is_empty() {
        Line::from(Span::styled(" (no notes)", Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(steps)
    };

    let keys: Vec<Span> = CHORD_KEYS
        .iter()
        .zip(chord)
        .enumerate()
        .map(|(i, (&pitch, &held))| {
            let style = if held {
                Style::default().fg(Color::LightGreen).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Span::styled(format!(" {}:{:<4}", i + 1, note_name(pitch)), style)
        })
        .collect();

    let last = match state.last_step {
        Some(step) => Line::from(Span::styled(
            format!(
                " last: {} vel {} weight {}/{} ({:.2})",
                note_name(step.pitch),
                step.velocity,
                step.weight.weight,
                step.weight.resolution,
                step.normalized
            ),
            Style::default().fg(Color::Cyan),
        )),
        None => Line::from(""),
    };

    let paragraph = Paragraph::new(vec![steps, Line::from(keys), last]).block(block);
    frame.render_widget(paragraph, area);
}

/// Recent note-ons, oldest first
pub fn render_output(frame: &mut Frame, area: Rect, output: &VecDeque<MidiMessage>) {
    let block = Block::default().title(" Output ").borders(Borders::ALL);

    let spans: Vec<Span> = output
        .iter()
        .map(|message| {
            Span::styled(
                format!(" {} {:>3} ", note_name(message.data1), message.data2),
                Style::default().fg(Color::Gray),
            )
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
