//! Transport bar widget - shows BPM, play state, position and the controls

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_arp::ArpConfig;

use super::UiStateUpdate;

fn flag(name: &str, on: bool) -> Span<'static> {
    let style = if on {
        Style::default().fg(Color::LightGreen)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Span::styled(format!("{name}  "), style)
}

/// Render the transport bar
pub fn render_transport(
    frame: &mut Frame,
    area: Rect,
    state: &UiStateUpdate,
    config: &ArpConfig,
    bpm: f64,
) {
    let block = Block::default().title(" arp ").borders(Borders::ALL);

    let play_symbol = if state.rolling { "▶" } else { "⏸" };
    let play_state_str = if state.rolling { "Playing" } else { "Stopped" };

    let mut line = Line::from(vec![
        Span::styled(format!(" BPM: {:.0}  ", bpm), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{} {}  ", play_symbol, play_state_str),
            Style::default().fg(if state.rolling {
                Color::Green
            } else {
                Color::Yellow
            }),
        ),
        Span::styled(
            format!("{}/{}  ", state.divisions_per_bar, state.denominator),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Bar {} | Beat {}  ", state.bar, state.beat_in_bar),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!(
                "{}  ÷{}  oct +{} -{} shift {:+}  gate {:.1}  ",
                config.mode.name(),
                config.division,
                config.octaves_up,
                config.octaves_down,
                config.octave_shift,
                config.gate
            ),
            Style::default().fg(Color::Magenta),
        ),
        flag("latch", config.latch),
        flag("bypass", config.bypass),
    ]);
    if state.dropped > 0 {
        line.push_span(Span::styled(
            format!("dropped {}", state.dropped),
            Style::default().fg(Color::LightRed),
        ));
    }

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
