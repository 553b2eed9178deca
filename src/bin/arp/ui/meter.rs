//! Accent profile widget - indispensability of every pulse in the bar at the
//! current division, with the last stepped pulse highlighted

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Bar, BarChart, BarGroup, Block, Borders},
    Frame,
};
use saavy_arp::{
    meter::{factor, indispensability},
    ArpConfig,
};

use super::UiStateUpdate;

/// Indispensability of each pulse of one bar of `divisions` beats split into
/// `division` pulses
pub fn accent_profile(divisions: u32, division: u32) -> Vec<u32> {
    let mut factors = factor(divisions.max(1));
    factors.extend(factor(division.max(1)));
    indispensability(&factors)
}

pub fn render_meter(frame: &mut Frame, area: Rect, state: &UiStateUpdate, config: &ArpConfig) {
    let profile = accent_profile(state.divisions_per_bar, config.division);
    let current = state
        .last_step
        .map(|step| (step.position * config.division as f64).round() as usize % profile.len().max(1));

    let block = Block::default()
        .title(format!(
            " Accents {}/{} ÷{} ",
            state.divisions_per_bar, state.denominator, config.division
        ))
        .borders(Borders::ALL);

    let bars: Vec<Bar> = profile
        .iter()
        .enumerate()
        .map(|(i, &weight)| {
            let color = if Some(i) == current {
                Color::LightYellow
            } else if i % config.division.max(1) as usize == 0 {
                Color::LightBlue
            } else {
                Color::Blue
            };
            Bar::default()
                .value(weight as u64 + 1)
                .text_value(String::new())
                .style(Style::default().fg(color))
        })
        .collect();

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / profile.len().max(1)).saturating_sub(1).max(1) as u16;

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .max(profile.len() as u64);

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accent_profile() {
        assert_eq!(accent_profile(4, 1), vec![3, 0, 2, 1]);
        assert_eq!(accent_profile(3, 2), vec![5, 0, 3, 1, 4, 2]);
        assert_eq!(accent_profile(6, 1).len(), 6);
    }
}
