use std::borrow::Cow;

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionHint {
    pub key: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub enabled: bool,
    /// Lower priorities are dropped first when space runs out.
    pub priority: u8,
}

impl ActionHint {
    pub fn new(
        key: impl Into<Cow<'static, str>>,
        label: impl Into<Cow<'static, str>>,
        priority: u8,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            enabled: true,
            priority,
        }
    }

    pub fn disabled(
        key: impl Into<Cow<'static, str>>,
        label: impl Into<Cow<'static, str>>,
        priority: u8,
    ) -> Self {
        Self {
            enabled: false,
            ..Self::new(key, label, priority)
        }
    }

    fn width(&self) -> usize {
        // "[key] label"
        self.key.chars().count() + 3 + self.label.chars().count()
    }
}

const GAP_WIDTH: usize = 2;

pub fn render_action_bar(frame: &mut Frame, area: Rect, hints: &[ActionHint]) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let block = Block::default().borders(Borders::TOP);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let shown = fit_hints(hints, inner.width as usize);
    let mut spans = Vec::new();
    for (i, idx) in shown.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" ".repeat(GAP_WIDTH)));
        }
        spans.extend(hint_spans(&hints[*idx]));
    }

    let paragraph = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

/// Indices of the hints that fit on one line of `width`, in original order.
fn fit_hints(hints: &[ActionHint], width: usize) -> Vec<usize> {
    let mut active: Vec<usize> = (0..hints.len()).collect();
    loop {
        let total: usize = active.iter().map(|idx| hints[*idx].width()).sum::<usize>()
            + GAP_WIDTH * active.len().saturating_sub(1);
        if total <= width || active.is_empty() {
            return active;
        }
        let drop_pos = active
            .iter()
            .enumerate()
            .min_by_key(|(_, idx)| (hints[**idx].priority, std::cmp::Reverse(**idx)))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        active.remove(drop_pos);
    }
}

fn hint_spans(hint: &ActionHint) -> Vec<Span<'static>> {
    let (key_style, label_style) = if hint.enabled {
        (
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default(),
        )
    } else {
        (
            Style::default().fg(Color::DarkGray),
            Style::default().fg(Color::DarkGray),
        )
    };

    vec![
        Span::styled(format!("[{}]", hint.key), key_style),
        Span::raw(" "),
        Span::styled(hint.label.clone(), label_style),
    ]
}
