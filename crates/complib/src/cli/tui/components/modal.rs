use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// Regions of a rendered dialog.
#[derive(Clone, Copy, Debug)]
pub struct DialogLayout {
    pub body: Rect,
    pub error: Rect,
    pub footer: Rect,
}

/// Clear a centered box, draw its border and split it into body, a one-line
/// error slot and a footer.
pub fn render_dialog(
    frame: &mut Frame,
    area: Rect,
    max_width: u16,
    max_height: u16,
    title: &str,
    border_style: Style,
) -> DialogLayout {
    let dialog = centered_area(area, max_width, max_height);
    frame.render_widget(Clear, dialog);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(dialog);
    frame.render_widget(block, dialog);

    let [body, error, footer] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    DialogLayout {
        body,
        error,
        footer,
    }
}

/// Render an inline form error, or nothing.
pub fn render_error_line(frame: &mut Frame, area: Rect, error: Option<&str>) {
    if let Some(error) = error {
        let paragraph = Paragraph::new(error)
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

pub fn centered_area(area: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = area.width.min(max_width);
    let height = area.height.min(max_height);
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}
