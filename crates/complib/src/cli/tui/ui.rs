//! Rendering.

use complib::catalog::{DisplayMode, TagEditor, EMPTY_HINT, EMPTY_TITLE};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::time::Instant;

use super::app::{App, FormField, Overlay, SignInField};
use super::components::action_bar::{render_action_bar, ActionHint};
use super::components::modal::{centered_area, render_dialog, render_error_line};

const ACCENT: Color = Color::Cyan;

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    if app.catalog.is_authenticated() {
        draw_catalog(frame, app, area);
    } else {
        draw_sign_in(frame, app, area);
    }
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(ACCENT)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn input_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{:<14}", label), focus_style(focused)),
        Span::raw(value),
        Span::styled(cursor, Style::default().fg(ACCENT)),
    ])
}

fn draw_status(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        let paragraph =
            Paragraph::new(status.message.as_str()).style(Style::default().fg(color));
        frame.render_widget(paragraph, area);
    }
}

// ----------------------------------------------------------------------
// Sign-in
// ----------------------------------------------------------------------

fn draw_sign_in(frame: &mut Frame, app: &App, area: Rect) {
    let [main, status, bar] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(2),
    ])
    .areas(area);

    let card = centered_area(main, 60, 11);
    let block = Block::default()
        .title(" Component Shelf ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ACCENT));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let form = app.catalog.sign_in();
    let field = app.active_sign_in_field();
    let mut lines = vec![
        Line::from("Sign in with a one-time link sent to your email."),
        Line::from(""),
        input_line("Email", &form.email, field == SignInField::Email),
    ];
    if let Some(email) = form.sent_to() {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            format!("Check your email ({}) for the login link.", email),
            Style::default().fg(Color::Green),
        ));
        lines.push(Line::from("Open the link, or enter the code from the email:"));
        lines.push(input_line("Code", &form.code, field == SignInField::Code));
    } else if form.is_sending() {
        lines.push(Line::from(""));
        lines.push(Line::styled("Sending...", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    draw_status(frame, app, status);

    let mut hints = match field {
        SignInField::Email if form.can_request() => {
            vec![ActionHint::new("Enter", "Send magic link", 9)]
        }
        SignInField::Email => vec![ActionHint::disabled("Enter", "Send magic link", 9)],
        SignInField::Code if form.can_verify() => vec![ActionHint::new("Enter", "Verify code", 9)],
        SignInField::Code => vec![ActionHint::disabled("Enter", "Verify code", 9)],
    };
    hints.push(ActionHint::new("Esc", "Quit", 5));
    render_action_bar(frame, bar, &hints);
}

// ----------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------

fn draw_catalog(frame: &mut Frame, app: &App, area: Rect) {
    let [header, search, body, status, bar] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(2),
    ])
    .areas(area);

    draw_header(frame, app, header);
    draw_search(frame, app, search);

    let visible = app.catalog.visible();
    if visible.is_empty() {
        draw_empty(frame, app, body);
    } else {
        let [list, detail] =
            Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
                .areas(body);
        draw_list(frame, app, list);
        draw_detail(frame, app, detail);
    }

    draw_status(frame, app, status);
    render_action_bar(frame, bar, &catalog_hints(app));

    match app.overlay {
        Overlay::None => {}
        Overlay::Create(field) => draw_create(frame, app, area, field),
        Overlay::Edit(field) => draw_edit(frame, app, area, field),
        Overlay::Delete => draw_delete(frame, app, area),
        Overlay::TagFilter { cursor } => draw_tag_filter(frame, app, area, cursor),
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let email = app
        .catalog
        .session()
        .map(|session| session.email.as_str())
        .unwrap_or_default();
    let total = app.catalog.components().len();
    let shown = app.catalog.visible().len();
    let mut spans = vec![
        Span::styled(
            "Component Shelf",
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {}  ", email)),
        Span::styled(
            format!("{} of {} components", shown, total),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if app.catalog.is_loading() {
        spans.push(Span::styled("  loading...", Style::default().fg(Color::Yellow)));
    } else if app.is_busy() {
        spans.push(Span::styled("  working...", Style::default().fg(Color::Yellow)));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let query = app.catalog.query();
    let block = Block::default()
        .title(" Search ")
        .borders(Borders::ALL)
        .border_style(focus_style(app.search_focused));
    let mut spans = vec![Span::raw(query.search.as_str())];
    if app.search_focused {
        spans.push(Span::styled("_", Style::default().fg(ACCENT)));
    }
    for tag in query.selected_tags() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("#{}", tag),
            Style::default().fg(Color::Black).bg(ACCENT),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_empty(frame: &mut Frame, app: &App, area: Rect) {
    let lines = if app.catalog.is_loading() && !app.catalog.has_loaded() {
        vec![Line::from("Loading components...")]
    } else {
        vec![
            Line::styled(EMPTY_TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Line::styled(EMPTY_HINT, Style::default().fg(Color::DarkGray)),
        ]
    };
    let height = lines.len() as u16;
    let target = centered_area(area, area.width, height);
    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), target);
}

fn draw_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .catalog
        .visible()
        .into_iter()
        .map(|component| {
            let tags = component
                .tags
                .iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" ");
            ListItem::new(vec![
                Line::from(component.name.clone()),
                Line::styled(tags, Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().title(" Components ").borders(Borders::ALL))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    let mut state = ListState::default().with_selected(Some(app.selected));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_detail(frame: &mut Frame, app: &App, area: Rect) {
    let visible = app.catalog.visible();
    let Some(component) = visible.get(app.selected) else {
        return;
    };
    let mode = app.catalog.display_mode(&component.id);
    let copied = app.catalog.is_copy_acknowledged(&component.id, Instant::now());

    let mut title = format!(" {} [{}] ", component.name, mode.label());
    if copied {
        title.push_str("Copied! ");
    }
    let block = Block::default().title(title).borders(Borders::ALL);

    let mut lines = vec![
        Line::styled(
            format!("Added {}", component.created_at.format("%Y-%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        ),
        Line::from(""),
    ];
    match mode {
        DisplayMode::Preview => {
            lines.push(Line::from("Preview image:"));
            lines.push(Line::styled(
                component.image_url.clone(),
                Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            ));
        }
        DisplayMode::Code => {
            lines.extend(component.code.lines().map(|line| Line::from(line.to_string())));
        }
    }
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

fn catalog_hints(app: &App) -> Vec<ActionHint> {
    let has_selection = !app.catalog.visible().is_empty();
    let on_selection = |key: &'static str, label: &'static str, priority: u8| {
        if has_selection {
            ActionHint::new(key, label, priority)
        } else {
            ActionHint::disabled(key, label, priority)
        }
    };
    vec![
        ActionHint::new("n", "New", 9),
        on_selection("Enter", "Preview/Code", 8),
        on_selection("y", "Copy", 8),
        on_selection("e", "Edit", 7),
        on_selection("d", "Delete", 7),
        ActionHint::new("/", "Search", 6),
        ActionHint::new("t", "Tags", 6),
        ActionHint::new("r", "Reload", 3),
        ActionHint::new("o", "Sign out", 2),
        ActionHint::new("q", "Quit", 5),
    ]
}

// ----------------------------------------------------------------------
// Dialogs
// ----------------------------------------------------------------------

fn tag_lines<'a>(tags: &'a TagEditor, vocabulary: &[String], focused: bool) -> Vec<Line<'a>> {
    let mut chips: Vec<Span> = tags
        .tags()
        .iter()
        .flat_map(|tag| {
            [
                Span::styled(format!("#{}", tag), Style::default().fg(Color::Black).bg(ACCENT)),
                Span::raw(" "),
            ]
        })
        .collect();
    chips.insert(0, Span::styled(format!("{:<14}", "Tags"), focus_style(focused)));
    chips.push(Span::raw(tags.input()));
    if focused {
        chips.push(Span::styled("_", Style::default().fg(ACCENT)));
    }

    let mut lines = vec![Line::from(chips)];
    let suggestions = tags.suggestions(vocabulary);
    if focused && !suggestions.is_empty() {
        lines.push(Line::styled(
            format!("{:<14}{}", "", suggestions.join("  ")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    lines
}

fn code_lines<'a>(code: &'a str, focused: bool) -> Vec<Line<'a>> {
    let mut lines = vec![Line::styled("Code", focus_style(focused))];
    lines.extend(code.lines().map(|line| Line::from(format!("  {}", line))));
    if focused {
        lines.push(Line::styled("  _", Style::default().fg(ACCENT)));
    }
    lines
}

fn draw_create(frame: &mut Frame, app: &App, area: Rect, field: FormField) {
    let Some(form) = app.catalog.create_form() else {
        return;
    };
    let layout = render_dialog(frame, area, 72, 22, "Add New Component", Style::default().fg(ACCENT));
    let vocabulary = app.catalog.tag_vocabulary();

    let image = match form.image() {
        Some(image) => format!("{} ({} KiB)", image.name, image.size() / 1024),
        None => app.image_path.clone(),
    };
    let mut lines = vec![
        input_line("Name", &form.name, field == FormField::Name),
        Line::from(""),
    ];
    lines.extend(code_lines(&form.code, field == FormField::Code));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(format!("{:<14}", FormField::Image.label()), focus_style(field == FormField::Image)),
        Span::raw(if field == FormField::Image { app.image_path.clone() } else { image }),
    ]));
    lines.push(Line::from(""));
    lines.extend(tag_lines(&form.tags, &vocabulary, field == FormField::Tags));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout.body);

    render_error_line(frame, layout.error, form.error());
    let footer = if form.is_busy() {
        Line::styled("Adding...", Style::default().fg(Color::Yellow))
    } else {
        Line::from("[Tab] Next field  [Ctrl+S] Add Component  [Esc] Cancel")
    };
    frame.render_widget(Paragraph::new(footer), layout.footer);
}

fn draw_edit(frame: &mut Frame, app: &App, area: Rect, field: FormField) {
    let Some(form) = app.catalog.edit_form() else {
        return;
    };
    let title = format!("Edit {}", form.original_name());
    let layout = render_dialog(frame, area, 72, 20, &title, Style::default().fg(ACCENT));
    let vocabulary = app.catalog.tag_vocabulary();

    let mut lines = vec![
        input_line("Name", &form.name, field == FormField::Name),
        Line::from(""),
    ];
    lines.extend(code_lines(&form.code, field == FormField::Code));
    lines.push(Line::from(""));
    lines.extend(tag_lines(&form.tags, &vocabulary, field == FormField::Tags));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout.body);

    render_error_line(frame, layout.error, form.error());
    let footer = if form.is_busy() {
        Line::styled("Saving...", Style::default().fg(Color::Yellow))
    } else {
        Line::from("[Tab] Next field  [Ctrl+S] Save Changes  [Esc] Cancel")
    };
    frame.render_widget(Paragraph::new(footer), layout.footer);
}

fn draw_delete(frame: &mut Frame, app: &App, area: Rect) {
    let Some(confirm) = app.catalog.delete_confirm() else {
        return;
    };
    let layout = render_dialog(frame, area, 60, 10, "Delete Component", Style::default().fg(Color::Red));
    let lines = vec![
        Line::from("This action cannot be undone."),
        Line::from(vec![
            Span::raw("Type "),
            Span::styled(confirm.name(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" to confirm:"),
        ]),
        Line::from(""),
        input_line("Name", &confirm.typed, true),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), layout.body);

    let footer = if confirm.is_busy() {
        Line::styled("Deleting...", Style::default().fg(Color::Yellow))
    } else if confirm.matches() {
        Line::from("[Enter] Delete  [Esc] Cancel")
    } else {
        Line::styled("[Enter] Delete  [Esc] Cancel", Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(footer), layout.footer);
}

fn draw_tag_filter(frame: &mut Frame, app: &App, area: Rect, cursor: usize) {
    let layout = render_dialog(frame, area, 40, 16, "Filter by tags", Style::default().fg(ACCENT));
    let query = app.catalog.query();
    let vocabulary = app.catalog.tag_vocabulary();

    if vocabulary.is_empty() {
        frame.render_widget(Paragraph::new("No tags yet"), layout.body);
    } else {
        let items: Vec<ListItem> = vocabulary
            .iter()
            .map(|tag| {
                let mark = if query.is_selected(tag) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{} {}", mark, tag))
            })
            .collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(cursor));
        frame.render_stateful_widget(list, layout.body, &mut state);
    }

    frame.render_widget(
        Paragraph::new("[Space] Toggle  [c] Clear  [Esc] Close"),
        layout.footer,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use complib::catalog::{ImageFile, RecordingClipboard};
    use complib::gateway::MemoryGateway;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    async fn signed_in_app() -> App {
        let gateway = Arc::new(MemoryGateway::new());
        let mut app = App::new(gateway, Box::new(RecordingClipboard::default()));
        app.catalog.sign_in_mut().email = "user@example.com".into();
        let task = app.catalog.begin_request_sign_in().unwrap();
        app.catalog.run(task).await;
        app.catalog.sign_in_mut().code = "000000".into();
        let task = app.catalog.begin_verify_code().unwrap();
        app.catalog.run(task).await;
        app
    }

    async fn add(app: &mut App, name: &str) {
        let form = app.catalog.open_create_form().unwrap();
        form.name = name.into();
        form.code = "<nav>\n  <a/>\n</nav>".into();
        form.tags.add("layout");
        form.select_image(ImageFile::new("nav.png", vec![0; 32])).unwrap();
        let task = app.catalog.begin_create().unwrap();
        app.catalog.run(task).await;
    }

    #[test]
    fn test_sign_in_screen_renders() {
        let app = App::new(
            Arc::new(MemoryGateway::new()),
            Box::new(RecordingClipboard::default()),
        );
        let text = render(&app);
        assert!(text.contains("Component Shelf"));
        assert!(text.contains("Send magic link"));
    }

    #[tokio::test]
    async fn test_empty_catalog_shows_hint() {
        let app = signed_in_app().await;
        let text = render(&app);
        assert!(text.contains(EMPTY_TITLE));
        assert!(text.contains(EMPTY_HINT));
    }

    #[tokio::test]
    async fn test_component_renders_in_preview_then_code() {
        let mut app = signed_in_app().await;
        add(&mut app, "Navbar").await;

        let text = render(&app);
        assert!(text.contains("Navbar [Preview]"));
        assert!(text.contains("memory://component-images/components/"));

        let id = app.selected_id().unwrap();
        app.catalog.toggle_display_mode(&id);
        let text = render(&app);
        assert!(text.contains("Navbar [Code]"));
        assert!(text.contains("<a/>"));
    }

    #[tokio::test]
    async fn test_filtered_out_shows_empty_state() {
        let mut app = signed_in_app().await;
        add(&mut app, "Navbar").await;
        app.catalog.query_mut().search = "zzz".into();
        let text = render(&app);
        assert!(text.contains(EMPTY_TITLE));
    }

    #[tokio::test]
    async fn test_delete_dialog_renders_name() {
        let mut app = signed_in_app().await;
        add(&mut app, "Navbar").await;
        let id = app.selected_id().unwrap();
        app.catalog.open_delete(&id).unwrap();
        app.overlay = Overlay::Delete;
        let text = render(&app);
        assert!(text.contains("Delete Component"));
        assert!(text.contains("Type Navbar to confirm"));
    }

    #[tokio::test]
    async fn test_header_shows_pending_request() {
        let mut app = signed_in_app().await;
        add(&mut app, "Navbar").await;
        assert!(!render(&app).contains("working..."));

        let id = app.selected_id().unwrap();
        app.catalog.open_delete(&id).unwrap().typed = "Navbar".into();
        app.overlay = Overlay::Delete;
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert!(app.is_busy());
        assert!(render(&app).contains("working..."));
    }
}
