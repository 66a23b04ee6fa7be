use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use copywriter_core::extract::{MAX_EXAMPLE_BYTES, MAX_EXAMPLE_FILES};
use crate::app::{App, Field, InputMode, StatusKind, TextInput};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, status, footer
    let [header_area, body_area, status_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    let [form_area, output_area] = Layout::horizontal([
        Constraint::Percentage(45),
        Constraint::Percentage(55),
    ])
    .areas(body_area);

    render_header(app, frame, header_area);
    render_form(app, frame, form_area);
    render_output(app, frame, output_area);
    render_status(app, frame, status_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let examples = app.session.examples().len();
    let examples_indicator = if examples > 0 {
        format!(" [{} example{}]", examples, if examples == 1 { "" } else { "s" })
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" Copywriter ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("{} ", app.model), Style::default().fg(Color::White)),
        Span::styled(examples_indicator, Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn field_block(app: &App, field: Field) -> Block<'static> {
    let focused = app.focus == field;
    let border_color = match (focused, app.input_mode) {
        (true, InputMode::Editing) => Color::Yellow,
        (true, InputMode::Normal) => Color::Cyan,
        (false, _) => Color::DarkGray,
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", field.label()))
}

/// Slice of `input` that fits in `width` columns, keeping the cursor visible.
fn visible_window(input: &TextInput, width: usize) -> (String, usize) {
    if width == 0 {
        return (String::new(), 0);
    }
    let start = input.cursor.saturating_sub(width - 1);
    let visible: String = input.value.chars().skip(start).take(width).collect();
    (visible, input.cursor - start)
}

fn render_text_field(
    app: &App,
    frame: &mut Frame,
    area: Rect,
    field: Field,
    input: &TextInput,
    placeholder: &str,
) {
    let block = field_block(app, field);
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible, cursor_offset) = visible_window(input, inner_width);

    let content = if input.value.is_empty() {
        Line::from(Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)))
    } else {
        Line::from(visible)
    };
    frame.render_widget(Paragraph::new(content).block(block), area);

    if app.focus == field && app.input_mode == InputMode::Editing {
        frame.set_cursor_position((area.x + 1 + cursor_offset as u16, area.y + 1));
    }
}

fn render_choice_field(app: &App, frame: &mut Frame, area: Rect, field: Field, value: &str) {
    let block = field_block(app, field);
    let arrow_style = if app.focus == field {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let line = Line::from(vec![
        Span::styled("< ", arrow_style),
        Span::styled(value.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(" >", arrow_style),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let [topic, tone, format, personal, content, example, examples_list, generate] =
        Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .areas(area);

    render_text_field(
        app,
        frame,
        topic,
        Field::Topic,
        &app.topic,
        "What is the copy about? (required)",
    );
    render_choice_field(app, frame, tone, Field::Tone, app.tone.label());
    render_choice_field(app, frame, format, Field::Format, app.format.label());
    render_text_field(
        app,
        frame,
        personal,
        Field::PersonalContext,
        &app.personal_context,
        "Your voice, brand, audience (optional)",
    );
    render_text_field(
        app,
        frame,
        content,
        Field::ContentContext,
        &app.content_context,
        "What this piece is for (optional)",
    );
    render_text_field(
        app,
        frame,
        example,
        Field::ExamplePath,
        &app.example_path,
        "Path to .txt, .docx or .pdf, Enter to load",
    );

    render_examples(app, frame, examples_list);
    render_generate_button(app, frame, generate);
}

fn render_examples(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(format!(
            " Writing samples (up to {} files, {} MB each) ",
            MAX_EXAMPLE_FILES,
            MAX_EXAMPLE_BYTES / (1024 * 1024)
        ));

    if app.session.examples().is_empty() {
        let hint = Paragraph::new(Span::styled(
            "No samples loaded. Samples teach the model your style.",
            Style::default().fg(Color::DarkGray),
        ))
        .wrap(Wrap { trim: true })
        .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = app
        .session
        .examples()
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::Yellow)),
                Span::raw(doc.filename.clone()),
                Span::styled(
                    format!("  {} chars", doc.text.chars().count()),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_generate_button(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Field::Generate;
    let (label, style) = if app.is_generating() {
        (
            format!(" Generating {} ", SPINNER[app.animation_frame as usize % SPINNER.len()]),
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )
    } else if app.copywriter.is_none() {
        (
            " Generate (API key missing) ".to_string(),
            Style::default().fg(Color::Gray).bg(Color::DarkGray),
        )
    } else if focused {
        (
            " Generate Copy ".to_string(),
            Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        )
    } else {
        (" Generate Copy ".to_string(), Style::default().fg(Color::Cyan))
    };

    let button = Paragraph::new(Line::from(Span::styled(label, style)).centered())
        .block(field_block(app, Field::Generate));
    frame.render_widget(button, area);
}

fn render_output(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Generated Copy ");

    let text = if app.is_generating() {
        Text::from(Span::styled(
            format!(
                "Waiting for {} {}",
                app.model,
                SPINNER[app.animation_frame as usize % SPINNER.len()]
            ),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(output) = &app.output {
        Text::from(output.lines().map(|l| Line::from(l.to_string())).collect::<Vec<_>>())
    } else {
        Text::from(Span::styled(
            "Fill in the form and press Ctrl+G to generate.",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_status(app: &App, frame: &mut Frame, area: Rect) {
    let Some(status) = &app.status else {
        return;
    };

    let color = match status.kind {
        StatusKind::Info => Color::Gray,
        StatusKind::Success => Color::Green,
        StatusKind::Warning => Color::Yellow,
        StatusKind::Error => Color::Red,
    };
    let line = Line::from(Span::styled(format!(" {}", status.text), Style::default().fg(color)));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " FORM ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut hints = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    let pairs: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[
            (" Enter ", " done "),
            (" Tab ", " next "),
            (" Esc ", " stop editing "),
        ],
        InputMode::Normal if app.is_generating() => &[(" Esc ", " cancel "), (" q ", " quit ")],
        InputMode::Normal => &[
            (" j/k ", " field "),
            (" h/l ", " change "),
            (" Enter ", " edit "),
            (" ^G ", " generate "),
            (" ^S ", " export "),
            (" J/K ", " scroll "),
            (" x ", " drop sample "),
            (" q ", " quit "),
        ],
    };
    for (key, label) in pairs {
        hints.push(Span::styled(*key, key_style));
        hints.push(Span::styled(*label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}
