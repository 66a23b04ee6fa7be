use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crate::app::{App, Field, InputMode};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    app.poll_generation().await;
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in any mode
    if ctrl {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('g') => {
                app.input_mode = InputMode::Normal;
                app.start_generation();
                return;
            }
            KeyCode::Char('s') => {
                app.export_last();
                return;
            }
            _ => {}
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Esc stops an in-flight request
        KeyCode::Esc => app.cancel_generation(),

        // Row navigation
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => app.focus_next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => app.focus_prev(),

        // Choice rows
        KeyCode::Char('h') | KeyCode::Left => app.cycle_choice(false),
        KeyCode::Char('l') | KeyCode::Right => app.cycle_choice(true),

        KeyCode::Enter | KeyCode::Char('i') => {
            if app.focus.is_text() {
                if let Some(input) = app.focused_input() {
                    input.end();
                }
                app.input_mode = InputMode::Editing;
            } else if app.focus == Field::Generate {
                app.start_generation();
            } else {
                app.cycle_choice(true);
            }
        }

        // Result pane
        KeyCode::Char('J') | KeyCode::PageDown => app.scroll_output_down(),
        KeyCode::Char('K') | KeyCode::PageUp => app.scroll_output_up(),

        KeyCode::Char('g') => app.start_generation(),
        KeyCode::Char('e') => app.export_last(),
        KeyCode::Char('x') => app.remove_last_example(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            match app.focus {
                Field::ExamplePath => app.load_example(),
                Field::Topic => app.focus_next(),
                _ => {}
            }
        }
        KeyCode::Tab => {
            app.input_mode = InputMode::Normal;
            app.focus_next();
        }
        KeyCode::BackTab => {
            app.input_mode = InputMode::Normal;
            app.focus_prev();
        }
        code => {
            if !app.focus.is_text() {
                app.input_mode = InputMode::Normal;
                return;
            }
            let Some(input) = app.focused_input() else {
                return;
            };
            match code {
                KeyCode::Char(c) => input.insert(c),
                KeyCode::Backspace => input.backspace(),
                KeyCode::Delete => input.delete(),
                KeyCode::Left => input.left(),
                KeyCode::Right => input.right(),
                KeyCode::Home => input.home(),
                KeyCode::End => input.end(),
                _ => {}
            }
        }
    }
}
