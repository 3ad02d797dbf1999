use crate::application::{App, AppMode, Screen};
use crossterm::event::{KeyCode, KeyModifiers};

/// Translates key presses into `App` actions for the current mode.
pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_sign_up_mode(app, key),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::ExportCsv => Self::handle_filename_input_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            match key {
                KeyCode::Char('e') if app.screen == Screen::History => app.start_csv_export(),
                KeyCode::Char('x') => app.sign_out(),
                _ => {}
            }
            return;
        }

        app.status_message = None;

        match key {
            KeyCode::F(1) | KeyCode::Char('?') => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::Char('1') => app.show_browse(),
            KeyCode::Char('2') => app.show_cart(),
            KeyCode::Char('3') => app.show_history(),
            KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            _ => match app.screen {
                Screen::Browse => Self::handle_browse_key(app, key),
                Screen::Cart => Self::handle_cart_key(app, key),
                Screen::History => Self::handle_history_key(app, key),
                Screen::Order(_) => {
                    if key == KeyCode::Esc {
                        app.show_history();
                    }
                }
                Screen::SignUp => {}
            },
        }
    }

    fn handle_browse_key(app: &mut App, key: KeyCode) {
        if matches!(key, KeyCode::Char(' ') | KeyCode::Enter) {
            app.toggle_selected();
        }
    }

    fn handle_cart_key(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Char('+') | KeyCode::Right => app.increase_selected(),
            KeyCode::Char('-') | KeyCode::Left => app.decrease_selected(),
            KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
            KeyCode::Char('p') => app.submit_order(),
            _ => {}
        }
    }

    fn handle_history_key(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.open_selected_order(),
            KeyCode::Char('r') => app.refresh_history(),
            _ => {}
        }
    }

    fn handle_sign_up_mode(app: &mut App, key: KeyCode) {
        if app.sign_up_status.in_progress {
            return;
        }
        match key {
            KeyCode::Enter => app.submit_sign_up(),
            KeyCode::Tab | KeyCode::Down => app.sign_up_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => app.sign_up_form.previous_field(),
            KeyCode::Backspace => {
                app.sign_up_form.focused_value().pop();
            }
            KeyCode::Char(c) => app.sign_up_form.focused_value().push(c),
            _ => {}
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('?') | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if app.help_scroll > 0 {
                    app.help_scroll -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll += 1;
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll += 5;
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_filename_input_mode(app: &mut App, key: KeyCode) {
        let len = app.filename_input.chars().count();
        match key {
            KeyCode::Enter => app.export_history(),
            KeyCode::Esc => app.cancel_filename_input(),
            KeyCode::Backspace => {
                if app.cursor_position > 0 {
                    let at = byte_offset(&app.filename_input, app.cursor_position - 1);
                    app.filename_input.remove(at);
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Delete => {
                if app.cursor_position < len {
                    let at = byte_offset(&app.filename_input, app.cursor_position);
                    app.filename_input.remove(at);
                }
            }
            KeyCode::Left => {
                if app.cursor_position > 0 {
                    app.cursor_position -= 1;
                }
            }
            KeyCode::Right => {
                if app.cursor_position < len {
                    app.cursor_position += 1;
                }
            }
            KeyCode::Home => {
                app.cursor_position = 0;
            }
            KeyCode::End => {
                app.cursor_position = len;
            }
            KeyCode::Char(c) => {
                let at = byte_offset(&app.filename_input, app.cursor_position);
                app.filename_input.insert(at, c);
                app.cursor_position += 1;
            }
            _ => {}
        }
    }
}

/// Byte index of the `chars`-th character, or the end of `text`.
fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index)
}
