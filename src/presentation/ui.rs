use crate::application::{App, AppMode, SIGN_UP_FIELDS, Screen};
use crate::infrastructure::format_date;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};

pub fn render_ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    match app.screen {
        Screen::SignUp => render_sign_up(f, app, chunks[1]),
        Screen::History => render_history(f, app, chunks[1]),
        Screen::Browse | Screen::Cart | Screen::Order(_) => render_products(f, app, chunks[1]),
    }
    render_status_bar(f, app, chunks[2]);

    if matches!(app.mode, AppMode::Help) {
        render_help_popup(f, app.help_scroll);
    }
}

fn screen_title(screen: Screen) -> String {
    match screen {
        Screen::SignUp => "Sign up".to_string(),
        Screen::Browse => "Products".to_string(),
        Screen::Cart => "Cart".to_string(),
        Screen::History => "Orders".to_string(),
        Screen::Order(date) => format!("Order of {}", format_date(date)),
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let user = app
        .signed_user()
        .map(|u| u.email)
        .unwrap_or_else(|| "not signed in".to_string());
    let busy = if app.is_busy() { " | working..." } else { "" };
    let header = Paragraph::new(format!(
        "grocer - {} | {} | cart: {} items, ₹ {}{}",
        screen_title(app.screen),
        user,
        app.list.cart_item_count(&app.cart),
        app.cart.cart_subtotal(),
        busy
    ))
    .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn render_sign_up(f: &mut Frame, app: &App, area: Rect) {
    let mut rows = Vec::new();
    for (index, label) in SIGN_UP_FIELDS.iter().enumerate() {
        let focused = index == app.sign_up_form.focused;
        let value_style = if focused {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else {
            Style::default()
        };
        rows.push(Row::new(vec![
            Cell::from(*label).style(Style::default().fg(Color::Yellow)),
            Cell::from(app.sign_up_form.values[index].clone()).style(value_style),
        ]));
    }

    let title = if app.sign_up_status.in_progress {
        "Sign up (sending...)"
    } else {
        "Sign up"
    };
    let table = Table::new(rows, [Constraint::Length(10), Constraint::Min(10)])
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn render_products(f: &mut Frame, app: &App, area: Rect) {
    let visible_rows = (area.height as usize).saturating_sub(3).max(1);
    let offset = app.selected.saturating_sub(visible_rows - 1);

    let header = Row::new(vec!["", "Product", "Volume", "Price"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .rows()
        .into_iter()
        .enumerate()
        .skip(offset)
        .take(visible_rows)
        .map(|(position, row)| {
            let marker = match (row.checkbox, row.volume_controls) {
                (Some(true), _) => "[x]",
                (Some(false), _) => "[ ]",
                (None, true) => "-/+",
                (None, false) => "",
            };
            let style = if position == app.selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(marker),
                Cell::from(row.name),
                Cell::from(row.volume_label.unwrap_or_default()),
                Cell::from(row.price_label),
            ])
            .style(style)
        })
        .collect();

    let mut title = screen_title(app.screen);
    if let Screen::Order(date) = app.screen {
        let subtotal = app.cart.order_subtotal(date);
        title = format!("{title} | {} lines, ₹ {}", subtotal.count, subtotal.subtotal);
    }

    let widths = [
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(12),
        Constraint::Length(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn render_history(f: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec!["Date", "Total"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .history
        .iter()
        .enumerate()
        .map(|(position, (date, total))| {
            let style = if position == app.selected {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Row::new(vec![format_date(*date), format!("₹ {total}")]).style(style)
        })
        .collect();

    let title = if app.history.is_empty() {
        "Orders (press r to refresh)"
    } else {
        "Orders"
    };
    let table = Table::new(rows, [Constraint::Length(12), Constraint::Min(10)])
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);
    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => {
            if let Some(ref status) = app.status_message {
                status.clone()
            } else {
                match app.screen {
                    Screen::Browse => "Space: add/remove | 2: cart | 3: orders | F1/?: help | q: quit".to_string(),
                    Screen::Cart => "+/-: volume | d: remove | p: place order | 1: products | q: quit".to_string(),
                    Screen::History => "Enter: open | r: refresh | Ctrl+E: export CSV | 1: products | q: quit".to_string(),
                    Screen::Order(_) => "Esc: back to orders | q: quit".to_string(),
                    Screen::SignUp => String::new(),
                }
            }
        }
        AppMode::Editing => match app.sign_up_status.message {
            Some(ref message) => message.clone(),
            None => "Tab/↑↓: field | Enter: sign up | Esc: quit".to_string(),
        },
        AppMode::Help => "↑↓/jk: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/q: close help".to_string(),
        AppMode::ExportCsv => format!("Export orders as: {} (Enter to export, Esc to cancel)", app.filename_input),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::ExportCsv => Style::default().fg(Color::Magenta),
        });
    f.render_widget(input, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let area = f.area();
    let popup_area = Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    };

    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(Block::default()
            .borders(Borders::ALL)
            .title(format!("grocer help (Line {}/{})", start_line + 1, help_lines.len()))
            .style(Style::default().fg(Color::Cyan)))
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

const HELP_TEXT: &str = r#"GROCER

=== SCREENS ===
1               Product catalog
2               Cart
3               Order history
Ctrl+X          Sign out

=== PRODUCTS ===
↑↓ or j/k       Move selection
Space/Enter     Add to cart or remove from cart
                Products are added at their minimum volume

=== CART ===
+ or →          Increase volume by one step
- or ←          Decrease volume by one step
                Volume stays between the product's minimum and maximum
d or Delete     Remove from cart
p               Place order for everything in the cart

=== ORDERS ===
Enter           Show the lines of the selected order
r               Refresh order history from the server
Ctrl+E          Export order history to CSV
Esc             Back from an order to the list

=== HELP NAVIGATION ===
↑↓ or j/k       Scroll help text up/down one line
Page Up/Down    Scroll help text up/down 5 lines
Home            Jump to top of help text
Esc/F1/?/q      Close this help window"#;
