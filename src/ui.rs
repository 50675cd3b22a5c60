use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::console::Phase;
use crate::gemini::DEFAULT_MODEL;

pub fn draw(frame: &mut Frame, app: &App) {
    let [input_area, output_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_prompt_input(frame, app, input_area);
    draw_output(frame, app, output_area);
    draw_footer(frame, app, footer_area);
}

fn draw_prompt_input(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.console.can_generate() {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let input = Paragraph::new(app.console.prompt()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Prompt "),
    );
    frame.render_widget(input, area);

    // Place the terminal cursor inside the input box
    let cursor_x = area.x + 1 + app.cursor.min(area.width.saturating_sub(2) as usize) as u16;
    frame.set_cursor(cursor_x, area.y + 1);
}

fn draw_output(frame: &mut Frame, app: &App, area: Rect) {
    let (border_color, text) = match app.console.phase() {
        Phase::Idle => (
            Color::DarkGray,
            Text::from(Span::styled(
                "Enter a prompt and press Enter to generate.",
                Style::default().fg(Color::DarkGray),
            )),
        ),
        Phase::Loading => {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            (
                Color::Yellow,
                Text::from(Span::styled(
                    format!("Thinking{}", dots),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                )),
            )
        }
        Phase::Error => (
            Color::Red,
            Text::from(Span::styled(
                app.console.error().unwrap_or_default().to_string(),
                Style::default().fg(Color::Red),
            )),
        ),
        Phase::Result => {
            // Response text is rendered verbatim, untrimmed
            let lines: Vec<Line> = app
                .console
                .result()
                .unwrap_or_default()
                .lines()
                .map(Line::from)
                .collect();
            (Color::DarkGray, Text::from(lines))
        }
    };

    let output = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(format!(" Gemini: {} ", DEFAULT_MODEL)),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.result_scroll, 0));

    frame.render_widget(output, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let generate_style = if app.console.can_generate() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
    };

    let hints = Line::from(vec![
        Span::styled(" Enter", generate_style),
        Span::styled(": generate  ", Style::default().fg(Color::DarkGray)),
        Span::styled("↑/↓", Style::default().fg(Color::Cyan)),
        Span::styled(": scroll  ", Style::default().fg(Color::DarkGray)),
        Span::styled("Esc", Style::default().fg(Color::Cyan)),
        Span::styled(": quit", Style::default().fg(Color::DarkGray)),
    ]);

    frame.render_widget(Paragraph::new(hints), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::Event;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_draw_each_phase() {
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();

        let mut app = App::new(None);
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Enter a prompt"));

        app.console.apply(Event::PromptChanged("hi".to_string()));
        app.console.apply(Event::GenerateRequested);
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("Thinking"));

        app.console.apply(Event::CallSucceeded("a fine answer".to_string()));
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("a fine answer"));

        app.console.apply(Event::GenerateRequested);
        app.console.apply(Event::CallFailed(Some("boom".to_string())));
        terminal.draw(|f| draw(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("boom"));
    }
}
