use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use membuilder::session::{Mode, Phase, RESULT_CORRECT};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let trainer = &self.trainer;
        let view = trainer.view();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // info line
                Constraint::Min(3),    // prompt
                Constraint::Length(1), // revealed answer
                Constraint::Length(1), // verdict
                Constraint::Length(3), // input
                Constraint::Length(1), // help
            ])
            .split(area);

        let info = Line::from(vec![
            Span::styled(trainer.current_list_label(), bold_style),
            Span::raw("   "),
            Span::raw(trainer.list_correct_label()),
            Span::raw("   "),
            Span::styled(
                format!(
                    "Total Correct: {}  [{}{}]",
                    trainer.lifetime_correct(),
                    trainer.mode(),
                    if trainer.user().auto_start {
                        ", auto"
                    } else {
                        ""
                    }
                ),
                dim_style,
            ),
        ]);
        Paragraph::new(info).render(chunks[0], buf);

        let prompt_style = if trainer.phase() == Phase::Presenting && view.prompt == trainer.current_sentence() {
            bold_style.fg(Color::Cyan)
        } else {
            italic_style
        };
        Paragraph::new(Span::styled(view.prompt.as_str(), prompt_style))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(view.answer.as_str(), dim_style))
            .alignment(Alignment::Center)
            .render(chunks[2], buf);

        let verdict_color = if view.result == RESULT_CORRECT {
            Color::Green
        } else {
            Color::Red
        };
        Paragraph::new(Span::styled(
            view.result.as_str(),
            bold_style.fg(verdict_color),
        ))
        .alignment(Alignment::Center)
        .render(chunks[3], buf);

        if trainer.mode() == Mode::Typed {
            Paragraph::new(view.input.as_str())
                .block(Block::default().borders(Borders::ALL).title("Answer"))
                .render(chunks[4], buf);
        }

        let help = match trainer.mode() {
            Mode::Typed => "(enter) submit / new sentence  (tab) next list  (ctrl-n) judged mode  (ctrl-a) auto start  (esc) quit",
            Mode::Judged if view.reveal_available => "(z) correct  (x) incorrect  (c) show answer  (tab) next list  (esc) quit",
            Mode::Judged => "(space) new sentence  (tab) next list  (ctrl-n) typed mode  (ctrl-a) auto start  (esc) quit",
        };
        Paragraph::new(Span::styled(help, italic_style.add_modifier(Modifier::DIM)))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
    }
}
