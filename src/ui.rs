use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::{app::App, display::ViewModel, scoring::DiffChar};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
// block borders, top and bottom
const BORDER_LINES: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = self.view();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let inner_width = area
            .width
            .saturating_sub(HORIZONTAL_MARGIN * 2 + BORDER_LINES)
            .max(1);

        let passage = Paragraph::new(view.sample_text.as_str())
            .block(Block::default().borders(Borders::ALL).title(" passage "))
            .style(bold_style)
            .wrap(Wrap { trim: false });
        let passage_height = rendered_height(&passage, inner_width);

        let (title, body) = match &view.results {
            Some(results) => (" results ", Line::from(diff_spans(&results.diff, bold_style))),
            None => (" your text ", Line::from(typed_spans(view, bold_style))),
        };
        let input = Paragraph::new(body)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false });
        // one spare line so the caret can sit past the last character
        let input_height = rendered_height(&input, inner_width).max(passage_height + 1);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // stats
                Constraint::Length(1), // padding
                Constraint::Length(passage_height),
                Constraint::Length(input_height),
                Constraint::Min(0),
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Line::from(stats_spans(view, bold_style, dim_style)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        passage.render(chunks[2], buf);
        input.render(chunks[3], buf);

        let legend = if view.results.is_some() {
            "(n)ew passage / (q)uit"
        } else {
            "(tab) new passage / (←→↑↓) move caret / (esc)ape"
        };
        Paragraph::new(Span::styled(legend, italic_style)).render(chunks[5], buf);
    }
}

/// Rows `paragraph` occupies at `width` columns of text, borders included.
///
/// Word wrapping breaks at spaces, so this can exceed `text width / width`.
fn rendered_height(paragraph: &Paragraph, width: u16) -> u16 {
    u16::try_from(paragraph.line_count(width)).unwrap_or(u16::MAX)
}

fn stats_spans(view: &ViewModel, bold_style: Style, dim_style: Style) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled("time ", dim_style),
        Span::styled(view.elapsed.clone(), bold_style),
        Span::styled("   words ", dim_style),
        Span::styled(view.words_typed.to_string(), bold_style),
    ];

    // rates only mean something once the round is over
    if let Some(results) = &view.results {
        spans.extend([
            Span::styled("   wpm ", dim_style),
            Span::styled(
                format!("{:.1}", results.rounded_wpm()),
                bold_style.fg(Color::Magenta),
            ),
            Span::styled("   errors ", dim_style),
            Span::styled(
                format!("{:.2}%", results.rounded_error_percentage()),
                bold_style.fg(Color::Magenta),
            ),
        ]);
    }
    spans
}

fn typed_spans(view: &ViewModel, bold_style: Style) -> Vec<Span<'static>> {
    let chars: Vec<char> = view.typed_text.chars().collect();
    let cursor = view.cursor.min(chars.len());

    let before: String = chars[..cursor].iter().collect();
    let at = chars.get(cursor).map_or(' ', |c| *c);
    let after: String = chars
        .get(cursor + 1..)
        .map(|rest| rest.iter().collect())
        .unwrap_or_default();

    vec![
        Span::styled(before, bold_style),
        Span::styled(at.to_string(), bold_style.add_modifier(Modifier::REVERSED)),
        Span::styled(after, bold_style),
    ]
}

/// Runs of correct characters in green, mistakes in red with spaces made visible.
fn diff_spans(diff: &[DiffChar], bold_style: Style) -> Vec<Span<'static>> {
    let green_bold_style = bold_style.fg(Color::Green);
    let red_bold_style = bold_style.fg(Color::Red).add_modifier(Modifier::UNDERLINED);

    let mut spans = Vec::new();
    let mut run = String::new();
    let mut run_is_error = false;

    for d in diff {
        if d.is_error != run_is_error && !run.is_empty() {
            let style = if run_is_error { red_bold_style } else { green_bold_style };
            spans.push(Span::styled(std::mem::take(&mut run), style));
        }
        run_is_error = d.is_error;
        run.push(match d.char {
            ' ' if d.is_error => '·',
            c => c,
        });
    }
    if !run.is_empty() {
        let style = if run_is_error { red_bold_style } else { green_bold_style };
        spans.push(Span::styled(run, style));
    }
    spans
}
