use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use super::step_selection;
use crate::models::ScreeningResult;

/// Headline numbers shown in the table title.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsSummary {
    pub count: usize,
    pub passed: usize,
    pub mean_score: Option<f64>,
}

pub fn summarize(results: &[ScreeningResult]) -> ResultsSummary {
    let passed = results.iter().filter(|r| r.passed()).count();
    let mean_score = if results.is_empty() {
        None
    } else {
        Some(results.iter().map(|r| r.score).sum::<f64>() / results.len() as f64)
    };
    ResultsSummary {
        count: results.len(),
        passed,
        mean_score,
    }
}

#[derive(Debug, Default)]
pub struct ResultsTable {
    state: TableState,
}

impl ResultsTable {
    /// Select the first row (or nothing) after a fresh fetch.
    pub fn reset(&mut self, len: usize) {
        self.state.select(if len > 0 { Some(0) } else { None });
    }

    pub fn step(&mut self, len: usize, forward: bool) {
        step_selection(&mut self.state, len, forward);
    }

    pub fn selected<'a>(&self, results: &'a [ScreeningResult]) -> Option<&'a ScreeningResult> {
        self.state.selected().and_then(|i| results.get(i))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, results: &[ScreeningResult]) {
        let summary = summarize(results);
        let title = match summary.mean_score {
            Some(mean) => format!(
                "Results ({} screened, {} passed, mean {:.1})",
                summary.count, summary.passed, mean
            ),
            None => "Results".to_string(),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if results.is_empty() {
            let empty = Paragraph::new("No resumes screened yet. Press u to upload one.")
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let header_cells = ["File", "Score", "Pass/Fail"].iter().map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        });
        let header = Row::new(header_cells).height(1).bottom_margin(1);

        let rows = results.iter().map(|r| {
            Row::new(vec![
                Cell::from(r.file_name.clone()),
                Cell::from(r.score_text()),
                Cell::from(r.pass_fail().to_string()).style(status_style(r)),
            ])
        });

        let widths = [
            Constraint::Percentage(60),
            Constraint::Length(6),
            Constraint::Min(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .fg(Color::Yellow),
            )
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.state);
    }
}

fn status_style(result: &ScreeningResult) -> Style {
    match result.pass_fail().to_ascii_lowercase().as_str() {
        "pass" => Style::default().fg(Color::Green),
        "fail" => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::DarkGray),
    }
}

/// Justification, evidence and competency scores of one result.
pub fn render_evaluation(f: &mut Frame, area: Rect, result: Option<&ScreeningResult>) {
    let block = Block::default().borders(Borders::ALL).title("Evaluation");
    let Some(result) = result else {
        f.render_widget(Paragraph::new("Select a result.").block(block), area);
        return;
    };

    let heading = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled(result.file_name.clone(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("  score {}  ", result.score_text())),
            Span::styled(result.pass_fail().to_string(), status_style(result)),
        ]),
    ];
    if let Some(screened_at) = result.created_at {
        lines.push(Line::from(Span::styled(
            format!("Screened {}", screened_at.format("%Y-%m-%d %H:%M")),
            Style::default().fg(Color::DarkGray),
        )));
    }
    if let Some(url) = &result.file_url {
        lines.push(Line::from(Span::styled(
            url.clone(),
            Style::default().fg(Color::DarkGray),
        )));
    }
    lines.push(Line::from(""));

    if let Some(error) = result.evaluation_error() {
        lines.push(Line::from(Span::styled(
            format!("Evaluation failed: {}", error),
            Style::default().fg(Color::Red),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled("Justification", heading)));
    lines.push(Line::from(result.justification().to_string()));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Competency Scores", heading)));
    for (name, score) in result.competency_scores() {
        lines.push(Line::from(format!("  {}: {}", name, score)));
    }
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Cited Evidence", heading)));
    for evidence in result.cited_evidence() {
        lines.push(Line::from(format!("  - {}", evidence)));
    }

    let widget = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(widget, area);
}
