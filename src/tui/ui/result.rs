//! Assessment result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::Assessment;
use crate::domain::{Explanation, WaterfallStep};
use crate::tui::styles::HealthTheme;

/// Width of the feature-name column in the attribution chart.
const LABEL_WIDTH: usize = 38;

/// Render the result of a submitted questionnaire
pub fn render_result(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Gauge
            Constraint::Length(6), // Tier + advice
            Constraint::Min(0),    // Attribution
            Constraint::Length(2), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0], assessment);
    render_gauge(f, chunks[1], assessment);
    render_advice(f, chunks[2], assessment);

    match (&assessment.explanation, &assessment.analysis_error) {
        (Some(explanation), _) => render_attribution(f, chunks[3], explanation),
        (None, Some(error)) => render_analysis_error(f, chunks[3], error),
        (None, None) => {}
    }

    render_result_footer(f, chunks[4]);
}

fn render_result_header(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", HealthTheme::text()),
        Span::styled("评估结果", HealthTheme::title()),
        Span::styled(
            format!(
                " │ {} UTC",
                assessment.created_at.format("%Y-%m-%d %H:%M:%S")
            ),
            HealthTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(HealthTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_gauge(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let score = &assessment.score;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" 亚健康风险 ", HealthTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(HealthTheme::border()),
        )
        .gauge_style(HealthTheme::risk_tier(score.risk_tier))
        .ratio(score.rescaled_probability.clamp(0.0, 1.0))
        .label(format!("{:.2}%", score.percentage()));

    f.render_widget(gauge, area);
}

fn render_advice(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let tier = assessment.score.risk_tier;
    let tier_style = HealthTheme::risk_tier(tier);

    let content = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                format!("{} ({tier})", tier.label()),
                tier_style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  threshold {:.3}", assessment.score.threshold),
                HealthTheme::text_muted(),
            ),
        ]),
        Line::from(Span::styled(tier.advice(), HealthTheme::text())),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(tier_style),
    );

    f.render_widget(content, area);
}

/// Map a waterfall step onto `width` cells, returning (offset, length).
fn bar_span(step: &WaterfallStep<'_>, lo: f64, hi: f64, width: usize) -> (usize, usize) {
    let scale = if hi > lo { width as f64 / (hi - lo) } else { 0.0 };
    let a = step.start.min(step.end);
    let b = step.start.max(step.end);
    let offset = (((a - lo) * scale).round() as usize).min(width);
    let length = (((b - a) * scale).round() as usize).clamp(1, width - offset.min(width - 1));
    (offset, length)
}

fn waterfall_lines(explanation: &Explanation, bar_width: usize) -> Vec<Line<'static>> {
    let steps = explanation.waterfall();
    let (lo, hi) = steps.iter().fold(
        (explanation.base_value, explanation.base_value),
        |(lo, hi), s| (lo.min(s.start).min(s.end), hi.max(s.start).max(s.end)),
    );

    let mut lines: Vec<Line<'static>> = steps
        .iter()
        .map(|step| {
            let (offset, length) = bar_span(step, lo, hi, bar_width);
            let contribution = step.attribution.contribution;
            let label = format!(
                "{:>5} = {:<width$}",
                format!("{}", step.attribution.value),
                step.attribution.feature,
                width = LABEL_WIDTH
            );
            Line::from(vec![
                Span::styled(label, HealthTheme::text_secondary()),
                Span::raw(" ".repeat(offset)),
                Span::styled("█".repeat(length), HealthTheme::contribution(contribution)),
                Span::styled(
                    format!(" {contribution:+.4}"),
                    HealthTheme::contribution(contribution),
                ),
            ])
        })
        .collect();

    lines.push(Line::from(vec![
        Span::styled(
            format!(
                "E[f(x)] = {:.4}   f(x) = {:.4}",
                explanation.base_value,
                explanation.output()
            ),
            HealthTheme::text_muted(),
        ),
    ]));
    lines
}

fn render_attribution(f: &mut Frame, area: Rect, explanation: &Explanation) {
    let block = Block::default()
        .title(Span::styled(" 特征贡献 / Feature Contributions ", HealthTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(HealthTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(inner);

    let bar_width = (chunks[0].width as usize).saturating_sub(LABEL_WIDTH + 20).max(10);
    f.render_widget(
        Paragraph::new(waterfall_lines(explanation, bar_width)),
        chunks[0],
    );

    let legend = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("█ ", HealthTheme::contribution(1.0)),
            Span::styled("推高风险 (raises risk)  ", HealthTheme::text_secondary()),
            Span::styled("█ ", HealthTheme::contribution(-1.0)),
            Span::styled("降低风险 (lowers risk)", HealthTheme::text_secondary()),
        ]),
        Line::from(Span::styled(
            "Bars are sorted by magnitude; E[f(x)] is the output for the reference respondent.",
            HealthTheme::text_muted(),
        )),
    ])
    .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[1]);
}

fn render_analysis_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! 特征分析失败", HealthTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), HealthTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(HealthTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Esc] ", HealthTheme::key_hint()),
        Span::styled("Back ", HealthTheme::key_desc()),
        Span::styled("[R] ", HealthTheme::key_hint()),
        Span::styled("New Assessment ", HealthTheme::key_desc()),
        Span::styled("[Ctrl+Q] ", HealthTheme::key_hint()),
        Span::styled("Quit", HealthTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(HealthTheme::border()),
    );

    f.render_widget(footer, area);
}
