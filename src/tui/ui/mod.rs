//! UI module: View components for the TUI.

pub mod questionnaire;
pub mod result;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::HealthTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "免责声明：本工具仅供科研参考，不能替代专业医疗诊断。",
            HealthTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Research use only. The percentage is a screening indicator, not a calibrated probability.",
            HealthTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(HealthTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
