//! Questionnaire input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    AnswerSheet, QuestionKind, QuestionSpec, Questionnaire, RawAnswer, ValidationError,
    NONE_OF_THE_ABOVE,
};
use crate::tui::styles::HealthTheme;

/// Editable answer buffer for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Number(String),
    Single { choice: usize, options: usize },
    Multi { cursor: usize, checked: Vec<bool> },
}

impl FieldInput {
    fn blank(spec: &QuestionSpec) -> Self {
        match spec.kind {
            QuestionKind::Numeric => Self::Number(String::new()),
            // Single choice starts on the first option.
            QuestionKind::SingleChoice => Self::Single {
                choice: 0,
                options: spec.options.len(),
            },
            _ => Self::Multi {
                cursor: 0,
                checked: vec![false; spec.options.len()],
            },
        }
    }

    fn to_answer(&self, spec: &QuestionSpec) -> Option<RawAnswer> {
        match self {
            Self::Number(text) if text.is_empty() => None,
            Self::Number(text) => Some(RawAnswer::Number(text.parse().unwrap_or(f64::NAN))),
            Self::Single { choice, .. } => spec
                .options
                .get(*choice)
                .map(|o| RawAnswer::Choice(o.label.clone())),
            Self::Multi { checked, .. } => Some(RawAnswer::selection(
                spec.options
                    .iter()
                    .zip(checked)
                    .filter(|(_, &on)| on)
                    .map(|(o, _)| o.label.clone()),
            )),
        }
    }

    fn load(&mut self, spec: &QuestionSpec, answer: &RawAnswer) {
        let position = |label: &str| spec.options.iter().position(|o| o.label == label);
        match (self, answer) {
            (Self::Number(text), RawAnswer::Number(value)) => *text = value.to_string(),
            (Self::Single { choice, .. }, RawAnswer::Choice(label)) => {
                if let Some(i) = position(label) {
                    *choice = i;
                }
            }
            (Self::Multi { checked, .. }, RawAnswer::Selection(labels)) => {
                for label in labels {
                    if let Some(i) = position(label) {
                        checked[i] = true;
                    }
                }
            }
            _ => {}
        }
    }

    fn wipe(&mut self) {
        match self {
            Self::Number(text) => text.zeroize(),
            Self::Single { choice, .. } => choice.zeroize(),
            Self::Multi { cursor, checked } => {
                cursor.zeroize();
                checked.iter_mut().for_each(|c| *c = false);
            }
        }
    }

    fn summary(&self, spec: &QuestionSpec) -> String {
        match self {
            Self::Number(text) if text.is_empty() => "—".to_string(),
            Self::Number(text) => text.clone(),
            Self::Single { choice, .. } => spec
                .options
                .get(*choice)
                .map_or_else(String::new, |o| o.label.clone()),
            Self::Multi { checked, .. } => {
                let n = checked.iter().filter(|&&c| c).count();
                if n == 0 {
                    "—".to_string()
                } else {
                    format!("已选 {n} 项")
                }
            }
        }
    }
}

/// Reference respondent used by the sample shortcut.
#[must_use]
pub fn sample_answers() -> AnswerSheet {
    AnswerSheet::new()
        .with_number("age", 30.0)
        .with_choice("household_registration", "城镇")
        .with_selection("residential_comfort", ["绿化好"])
        .with_choice("hobbies", "一般（拥有1 - 3个兴趣爱好）")
        .with_choice("personality", "成熟稳重")
        .with_choice("physical_exercise", "5～7天/周")
        .with_choice("sleep_duration", "大于7小时/天")
        .with_selection("unhealthy_diet", [NONE_OF_THE_ABOVE])
        .with_choice("internet_use", "小于1小时/天")
        .with_selection("life_events", [NONE_OF_THE_ABOVE])
}

/// Questionnaire form state
pub struct QuestionnaireFormState {
    pub fields: Vec<FieldInput>,
    pub current: usize,
    pub errors: Vec<String>,
}

impl QuestionnaireFormState {
    #[must_use]
    pub fn new(questionnaire: &Questionnaire) -> Self {
        Self {
            fields: questionnaire.questions.iter().map(FieldInput::blank).collect(),
            current: 0,
            errors: Vec::new(),
        }
    }

    pub fn next_question(&mut self) {
        self.current = (self.current + 1) % self.fields.len();
    }

    pub fn prev_question(&mut self) {
        if self.current == 0 {
            self.current = self.fields.len() - 1;
        } else {
            self.current -= 1;
        }
    }

    /// Left/Right: change a single choice, or move the multi-choice cursor.
    pub fn move_option(&mut self, forward: bool) {
        let step = |i: usize, n: usize| {
            if n == 0 {
                0
            } else if forward {
                (i + 1) % n
            } else {
                (i + n - 1) % n
            }
        };
        match &mut self.fields[self.current] {
            FieldInput::Single { choice, options } => *choice = step(*choice, *options),
            FieldInput::Multi { cursor, checked } => *cursor = step(*cursor, checked.len()),
            FieldInput::Number(_) => {}
        }
    }

    /// Toggle the option under the cursor of a multi-choice question.
    pub fn toggle(&mut self) {
        if let FieldInput::Multi { cursor, checked } = &mut self.fields[self.current] {
            if let Some(c) = checked.get_mut(*cursor) {
                *c = !*c;
            }
        }
    }

    pub fn input_char(&mut self, c: char) {
        if let FieldInput::Number(text) = &mut self.fields[self.current] {
            if c.is_ascii_digit() || (c == '.' && !text.contains('.')) {
                text.push(c);
            }
        }
    }

    pub fn delete_char(&mut self) {
        if let FieldInput::Number(text) = &mut self.fields[self.current] {
            text.pop();
        }
    }

    /// Collect the current buffers into an answer sheet.
    ///
    /// Empty numeric input is left out so it reports as a missing answer.
    #[must_use]
    pub fn to_answer_sheet(&self, questionnaire: &Questionnaire) -> AnswerSheet {
        let mut sheet = AnswerSheet::new();
        for (spec, field) in questionnaire.questions.iter().zip(&self.fields) {
            if let Some(answer) = field.to_answer(spec) {
                sheet.insert(spec.name.clone(), answer);
            }
        }
        sheet
    }

    /// Show validation errors, labelled with the question prompts.
    pub fn set_errors(&mut self, questionnaire: &Questionnaire, errors: &[ValidationError]) {
        self.errors = errors
            .iter()
            .map(|e| {
                let prompt = questionnaire
                    .get(e.question())
                    .map_or(e.question(), |q| q.prompt.as_str());
                format!("{prompt}: {e}")
            })
            .collect();
        if let Some(first) = errors
            .first()
            .and_then(|e| questionnaire.questions.iter().position(|q| q.name == e.question()))
        {
            self.current = first;
        }
    }

    /// Wipe all answer buffers and return to the first question.
    pub fn clear_sensitive(&mut self, questionnaire: &Questionnaire) {
        for field in &mut self.fields {
            field.wipe();
        }
        *self = Self::new(questionnaire);
    }

    /// Fill the form from an answer sheet.
    pub fn load_answers(&mut self, questionnaire: &Questionnaire, sheet: &AnswerSheet) {
        *self = Self::new(questionnaire);
        for (spec, field) in questionnaire.questions.iter().zip(&mut self.fields) {
            if let Some(answer) = sheet.get(&spec.name) {
                field.load(spec, answer);
            }
        }
    }
}

/// Render the questionnaire form
pub fn render_questionnaire(
    f: &mut Frame,
    area: Rect,
    questionnaire: &Questionnaire,
    state: &QuestionnaireFormState,
) {
    let footer_height = if state.errors.is_empty() {
        3
    } else {
        (state.errors.len() as u16 + 1).min(8)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),             // Header
            Constraint::Min(0),                // Form
            Constraint::Length(footer_height), // Footer/errors
        ])
        .split(area);

    render_form_header(f, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_question_list(f, columns[0], questionnaire, state);
    if let Some(spec) = questionnaire.questions.get(state.current) {
        render_question_panel(f, columns[1], spec, &state.fields[state.current]);
    }

    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", HealthTheme::text()),
        Span::styled("亚健康风险评估", HealthTheme::title()),
        Span::styled(" │ Lifestyle Questionnaire", HealthTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(HealthTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_question_list(
    f: &mut Frame,
    area: Rect,
    questionnaire: &Questionnaire,
    state: &QuestionnaireFormState,
) {
    let lines: Vec<Line> = questionnaire
        .questions
        .iter()
        .zip(&state.fields)
        .enumerate()
        .map(|(i, (spec, field))| {
            let is_current = i == state.current;
            let marker = if is_current { "▶ " } else { "  " };
            let prompt_style = if is_current {
                HealthTheme::focused()
            } else {
                HealthTheme::text()
            };
            Line::from(vec![
                Span::styled(marker, HealthTheme::cursor()),
                Span::styled(format!("{:>2}. {}", i + 1, spec.prompt), prompt_style),
                Span::styled("  ", HealthTheme::text()),
                Span::styled(field.summary(spec), HealthTheme::text_secondary()),
            ])
        })
        .collect();

    let list = Paragraph::new(lines).block(
        Block::default()
            .title(Span::styled(" 问卷 ", HealthTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(HealthTheme::border()),
    );

    f.render_widget(list, area);
}

fn render_question_panel(f: &mut Frame, area: Rect, spec: &QuestionSpec, field: &FieldInput) {
    let hint = match spec.kind {
        QuestionKind::Numeric => "输入数字",
        QuestionKind::SingleChoice => "单选：←→ 切换",
        _ => "多选：←→ 移动，空格 勾选",
    };

    let mut lines = vec![
        Line::from(Span::styled(spec.display_name.clone(), HealthTheme::text_muted())),
        Line::from(Span::styled(hint, HealthTheme::text_secondary())),
        Line::from(""),
    ];

    match field {
        FieldInput::Number(text) => {
            lines.push(Line::from(vec![
                Span::raw(" "),
                Span::styled(text.clone(), HealthTheme::text()),
                Span::styled("▌", HealthTheme::cursor()),
            ]));
        }
        FieldInput::Single { choice, .. } => {
            for (i, option) in spec.options.iter().enumerate() {
                let (mark, style) = if i == *choice {
                    ("(•) ", HealthTheme::selected())
                } else {
                    ("( ) ", HealthTheme::text())
                };
                lines.push(Line::from(Span::styled(format!("{mark}{}", option.label), style)));
            }
        }
        FieldInput::Multi { cursor, checked } => {
            for (i, (option, &on)) in spec.options.iter().zip(checked).enumerate() {
                let mark = if on { "[x] " } else { "[ ] " };
                let style = if i == *cursor {
                    HealthTheme::selected()
                } else {
                    HealthTheme::text()
                };
                lines.push(Line::from(Span::styled(format!("{mark}{}", option.label), style)));
            }
        }
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(Span::styled(format!(" {} ", spec.prompt), HealthTheme::focused()))
                .borders(Borders::ALL)
                .border_style(HealthTheme::border_focused()),
        );

    f.render_widget(panel, area);
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &QuestionnaireFormState) {
    let content: Vec<Line> = if state.errors.is_empty() {
        vec![Line::from(vec![
            Span::styled("[↑↓] ", HealthTheme::key_hint()),
            Span::styled("Question ", HealthTheme::key_desc()),
            Span::styled("[←→] ", HealthTheme::key_hint()),
            Span::styled("Option ", HealthTheme::key_desc()),
            Span::styled("[Space] ", HealthTheme::key_hint()),
            Span::styled("Toggle ", HealthTheme::key_desc()),
            Span::styled("[Enter] ", HealthTheme::key_hint()),
            Span::styled("Submit ", HealthTheme::key_desc()),
            Span::styled("[S] ", HealthTheme::key_hint()),
            Span::styled("Sample ", HealthTheme::key_desc()),
            Span::styled("[R] ", HealthTheme::key_hint()),
            Span::styled("Reset ", HealthTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", HealthTheme::key_hint()),
            Span::styled("Quit", HealthTheme::key_desc()),
        ])]
    } else {
        state
            .errors
            .iter()
            .map(|err| {
                Line::from(vec![
                    Span::styled("! ", HealthTheme::danger()),
                    Span::styled(err.clone(), HealthTheme::danger()),
                ])
            })
            .collect()
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(HealthTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::validate_and_encode;

    fn setup() -> (Questionnaire, QuestionnaireFormState) {
        let q = Questionnaire::lifestyle_v1();
        let state = QuestionnaireFormState::new(&q);
        (q, state)
    }

    #[test]
    fn test_sample_encodes_to_reference_vector() {
        let (q, mut state) = setup();
        state.load_answers(&q, &sample_answers());

        let features =
            validate_and_encode(&q, &state.to_answer_sheet(&q)).expect("Sample should validate");
        assert_eq!(
            features.as_slice(),
            &[30.0, 1.0, 0.0, 1.0, 0.0, 2.0, 1.0, 0.0, 2.0, 0.0]
        );
    }

    #[test]
    fn test_blank_form_reports_age_and_multi_choice_errors() {
        let (q, state) = setup();
        let errors = validate_and_encode(&q, &state.to_answer_sheet(&q))
            .expect_err("Blank form should not validate");
        // Age plus the three multi-choice items; single choices default to the first option.
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_navigation_wraps() {
        let (_, mut state) = setup();
        state.prev_question();
        assert_eq!(state.current, 9);
        state.next_question();
        assert_eq!(state.current, 0);
    }

    #[test]
    fn test_age_input() {
        let (_, mut state) = setup();
        for c in "4x2.5.".chars() {
            state.input_char(c);
        }
        assert_eq!(state.fields[0], FieldInput::Number("42.5".into()));
        state.delete_char();
        assert_eq!(state.fields[0], FieldInput::Number("42.".into()));
    }

    #[test]
    fn test_single_choice_cycles() {
        let (_, mut state) = setup();
        state.current = 1;
        state.move_option(false);
        assert_eq!(state.fields[1], FieldInput::Single { choice: 3, options: 4 });
        state.move_option(true);
        assert_eq!(state.fields[1], FieldInput::Single { choice: 0, options: 4 });
    }

    #[test]
    fn test_multi_choice_toggle() {
        let (q, mut state) = setup();
        state.current = 7;
        state.move_option(true);
        state.toggle();
        state.move_option(true);
        state.toggle();

        let sheet = state.to_answer_sheet(&q);
        assert_eq!(
            sheet.get("unhealthy_diet"),
            Some(&RawAnswer::selection(["节食", "暴饮暴食"]))
        );
    }

    #[test]
    fn test_errors_focus_first_failing_question() {
        let (q, mut state) = setup();
        state.current = 5;
        let errors = validate_and_encode(&q, &state.to_answer_sheet(&q)).expect_err("Blank");
        state.set_errors(&q, &errors);
        assert_eq!(state.current, 0);
        assert!(state.errors[0].starts_with("年龄"));
    }

    #[test]
    fn test_clear_sensitive_resets_form() {
        let (q, mut state) = setup();
        state.load_answers(&q, &sample_answers());
        state.current = 4;
        state.clear_sensitive(&q);
        assert_eq!(state.fields[0], FieldInput::Number(String::new()));
        assert_eq!(state.current, 0);
        assert!(state.to_answer_sheet(&q).get("age").is_none());
    }
}
