//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous assessment on submit

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::{LoadedModel, ShapleyExplainer};
use crate::application::{scoring_config, Assessment, AssessmentService};
use crate::config::AppConfig;
use crate::domain::Questionnaire;
use crate::SubhealthError;

use super::ui::{
    questionnaire::{render_questionnaire, sample_answers, QuestionnaireFormState},
    render_disclaimer,
    result::render_result,
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Questionnaire,
    Result,
}

type Service = AssessmentService<LoadedModel, ShapleyExplainer>;

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    service: Service,
    form_state: QuestionnaireFormState,

    /// Latest assessment, shown on the result screen
    result: Option<Assessment>,
}

impl App {
    /// Create the application from startup configuration.
    ///
    /// Loads the model artifact, derives the scoring configuration and
    /// wires the explainer.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded or the configuration is
    /// inconsistent with it.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let model_path = config.model_path.as_path();
        if !model_path.exists() {
            return Err(anyhow!(
                "Model path not found at {:?}. Set SUBHEALTH_MODEL_PATH to a model.json file or a directory containing one.",
                model_path
            ));
        }

        // Refuse to start if the model cannot be loaded or verified.
        let model = LoadedModel::load(model_path, config.model_sha256.as_deref())
            .map_err(|e| anyhow!("Failed to load model from {:?}: {}", model_path, e))?;

        let scoring = scoring_config(config, &model)
            .map_err(|e| anyhow!("Failed to configure scoring: {}", e))?;

        let explainer = config
            .explain
            .then(|| Arc::new(ShapleyExplainer::new(model.baseline().to_vec())));

        let service = AssessmentService::new(
            Arc::new(Questionnaire::lifestyle_v1()),
            Arc::new(model),
            explainer,
            scoring,
        )?;

        Ok(Self::with_service(service))
    }

    /// Create application with an injected service (Composition Root pattern).
    #[must_use]
    pub fn with_service(service: Service) -> Self {
        let form_state = QuestionnaireFormState::new(service.questionnaire());
        Self {
            screen: Screen::Questionnaire,
            should_quit: false,
            service,
            form_state,
            result: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match (&self.screen, &self.result) {
                    (Screen::Result, Some(assessment)) => render_result(f, chunks[0], assessment),
                    _ => render_questionnaire(
                        f,
                        chunks[0],
                        self.service.questionnaire(),
                        &self.form_state,
                    ),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Questionnaire => self.handle_questionnaire_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_questionnaire_key(&mut self, key: KeyCode) {
        let questionnaire = self.service.questionnaire();
        match key {
            KeyCode::Up => self.form_state.prev_question(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_question(),
            KeyCode::Left => self.form_state.move_option(false),
            KeyCode::Right => self.form_state.move_option(true),
            KeyCode::Char(' ') => self.form_state.toggle(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.form_state.clear_sensitive(questionnaire);
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                self.form_state.load_answers(questionnaire, &sample_answers());
            }
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Enter => self.submit(),
            KeyCode::Esc if self.result.is_some() => self.screen = Screen::Result,
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => self.screen = Screen::Questionnaire,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.result = None;
                self.screen = Screen::Questionnaire;
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        let questionnaire = self.service.questionnaire();
        let sheet = self.form_state.to_answer_sheet(questionnaire);

        match self.service.assess(&sheet) {
            Ok(assessment) => {
                self.result = Some(assessment);
                self.screen = Screen::Result;
                // Clear answer buffers from the UI once scored.
                self.form_state.clear_sensitive(questionnaire);
            }
            Err(SubhealthError::Validation(errors)) => {
                self.form_state.set_errors(questionnaire, &errors);
            }
            Err(e) => {
                tracing::error!("Assessment failed: {}", e);
                self.form_state.errors = vec![e.to_string()];
            }
        }
    }
}
