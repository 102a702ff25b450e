//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation between the form and the result view
//! - Input event handling
//! - Running predictions through the injected predictor

use std::io;
use std::time::Duration;

use anyhow::Result;
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

use crate::adapters::ForestClassifier;
use crate::application::RiskPredictor;

use super::ui::{
    inference::{render_inference, InferenceState},
    patient::{render_patient_form, PatientFormState},
    render_disclaimer,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    PatientForm,
    Result,
}

/// Main application state
pub struct App {
    /// Current screen
    screen: Screen,

    /// Whether the app should quit
    should_quit: bool,

    /// Prediction service over the loaded artifact
    predictor: RiskPredictor<ForestClassifier>,

    /// Patient form state
    patient_form_state: PatientFormState,

    /// Last prediction outcome, set by the first Predict
    inference_state: Option<InferenceState>,

    /// Whether the reference evaluation block is shown
    show_evaluation: bool,
}

impl App {
    /// Create application over an already-built predictor (Composition Root
    /// pattern: `main.rs` loads and checks the artifact and hands it over).
    #[must_use]
    pub fn new(predictor: RiskPredictor<ForestClassifier>) -> Self {
        Self {
            screen: Screen::PatientForm,
            should_quit: false,
            predictor,
            patient_form_state: PatientFormState::default(),
            inference_state: None,
            show_evaluation: false,
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

                match self.screen {
                    Screen::PatientForm => {
                        render_patient_form(f, chunks[0], &self.patient_form_state)
                    }
                    Screen::Result => {
                        if let Some(state) = &self.inference_state {
                            render_inference(
                                f,
                                chunks[0],
                                state,
                                self.predictor.classifier().evaluation(),
                                self.show_evaluation,
                            );
                        }
                    }
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
            Screen::PatientForm => self.handle_patient_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_patient_form_key(&mut self, key: KeyCode) {
        let form = &mut self.patient_form_state;
        match key {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => form.prev_field(),
            KeyCode::Down | KeyCode::Tab => form.next_field(),
            KeyCode::Left => form.cycle(-1),
            KeyCode::Right => form.cycle(1),
            KeyCode::Char('r') | KeyCode::Char('R') => form.reset(),
            KeyCode::Char(c) => form.input_char(c),
            KeyCode::Backspace => form.delete_char(),
            KeyCode::Delete => form.clear_field(),
            KeyCode::Enter => self.submit_patient_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter | KeyCode::Esc => self.screen = Screen::PatientForm,
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.patient_form_state.reset();
                self.screen = Screen::PatientForm;
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                self.show_evaluation = !self.show_evaluation;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            _ => {}
        }
    }

    fn submit_patient_form(&mut self) {
        let patient = match self.patient_form_state.to_patient_record() {
            Ok(patient) => patient,
            Err(e) => {
                self.patient_form_state.error_message = Some(e);
                return;
            }
        };
        self.patient_form_state.error_message = None;

        self.inference_state = Some(match self.predictor.predict(&patient) {
            Ok(prediction) => InferenceState::Complete { prediction },
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                InferenceState::Error {
                    message: e.to_string(),
                }
            }
        });
        self.screen = Screen::Result;
    }
}
