//! Patient data input form.

use std::ops::RangeInclusive;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::domain::{
    ChestPainType, ExerciseAngina, FastingBloodSugar, PatientRecord, RestEcg, Sex, Slope,
    Thalassemia, VesselsColored,
};
use crate::tui::styles::MedicalTheme;

/// How a form field is edited.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    /// Free text parsed as a number and range-checked on submit.
    Numeric {
        value: String,
        min: f64,
        max: f64,
        step: f64,
        integer: bool,
    },
    /// One of a fixed set of labels, cycled with ←/→.
    Choice {
        options: Vec<&'static str>,
        selected: usize,
    },
}

/// Form field definition
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn integer(label: &'static str, hint: &'static str, range: RangeInclusive<i32>, default: i32) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Numeric {
                value: default.to_string(),
                min: f64::from(*range.start()),
                max: f64::from(*range.end()),
                step: 1.0,
                integer: true,
            },
        }
    }

    fn choice(label: &'static str, hint: &'static str, options: Vec<&'static str>) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Choice {
                options,
                selected: 0,
            },
        }
    }

    /// Text shown in the field box.
    #[must_use]
    pub fn display_value(&self) -> &str {
        match &self.input {
            FieldInput::Numeric { value, .. } => value,
            FieldInput::Choice { options, selected } => options[*selected],
        }
    }
}

fn labels<T>(all: &[T], label: fn(&T) -> &'static str) -> Vec<&'static str> {
    all.iter().map(label).collect()
}

// Field order, matching the columns of the training data.
const AGE: usize = 0;
const SEX: usize = 1;
const CHEST_PAIN: usize = 2;
const RESTING_BP: usize = 3;
const CHOLESTEROL: usize = 4;
const FASTING_BS: usize = 5;
const REST_ECG: usize = 6;
const MAX_HR: usize = 7;
const ANGINA: usize = 8;
const OLDPEAK: usize = 9;
const SLOPE: usize = 10;
const VESSELS: usize = 11;
const THALASSEMIA: usize = 12;

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        let d = PatientRecord::default();
        Self {
            fields: vec![
                FormField::integer("Age", "years (20-100)", PatientRecord::AGE_RANGE, d.age),
                FormField::choice("Sex", "", labels(Sex::ALL, Sex::label)),
                FormField::choice(
                    "Chest Pain Type",
                    "",
                    labels(ChestPainType::ALL, ChestPainType::label),
                ),
                FormField::integer(
                    "Resting Blood Pressure",
                    "mm Hg (80-200)",
                    PatientRecord::RESTING_BP_RANGE,
                    d.resting_blood_pressure,
                ),
                FormField::integer(
                    "Cholesterol",
                    "mg/dl (100-600)",
                    PatientRecord::CHOLESTEROL_RANGE,
                    d.cholestoral,
                ),
                FormField::choice(
                    "Fasting Blood Sugar",
                    "",
                    labels(FastingBloodSugar::ALL, FastingBloodSugar::label),
                ),
                FormField::choice("Resting ECG", "", labels(RestEcg::ALL, RestEcg::label)),
                FormField::integer(
                    "Max Heart Rate",
                    "bpm (60-220)",
                    PatientRecord::MAX_HEART_RATE_RANGE,
                    d.max_heart_rate,
                ),
                FormField::choice(
                    "Exercise Induced Angina",
                    "",
                    labels(ExerciseAngina::ALL, ExerciseAngina::label),
                ),
                FormField {
                    label: "Oldpeak",
                    hint: "ST depression (0.0-6.0)",
                    input: FieldInput::Numeric {
                        value: format!("{:.1}", d.oldpeak),
                        min: *PatientRecord::OLDPEAK_RANGE.start(),
                        max: *PatientRecord::OLDPEAK_RANGE.end(),
                        step: PatientRecord::OLDPEAK_STEP,
                        integer: false,
                    },
                },
                FormField::choice("Slope", "", labels(Slope::ALL, Slope::label)),
                FormField::choice(
                    "Vessels Colored by Fluoroscopy",
                    "",
                    labels(VesselsColored::ALL, VesselsColored::label),
                ),
                FormField::choice("Thalassemia", "", labels(Thalassemia::ALL, Thalassemia::label)),
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FieldInput::Numeric { value, integer, .. } =
            &mut self.fields[self.selected_field].input
        {
            if c.is_ascii_digit() || (c == '.' && !*integer && !value.contains('.')) {
                value.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldInput::Numeric { value, .. } = &mut self.fields[self.selected_field].input {
            value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let FieldInput::Numeric { value, .. } = &mut self.fields[self.selected_field].input {
            value.clear();
        }
    }

    /// Step the current field forward (`+1`) or backward (`-1`).
    ///
    /// Choices wrap around; numbers move by their step and stay in range.
    pub fn cycle(&mut self, direction: i32) {
        match &mut self.fields[self.selected_field].input {
            FieldInput::Choice { options, selected } => {
                let n = options.len();
                *selected = if direction >= 0 {
                    (*selected + 1) % n
                } else {
                    (*selected + n - 1) % n
                };
            }
            FieldInput::Numeric {
                value,
                min,
                max,
                step,
                integer,
            } => {
                let current = value.parse::<f64>().unwrap_or(*min);
                let next = (current + f64::from(direction) * *step).clamp(*min, *max);
                *value = if *integer {
                    format!("{next:.0}")
                } else {
                    format!("{next:.1}")
                };
            }
        }
        self.error_message = None;
    }

    /// Restore every field to its initial value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn number(&self, idx: usize) -> Result<f64, String> {
        let field = &self.fields[idx];
        let FieldInput::Numeric {
            value,
            min,
            max,
            step,
            integer,
        } = &field.input
        else {
            return Err(format!("{}: not a numeric field", field.label));
        };

        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;
        if !parsed.is_finite() || (*integer && parsed.fract() != 0.0) {
            return Err(format!("{}: Invalid number", field.label));
        }
        if parsed < *min || parsed > *max {
            return Err(format!(
                "{}: Value must be between {} and {}",
                field.label, min, max
            ));
        }
        let steps = ((parsed - min) / step).round();
        if !*integer && (min + steps * step - parsed).abs() > 1e-9 {
            return Err(format!("{}: Value must be a multiple of {}", field.label, step));
        }
        Ok(parsed)
    }

    fn integer(&self, idx: usize) -> Result<i32, String> {
        // Range-checked against i32 bounds by `number`.
        Ok(self.number(idx)? as i32)
    }

    fn choice<T: Copy>(&self, idx: usize, all: &[T]) -> Result<T, String> {
        let field = &self.fields[idx];
        match &field.input {
            FieldInput::Choice { selected, .. } => all
                .get(*selected)
                .copied()
                .ok_or_else(|| format!("{}: Invalid selection", field.label)),
            FieldInput::Numeric { .. } => Err(format!("{}: not a choice field", field.label)),
        }
    }

    /// Validate and convert to a PatientRecord
    pub fn to_patient_record(&self) -> Result<PatientRecord, String> {
        Ok(PatientRecord {
            age: self.integer(AGE)?,
            sex: self.choice(SEX, Sex::ALL)?,
            chest_pain_type: self.choice(CHEST_PAIN, ChestPainType::ALL)?,
            resting_blood_pressure: self.integer(RESTING_BP)?,
            cholestoral: self.integer(CHOLESTEROL)?,
            fasting_blood_sugar: self.choice(FASTING_BS, FastingBloodSugar::ALL)?,
            rest_ecg: self.choice(REST_ECG, RestEcg::ALL)?,
            max_heart_rate: self.integer(MAX_HR)?,
            exercise_induced_angina: self.choice(ANGINA, ExerciseAngina::ALL)?,
            oldpeak: self.number(OLDPEAK)?,
            slope: self.choice(SLOPE, Slope::ALL)?,
            vessels_colored_by_flourosopy: self.choice(VESSELS, VesselsColored::ALL)?,
            thalassemia: self.choice(THALASSEMIA, Thalassemia::ALL)?,
        })
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" ", MedicalTheme::text()),
            Span::styled("Heart Disease Risk Predictor", MedicalTheme::title()),
        ]),
        Line::from(Span::styled(
            " Enter patient details to predict the risk of heart disease.",
            MedicalTheme::text_secondary(),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let border_style = if is_selected {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        };

        let title_style = if is_selected {
            MedicalTheme::focused()
        } else {
            MedicalTheme::text_secondary()
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match &field.input {
            FieldInput::Numeric { value, .. } => {
                if value.is_empty() {
                    spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
                } else {
                    spans.push(Span::styled(value.as_str(), MedicalTheme::text()));
                }
                if is_selected {
                    spans.push(Span::styled("▌", MedicalTheme::cursor()));
                }
            }
            FieldInput::Choice { .. } => {
                if is_selected {
                    spans.push(Span::styled("◀ ", MedicalTheme::key_hint()));
                }
                spans.push(Span::styled(field.display_value(), MedicalTheme::text()));
                if is_selected {
                    spans.push(Span::styled(" ▶", MedicalTheme::key_hint()));
                }
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Change ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_value(state: &mut PatientFormState, idx: usize, text: &str) {
        state.selected_field = idx;
        state.clear_field();
        for c in text.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_defaults_build_default_record() {
        let state = PatientFormState::default();
        assert_eq!(state.fields.len(), 13);
        let record = state.to_patient_record().expect("defaults are valid");
        assert_eq!(record, PatientRecord::default());
    }

    #[test]
    fn test_out_of_range_age_is_rejected() {
        let mut state = PatientFormState::default();
        set_value(&mut state, AGE, "19");
        let err = state.to_patient_record().expect_err("below range");
        assert!(err.starts_with("Age"));

        set_value(&mut state, AGE, "101");
        assert!(state.to_patient_record().is_err());

        set_value(&mut state, AGE, "100");
        assert_eq!(state.to_patient_record().expect("upper bound").age, 100);
    }

    #[test]
    fn test_empty_and_fractional_integers_are_rejected() {
        let mut state = PatientFormState::default();
        set_value(&mut state, CHOLESTEROL, "");
        assert!(state.to_patient_record().is_err());

        // '.' is ignored on integer fields, so "2.5" types as "25".
        set_value(&mut state, RESTING_BP, "2.5");
        assert_eq!(state.display_of(RESTING_BP), "25");
        assert!(state.to_patient_record().is_err());
    }

    #[test]
    fn test_oldpeak_accepts_one_decimal_point() {
        let mut state = PatientFormState::default();
        set_value(&mut state, OLDPEAK, "2.5.1");
        assert_eq!(state.display_of(OLDPEAK), "2.51");
        assert!(state.to_patient_record().is_err());
        set_value(&mut state, OLDPEAK, "6.1");
        assert!(state.to_patient_record().is_err());
        set_value(&mut state, OLDPEAK, "3.4");
        assert_eq!(state.to_patient_record().expect("in range").oldpeak, 3.4);
    }

    #[test]
    fn test_oldpeak_off_step_is_rejected() {
        let mut state = PatientFormState::default();
        set_value(&mut state, OLDPEAK, "2.55");
        let err = state.to_patient_record().expect_err("off the 0.1 grid");
        assert_eq!(err, "Oldpeak: Value must be a multiple of 0.1");

        set_value(&mut state, OLDPEAK, "2.5");
        assert_eq!(state.to_patient_record().expect("on grid").oldpeak, 2.5);
        set_value(&mut state, OLDPEAK, "0");
        assert_eq!(state.to_patient_record().expect("lower bound").oldpeak, 0.0);
        set_value(&mut state, OLDPEAK, "6.0");
        assert_eq!(state.to_patient_record().expect("upper bound").oldpeak, 6.0);
    }

    #[test]
    fn test_choices_cycle_and_wrap() {
        let mut state = PatientFormState::default();
        state.selected_field = THALASSEMIA;
        state.cycle(-1);
        assert_eq!(
            state.to_patient_record().expect("valid").thalassemia,
            Thalassemia::ReversibleDefect
        );
        state.cycle(1);
        state.cycle(1);
        assert_eq!(
            state.to_patient_record().expect("valid").thalassemia,
            Thalassemia::FixedDefect
        );
    }

    #[test]
    fn test_numeric_cycle_steps_and_clamps() {
        let mut state = PatientFormState::default();
        state.selected_field = OLDPEAK;
        state.cycle(1);
        assert_eq!(state.display_of(OLDPEAK), "1.1");

        set_value(&mut state, AGE, "100");
        state.cycle(1);
        assert_eq!(state.display_of(AGE), "100");
    }

    #[test]
    fn test_typing_ignored_on_choice_fields() {
        let mut state = PatientFormState::default();
        state.selected_field = SEX;
        state.input_char('7');
        state.delete_char();
        assert_eq!(state.display_of(SEX), "Male");
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = PatientFormState::default();
        set_value(&mut state, AGE, "77");
        state.selected_field = SLOPE;
        state.cycle(1);
        state.error_message = Some("x".into());
        state.reset();
        assert_eq!(state.to_patient_record().expect("valid"), PatientRecord::default());
        assert!(state.error_message.is_none());
        assert_eq!(state.selected_field, 0);
    }

    impl PatientFormState {
        fn display_of(&self, idx: usize) -> &str {
            self.fields[idx].display_value()
        }
    }
}
