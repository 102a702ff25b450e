//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::domain::{ModelEvaluation, Prediction};
use crate::tui::styles::MedicalTheme;

/// Outcome of the last Predict action
#[derive(Debug, Clone)]
pub enum InferenceState {
    /// Completed with result
    Complete { prediction: Prediction },
    /// Error occurred (schema mismatch, invalid record)
    Error { message: String },
}

/// Render the result screen.
///
/// `evaluation` is what the loaded artifact recorded about itself; it is
/// drawn only when `show_evaluation` is set.
pub fn render_inference(
    f: &mut Frame,
    area: Rect,
    state: &InferenceState,
    evaluation: Option<&ModelEvaluation>,
    show_evaluation: bool,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_inference_header(f, chunks[0]);
    match state {
        InferenceState::Complete { prediction } => {
            let evaluation = show_evaluation.then_some(evaluation);
            render_result(f, chunks[1], prediction, evaluation)
        }
        InferenceState::Error { message } => render_error(f, chunks[1], message),
    }
    render_inference_footer(f, chunks[2], state, show_evaluation);
}

fn render_inference_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Heart Disease Risk Predictor", MedicalTheme::title()),
        Span::styled(" │ Prediction", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// `evaluation` is `None` when the panel is hidden, `Some(None)` when shown
/// for an artifact without recorded metrics.
fn render_result(
    f: &mut Frame,
    area: Rect,
    prediction: &Prediction,
    evaluation: Option<Option<&ModelEvaluation>>,
) {
    let columns = if evaluation.is_some() {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(area)
    };

    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(columns[0]);
    f.render_widget(block, columns[0]);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Headline
            Constraint::Length(3), // Probability
            Constraint::Length(7), // Derived features
            Constraint::Min(0),    // Note
        ])
        .margin(1)
        .split(inner);

    let result = &prediction.result;
    let label_style = MedicalTheme::risk_label(result.label);

    let headline = Paragraph::new(vec![
        Line::from(Span::styled(
            result.label.headline(),
            label_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Probability: ", MedicalTheme::text_secondary()),
            Span::styled(result.probability_percent(), MedicalTheme::text()),
        ]),
    ])
    .alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let prob_gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Probability of heart disease ",
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(label_style)
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(result.probability_percent());
    f.render_widget(prob_gauge, chunks[1]);

    let rows: Vec<Row> = prediction
        .derived
        .named()
        .map(|(name, value)| Row::new(vec![name.to_string(), format!("{value:.2}")]))
        .collect();
    let derived = Table::new(rows, [Constraint::Percentage(65), Constraint::Percentage(35)])
        .style(MedicalTheme::text())
        .block(
            Block::default()
                .title(Span::styled(" Derived features ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        );
    f.render_widget(derived, chunks[2]);

    let note = Paragraph::new(Line::from(Span::styled(
        "Note: This tool is for educational use. Always consult a medical professional.",
        MedicalTheme::text_muted(),
    )))
    .wrap(Wrap { trim: true });
    f.render_widget(note, chunks[3]);

    match evaluation {
        Some(Some(eval)) => render_evaluation(f, columns[1], eval),
        Some(None) => render_no_evaluation(f, columns[1]),
        None => {}
    }
}

fn render_no_evaluation(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "This artifact records no evaluation metrics.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Predictions come from an unevaluated model.",
            MedicalTheme::danger(),
        )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Model Evaluation ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_evaluation(f: &mut Frame, area: Rect, eval: &ModelEvaluation) {
    let block = Block::default()
        .title(Span::styled(
            " Model Evaluation (on test set) ",
            MedicalTheme::subtitle(),
        ))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Accuracy
            Constraint::Length(4), // Report
            Constraint::Min(0),    // Confusion matrix
        ])
        .margin(1)
        .split(inner);

    let accuracy = Paragraph::new(Line::from(vec![
        Span::styled("Accuracy: ", MedicalTheme::text_secondary()),
        Span::styled(
            format!("{:.2}%", eval.accuracy * 100.0),
            MedicalTheme::text(),
        ),
        Span::styled(
            format!("  (n={})", eval.support()),
            MedicalTheme::text_muted(),
        ),
    ]));
    f.render_widget(accuracy, chunks[0]);

    let header = Row::new(vec!["class", "precision", "recall", "f1-score"])
        .style(MedicalTheme::key_hint());
    let report_rows: Vec<Row> = eval
        .classes
        .iter()
        .enumerate()
        .map(|(class, m)| {
            Row::new(vec![
                class.to_string(),
                format!("{:.2}", m.precision),
                format!("{:.2}", m.recall),
                format!("{:.2}", m.f1),
            ])
        })
        .collect();
    let report = Table::new(report_rows, [Constraint::Ratio(1, 4); 4])
        .header(header)
        .style(MedicalTheme::text());
    f.render_widget(report, chunks[1]);

    let [[tn, fp], [fn_, tp]] = eval.confusion_matrix;
    let matrix = Paragraph::new(vec![
        Line::from(Span::styled("Confusion Matrix", MedicalTheme::text_secondary())),
        Line::from(Span::styled(
            "            pred 0   pred 1",
            MedicalTheme::text_muted(),
        )),
        Line::from(Span::styled(
            format!("  actual 0  {tn:>6}   {fp:>6}"),
            MedicalTheme::text(),
        )),
        Line::from(Span::styled(
            format!("  actual 1  {fn_:>6}   {tp:>6}"),
            MedicalTheme::text(),
        )),
    ]);
    f.render_widget(matrix, chunks[2]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_inference_footer(f: &mut Frame, area: Rect, state: &InferenceState, show_evaluation: bool) {
    let content = match state {
        InferenceState::Complete { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Edit ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Patient ", MedicalTheme::key_desc()),
            Span::styled("[E] ", MedicalTheme::key_hint()),
            Span::styled(
                if show_evaluation {
                    "Hide Evaluation "
                } else {
                    "Show Evaluation "
                },
                MedicalTheme::key_desc(),
            ),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
