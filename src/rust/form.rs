//! Terminal form: prompts for a profile and renders ranked careers.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::classifier::{ClassifierError, Prediction, Predictor};
use crate::profile::{
    answer_label, parse_answer, Gender, Profile, Subject, MAX_ABSENCE_DAYS, MAX_SCORE,
    MAX_STUDY_HOURS,
};

/// Cells in a full confidence bar.
pub const BAR_WIDTH: usize = 20;

/// Reads a [`Profile`] field by field from any line-oriented input.
pub struct FormReader<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> FormReader<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Prompts until a line parses. Empty input picks `default`. Returns
    /// `Ok(None)` at end of input.
    fn ask<T, F>(&mut self, prompt: &str, default: T, parse: F) -> io::Result<Option<T>>
    where
        T: Display,
        F: Fn(&str) -> Result<T, ClassifierError>,
    {
        loop {
            write!(self.output, "{} ({}): ", prompt, default)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if line.is_empty() {
                return Ok(Some(default));
            }
            match parse(line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.output, "  {}", e)?,
            }
        }
    }

    fn ask_number<T>(&mut self, prompt: &str, default: T, max: T) -> io::Result<Option<T>>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        let label = format!("{} [0-{}]", prompt, max);
        self.ask(&label, default, |s| {
            let value: T = s.parse().map_err(|_| {
                ClassifierError::Validation(format!("'{}' is not a whole number", s))
            })?;
            if value > max {
                return Err(ClassifierError::Validation(format!(
                    "{} must be between 0 and {}",
                    prompt, max
                )));
            }
            Ok(value)
        })
    }

    fn ask_answer(&mut self, prompt: &str, default: bool) -> io::Result<Option<bool>> {
        let label = format!("{} [Yes/No]", prompt);
        Ok(self
            .ask(&label, answer_label(default), |s| {
                parse_answer(s).map(answer_label)
            })?
            .map(|answer| answer == "Yes"))
    }

    /// Collects a full profile, starting from `defaults`.
    pub fn read_profile(&mut self, defaults: &Profile) -> io::Result<Option<Profile>> {
        writeln!(self.output, "\nPersonal & Academic Profile")?;
        let mut profile = defaults.clone();

        let Some(gender) = self.ask("Gender [Male/Female]", defaults.gender, Gender::from_str)? else {
            return Ok(None);
        };
        profile.gender = gender;

        let Some(job) = self.ask_answer("Has Part-Time Job?", defaults.part_time_job)? else {
            return Ok(None);
        };
        profile.part_time_job = job;

        let Some(days) = self.ask_number("Absence Days", defaults.absence_days, MAX_ABSENCE_DAYS)? else {
            return Ok(None);
        };
        profile.absence_days = days;

        let Some(extra) = self.ask_answer(
            "In Extracurricular Activities?",
            defaults.extracurricular_activities,
        )?
        else {
            return Ok(None);
        };
        profile.extracurricular_activities = extra;

        let Some(hours) = self.ask_number(
            "Weekly Self-Study Hours",
            defaults.weekly_self_study_hours,
            MAX_STUDY_HOURS,
        )?
        else {
            return Ok(None);
        };
        profile.weekly_self_study_hours = hours;

        writeln!(self.output, "\nAcademic Performance")?;
        for subject in Subject::ALL {
            let prompt = format!("{} Score", subject);
            let Some(score) = self.ask_number(&prompt, defaults.score(subject), MAX_SCORE)? else {
                return Ok(None);
            };
            profile.set_score(subject, score);
        }

        Ok(Some(profile))
    }

    /// Asks whether to run another prediction. End of input means no.
    pub fn confirm_another(&mut self) -> io::Result<bool> {
        Ok(self
            .ask("\nPredict again? [Yes/No]", "No", |s| {
                parse_answer(s).map(answer_label)
            })?
            .map(|answer| answer == "Yes")
            .unwrap_or(false))
    }
}

/// A bar of `width` cells, filled in proportion to `probability`.
pub fn confidence_bar(probability: f32, width: usize) -> String {
    let filled = ((probability.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_predictions(predictions: &[Prediction]) -> String {
    let mut out = String::from("Top Career Recommendations\n");
    let label_width = predictions
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    for p in predictions {
        out.push_str(&format!(
            "{:>2}. {:<width$}  {:>5.1}% confidence  {}\n",
            p.rank,
            p.label,
            p.probability * 100.0,
            confidence_bar(p.probability, BAR_WIDTH),
            width = label_width
        ));
    }
    out
}

/// Runs one interaction and writes either the ranking or the error.
///
/// Prediction failures are reported to `out` and returned as `Ok(false)`;
/// only a failure to write is an `Err`.
pub fn respond<W: Write>(predictor: &Predictor, profile: &Profile, out: &mut W) -> io::Result<bool> {
    match predictor.predict_profile(profile) {
        Ok(predictions) => {
            write!(out, "\n{}", render_predictions(&predictions))?;
            writeln!(
                out,
                "These are model-generated suggestions based on the data you entered."
            )?;
            Ok(true)
        }
        Err(e) => {
            log::warn!("Interaction failed: {}", e);
            writeln!(out, "\n{}", e)?;
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read(input: &str) -> (Option<Profile>, String) {
        let mut form = FormReader::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let profile = form.read_profile(&Profile::default()).unwrap();
        let (_, output) = form.into_inner();
        (profile, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_empty_answers_take_defaults() {
        let (profile, _) = read(&"\n".repeat(12));
        assert_eq!(profile, Some(Profile::default()));
    }

    #[test]
    fn test_full_answers() {
        let input = "female\nno\n12\nyes\n20\n90\n80\n70\n60\n50\n40\n30\n";
        let (profile, _) = read(input);
        let profile = profile.unwrap();
        assert_eq!(profile.gender, Gender::Female);
        assert!(!profile.part_time_job);
        assert_eq!(profile.absence_days, 12);
        assert!(profile.extracurricular_activities);
        assert_eq!(profile.weekly_self_study_hours, 20);
        assert_eq!(profile.scores, [90, 80, 70, 60, 50, 40, 30]);
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let input = format!("robot\nmale\n\n400\n3\n{}", "\n".repeat(9));
        let (profile, output) = read(&input);
        let profile = profile.unwrap();
        assert_eq!(profile.absence_days, 3);
        assert!(output.contains("Unknown gender 'robot'"));
        assert!(output.contains("Absence Days must be between 0 and 365"));
    }

    #[test]
    fn test_end_of_input_stops() {
        let (profile, _) = read("male\nyes\n");
        assert!(profile.is_none());
    }

    #[test]
    fn test_confidence_bar() {
        assert_eq!(confidence_bar(0.0, 4), "░░░░");
        assert_eq!(confidence_bar(0.5, 4), "██░░");
        assert_eq!(confidence_bar(1.7, 4), "████");
    }

    #[test]
    fn test_render_predictions() {
        let rendered = render_predictions(&[
            Prediction {
                rank: 1,
                label: "Engineer".into(),
                probability: 0.423,
            },
            Prediction {
                rank: 2,
                label: "Doctor".into(),
                probability: 0.2,
            },
        ]);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with(" 1. Engineer"));
        assert!(lines[1].contains("42.3% confidence"));
        assert!(lines[2].contains("20.0% confidence"));
    }
}
