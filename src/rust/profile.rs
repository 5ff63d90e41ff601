//! The student profile collected by the form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

pub const MAX_ABSENCE_DAYS: u16 = 365;
pub const MAX_STUDY_HOURS: u8 = 168;
pub const MAX_SCORE: u8 = 100;
pub const DEFAULT_STUDY_HOURS: u8 = 10;
pub const DEFAULT_SCORE: u8 = 75;
pub const SUBJECT_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

impl Gender {
    /// Numeric code the scaler and classifier were fitted with.
    pub fn code(self) -> u8 {
        match self {
            Gender::Male => 0,
            Gender::Female => 1,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "Male"),
            Gender::Female => write!(f, "Female"),
        }
    }
}

impl FromStr for Gender {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            other => Err(ClassifierError::Validation(format!(
                "Unknown gender '{}', expected Male or Female",
                other
            ))),
        }
    }
}

/// Parses a Yes/No answer.
pub fn parse_answer(s: &str) -> Result<bool, ClassifierError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" => Ok(false),
        other => Err(ClassifierError::Validation(format!(
            "Unknown answer '{}', expected Yes or No",
            other
        ))),
    }
}

/// Code for a Yes/No answer: Yes is 1, No is 0.
pub fn answer_code(answer: bool) -> u8 {
    u8::from(answer)
}

pub fn answer_label(answer: bool) -> &'static str {
    if answer {
        "Yes"
    } else {
        "No"
    }
}

/// Subjects in the order their scores appear in the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subject {
    Math,
    History,
    Physics,
    Chemistry,
    Biology,
    English,
    Geography,
}

impl Subject {
    pub const ALL: [Subject; SUBJECT_COUNT] = [
        Subject::Math,
        Subject::History,
        Subject::Physics,
        Subject::Chemistry,
        Subject::Biology,
        Subject::English,
        Subject::Geography,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Subject::Math => "Math",
            Subject::History => "History",
            Subject::Physics => "Physics",
            Subject::Chemistry => "Chemistry",
            Subject::Biology => "Biology",
            Subject::English => "English",
            Subject::Geography => "Geography",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One student's answers. Built per interaction and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub gender: Gender,
    pub part_time_job: bool,
    pub absence_days: u16,
    pub extracurricular_activities: bool,
    pub weekly_self_study_hours: u8,
    /// Scores indexed by [`Subject::index`].
    pub scores: [u8; SUBJECT_COUNT],
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            part_time_job: true,
            absence_days: 0,
            extracurricular_activities: true,
            weekly_self_study_hours: DEFAULT_STUDY_HOURS,
            scores: [DEFAULT_SCORE; SUBJECT_COUNT],
        }
    }
}

impl Profile {
    pub fn score(&self, subject: Subject) -> u8 {
        self.scores[subject.index()]
    }

    pub fn set_score(&mut self, subject: Subject, score: u8) {
        self.scores[subject.index()] = score;
    }

    pub fn with_score(mut self, subject: Subject, score: u8) -> Self {
        self.set_score(subject, score);
        self
    }

    pub fn total_score(&self) -> u32 {
        self.scores.iter().map(|&s| u32::from(s)).sum()
    }

    /// Checks every bounded field against the form's limits.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.absence_days > MAX_ABSENCE_DAYS {
            return Err(ClassifierError::Validation(format!(
                "Absence days must be between 0 and {}, got {}",
                MAX_ABSENCE_DAYS, self.absence_days
            )));
        }
        if self.weekly_self_study_hours > MAX_STUDY_HOURS {
            return Err(ClassifierError::Validation(format!(
                "Weekly self-study hours must be between 0 and {}, got {}",
                MAX_STUDY_HOURS, self.weekly_self_study_hours
            )));
        }
        for subject in Subject::ALL {
            let score = self.score(subject);
            if score > MAX_SCORE {
                return Err(ClassifierError::Validation(format!(
                    "{} score must be between 0 and {}, got {}",
                    subject, MAX_SCORE, score
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_form() {
        let profile = Profile::default();
        assert_eq!(profile.gender, Gender::Male);
        assert!(profile.part_time_job);
        assert_eq!(profile.absence_days, 0);
        assert!(profile.extracurricular_activities);
        assert_eq!(profile.weekly_self_study_hours, 10);
        assert!(profile.scores.iter().all(|&s| s == 75));
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_parsing() {
        assert_eq!("Female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" m ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("other".parse::<Gender>().is_err());

        assert!(parse_answer("YES").unwrap());
        assert!(!parse_answer("n").unwrap());
        assert!(matches!(parse_answer("maybe"), Err(ClassifierError::Validation(_))));
    }

    #[test]
    fn test_codes() {
        assert_eq!(Gender::Male.code(), 0);
        assert_eq!(Gender::Female.code(), 1);
        assert_eq!(answer_code(true), 1);
        assert_eq!(answer_code(false), 0);
    }

    #[test]
    fn test_bounds() {
        let profile = Profile {
            absence_days: 366,
            ..Profile::default()
        };
        assert!(profile.validate().is_err());

        let profile = Profile {
            weekly_self_study_hours: 169,
            ..Profile::default()
        };
        assert!(profile.validate().is_err());

        let profile = Profile::default().with_score(Subject::Physics, 101);
        let err = profile.validate().unwrap_err();
        assert!(err.to_string().contains("Physics"));

        let edge = Profile {
            absence_days: 365,
            weekly_self_study_hours: 168,
            scores: [100; SUBJECT_COUNT],
            ..Profile::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_subject_order() {
        let names: Vec<_> = Subject::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["Math", "History", "Physics", "Chemistry", "Biology", "English", "Geography"]
        );
        for (i, subject) in Subject::ALL.iter().enumerate() {
            assert_eq!(subject.index(), i);
        }
    }
}
