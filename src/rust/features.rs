//! Feature vector assembly.
//!
//! The column order below is shared with the scaler and classifier
//! artifacts. Reordering it does not fail loudly; it silently corrupts every
//! prediction, so any change here needs freshly fitted artifacts.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::profile::{answer_code, Profile, Subject, SUBJECT_COUNT};

pub const FEATURE_COUNT: usize = 14;

/// Column names in feature-vector order.
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    "gender",
    "part_time_job",
    "absence_days",
    "extracurricular_activities",
    "weekly_self_study_hours",
    "math_score",
    "history_score",
    "physics_score",
    "chemistry_score",
    "biology_score",
    "english_score",
    "geography_score",
    "total_score",
    "average_score",
];

const FIRST_SCORE_INDEX: usize = 5;

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.get(i))
    }

    /// One-row batch in the shape the scaler expects.
    pub fn to_batch(&self) -> Array2<f32> {
        Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| self.values[j])
    }
}

/// Maps a profile onto the fixed 14-column layout.
///
/// Pure: the same profile always yields the same vector. Bounds are not
/// checked here; see [`Profile::validate`].
pub fn assemble_features(profile: &Profile) -> FeatureVector {
    let mut values = [0.0f32; FEATURE_COUNT];
    values[0] = f32::from(profile.gender.code());
    values[1] = f32::from(answer_code(profile.part_time_job));
    values[2] = f32::from(profile.absence_days);
    values[3] = f32::from(answer_code(profile.extracurricular_activities));
    values[4] = f32::from(profile.weekly_self_study_hours);
    for subject in Subject::ALL {
        values[FIRST_SCORE_INDEX + subject.index()] = f32::from(profile.score(subject));
    }

    let total = profile.total_score();
    values[FEATURE_COUNT - 2] = total as f32;
    values[FEATURE_COUNT - 1] = total as f32 / SUBJECT_COUNT as f32;

    FeatureVector::from_values(values)
}
