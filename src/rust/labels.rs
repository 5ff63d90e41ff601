/// Career labels in the class-index order the classifier was trained with.
pub const CAREER_LABELS: [&str; 17] = [
    "Artist",
    "Game Developer",
    "Real Estate Developer",
    "Business Owner",
    "Designer",
    "Doctor",
    "Engineer",
    "Teacher",
    "Lawyer",
    "Psychologist",
    "Scientist",
    "Chef",
    "Architect",
    "Writer",
    "Athlete",
    "Musician",
    "Entrepreneur",
];

pub const CLASS_COUNT: usize = CAREER_LABELS.len();

pub fn default_labels() -> Vec<String> {
    CAREER_LABELS.iter().map(|l| l.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_table_ends() {
        assert_eq!(CLASS_COUNT, 17);
        assert_eq!(CAREER_LABELS[0], "Artist");
        assert_eq!(CAREER_LABELS[16], "Entrepreneur");
    }
}
