use rand::Rng;

pub const HR_QUESTIONS: [&str; 10] = [
    "Tell me about yourself.",
    "What are your strengths and weaknesses?",
    "Why do you want to intern at this company?",
    "Describe a challenge you’ve faced and how you overcame it.",
    "Where do you see yourself in 5 years?",
    "What do you know about our company?",
    "Tell me about a time you worked in a team.",
    "How do you handle criticism?",
    "What’s a recent project you’re proud of?",
    "Why should we hire you?",
];

/// Uniform draw over the question list; the current question may come up again.
pub fn random_question_index<R: Rng + ?Sized>(rng: &mut R) -> usize {
    rng.random_range(0..HR_QUESTIONS.len())
}

pub fn question(index: usize) -> &'static str {
    HR_QUESTIONS[index % HR_QUESTIONS.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_draws_stay_within_list() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(random_question_index(&mut rng) < HR_QUESTIONS.len());
        }
    }

    #[test]
    fn test_every_question_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [false; HR_QUESTIONS.len()];
        for _ in 0..2000 {
            seen[random_question_index(&mut rng)] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_question_lookup() {
        assert_eq!(question(0), "Tell me about yourself.");
        assert_eq!(question(9), "Why should we hire you?");
    }
}
