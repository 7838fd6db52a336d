//! Canned follow-up question bank
//!
//! Follow-ups probe whether brand presence persists organically, so they must
//! never contain the brand name. Selection is by query category and level.

use crate::model::QueryCategory;

const INFORMATIONAL: [&str; 3] = [
    "What other options should I consider?",
    "Which of these would you say is the most reliable, and why?",
    "Is there anything important I should know before choosing one?",
];

const TRANSACTIONAL: [&str; 3] = [
    "Where can I actually get this, and what should I expect to pay?",
    "Are there cheaper alternatives worth looking at?",
    "What do reviews generally say about these options?",
];

const COMPARISON: [&str; 3] = [
    "Can you summarize the main differences in a short list?",
    "If you had to pick just one, which would it be?",
    "What would make you change that recommendation?",
];

/// Follow-up question for a given category and level (1-3)
pub fn follow_up_question(category: QueryCategory, level: u8) -> &'static str {
    let bank = match category {
        QueryCategory::Informational => &INFORMATIONAL,
        QueryCategory::Transactional => &TRANSACTIONAL,
        QueryCategory::Comparison => &COMPARISON,
    };
    let index = usize::from(level.clamp(1, 3)) - 1;
    bank[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_select_distinct_questions() {
        let q1 = follow_up_question(QueryCategory::Informational, 1);
        let q2 = follow_up_question(QueryCategory::Informational, 2);
        let q3 = follow_up_question(QueryCategory::Informational, 3);
        assert_ne!(q1, q2);
        assert_ne!(q2, q3);
    }

    #[test]
    fn out_of_range_levels_clamp_into_the_bank() {
        assert_eq!(
            follow_up_question(QueryCategory::Comparison, 0),
            COMPARISON[0]
        );
        assert_eq!(
            follow_up_question(QueryCategory::Comparison, 9),
            COMPARISON[2]
        );
    }

    #[test]
    fn questions_carry_no_brand_placeholder() {
        for category in [
            QueryCategory::Informational,
            QueryCategory::Transactional,
            QueryCategory::Comparison,
        ] {
            for level in 1..=3 {
                let question = follow_up_question(category, level);
                assert!(!question.contains('{'));
                assert!(!question.is_empty());
            }
        }
    }
}
