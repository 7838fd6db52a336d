//! Prompts for delegate-AI response scoring

/// System prompt for the scoring model
pub const SCORING_SYSTEM_PROMPT: &str = r#"You are a brand visibility analyst.

You score how an AI assistant's answer treats a specific brand relative to
competitors. You must judge only the text you are given.

Your output must be a single strict JSON object and nothing else. No prose,
no markdown, no code fences."#;

/// Build the scoring prompt embedding the brand, domain and raw response.
///
/// The numeric instructions mirror the lexical evaluator's definitions so the
/// two strategies stay comparable.
pub fn build_scoring_prompt(brand_terms: &[String], domain: &str, response: &str) -> String {
    format!(
        r#"Score the following AI answer for the brand below.

Brand names to look for: {brands}
Brand domain: {domain}

Return a JSON object with exactly these fields, every value a number 0-100:

- "visibility": 50 if any brand name appears, plus 50 if the domain appears.
  Only the values 0, 50 or 100 are valid.
- "sentiment": tone of the sentences that mention the brand or domain.
  50 is neutral, 100 is very positive, 0 is very negative. Use 0 if the
  brand is not mentioned at all.
- "ranking": position of the brand in any enumerated or delimited list:
  1st = 100, 2nd = 80, 3rd = 60, 4th = 40, 5th = 20, otherwise 0.
- "recommendation": overall strength of the answer as a recommendation of
  the brand, weighing visibility, sentiment and ranking. Use 0 if the brand
  is not mentioned.

Answer to score:
---
{response}
---"#,
        brands = brand_terms.join(", "),
        domain = domain,
        response = response,
    )
}
