pub const SYSTEM_PROMPT: &str = "You are a consumer protection expert. You analyze promotional offers and fine print \
to help people make informed decisions. Always respond with valid JSON.";

const ANALYSIS_TEMPLATE: &str = r#"You are a consumer protection expert analyzing promotional offers and their fine print. Your job is to help regular people understand what they're really signing up for.

You will be given text scraped from a promotional website including:
1. Main promotional content
2. Fine print and terms of service
3. Any additional context from related pages

INPUT:
{input_text}

Respond with a single JSON object with exactly these fields:

{
  "offerSummary": "2-3 sentences on what the promotion is offering",
  "plainEnglishSummary": "The fine print explained so a 5th grader could understand it",
  "hiddenRequirements": ["each hidden requirement, minimum spend, auto-renewal or eligibility limit"],
  "redFlags": ["each serious concern: cancellation difficulty, unexpected fees, misleading claims"],
  "riskScore": <number 0-100>,
  "clarityScore": <number 0-100>,
  "cancellationDifficulty": "<Easy|Medium|Hard>",
  "riskScoreExplanation": "why this risk score",
  "clarityScoreExplanation": "why this clarity score"
}

SCORING GUIDELINES:
- riskScore: 0-30 low risk and straightforward; 31-60 some concerning terms; 61-100 significant potential for harm or regret.
- clarityScore: 0-30 unclear, deceptive or confusing; 31-60 moderately clear; 61-100 clear and transparent.
- cancellationDifficulty: Easy = cancel online anytime; Medium = requires a call or some effort; Hard = long waits, retention tactics or an unclear process.

Be honest and direct. If something seems designed to trick people, say so.

Respond ONLY with valid JSON, no additional text."#;

/// User prompt with the scraped text embedded
pub fn analysis_prompt(input_text: &str) -> String {
    ANALYSIS_TEMPLATE.replace("{input_text}", input_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_input_once() {
        let prompt = analysis_prompt("Auto-renews at $14.99");
        assert_eq!(prompt.matches("Auto-renews at $14.99").count(), 1);
        assert!(!prompt.contains("{input_text}"));
        assert!(prompt.contains("\"cancellationDifficulty\""));
    }
}
