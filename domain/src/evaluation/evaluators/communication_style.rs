use crate::evaluation::context::{EvaluationContext, TurnView, average_criteria};
use crate::evaluation::dimension::{CriterionScore, Dimension, DimensionScore};
use crate::evaluation::evaluator::Evaluator;
use crate::evaluation::text;
use crate::scenario::Scenario;
use regex::Regex;
use std::sync::LazyLock;

const PROFESSIONALISM: f64 = 0.3;
const CLARITY: f64 = 0.2;
const TONE: f64 = 0.3;
const ADAPTABILITY: f64 = 0.2;

static CONTRACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(can't|won't|don't|isn't|aren't|wasn't|weren't|hasn't|haven't|hadn't|didn't|wouldn't|couldn't|shouldn't)\b",
    )
    .expect("valid regex")
});
static COMPLEX_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w{12,}\b").expect("valid regex"));

const UNPROFESSIONAL: &[&str] = &[
    "hey there", "yo", "what's up", "kinda", "sorta", "gonna", "wanna", "dunno", "ya know",
    "basically", "stuff", "ok", "k",
];

const BUSINESS_LANGUAGE: &[&str] = &[
    "thank you", "please", "appreciate", "value", "assist", "help", "provide", "information",
    "understand", "solution", "service", "available", "options", "process", "team",
    "comprehensive", "training", "support", "package", "implementation", "guide", "interest",
];

const STRUCTURE_MARKERS: &[&str] = &[
    "first", "second", "finally", "in summary", "to summarize", "in conclusion",
];

const PROFESSIONAL_TONE: &[&str] = &[
    "would like to", "we recommend", "suggest", "advise", "please consider", "our team",
    "we provide", "available", "standard", "typically", "during which", "through", "for your",
    "our ",
];
const FRIENDLY_TONE: &[&str] = &["happy to", "glad to", "look forward to", "excited", "wonderful"];
const FORMAL_TONE: &[&str] = &[
    "we regret to inform", "please be advised", "kindly note", "we request", "formally",
];
const EMPATHETIC_TONE: &[&str] = &[
    "understand", "appreciate", "recognize", "know that", "hear your concern",
];
const DIRECT_TONE: &[&str] = &["need to", "must", "should", "require", "necessary"];

fn tone_lexicon(tone: &str) -> &'static [&'static str] {
    match tone {
        "friendly" => FRIENDLY_TONE,
        "formal" => FORMAL_TONE,
        "empathetic" => EMPATHETIC_TONE,
        "direct" => DIRECT_TONE,
        _ => PROFESSIONAL_TONE,
    }
}

/// Professionalism, clarity, tone fit and adaptation to the customer
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunicationStyleEvaluator;

impl CommunicationStyleEvaluator {
    fn score_turn(
        &self,
        scenario: &Scenario,
        view: &TurnView<'_>,
        feedback: &mut Vec<String>,
    ) -> Vec<CriterionScore> {
        let content = view.final_content();
        let expected_tone = scenario
            .ground_truth
            .expected_tone
            .as_deref()
            .unwrap_or("professional")
            .to_lowercase();

        if content.trim().is_empty() {
            return vec![
                CriterionScore::new("professionalism", PROFESSIONALISM, 0.0),
                CriterionScore::new("clarity", CLARITY, 0.0),
                CriterionScore::new("tone", TONE, 0.0),
                CriterionScore::new("adaptability", ADAPTABILITY, 0.0),
            ];
        }

        let tone = tone_score(content, &expected_tone, scenario);
        if tone == 0.0 {
            feedback.push(format!(
                "turn {}: tone unsuited to the customer context",
                view.index + 1
            ));
        }

        vec![
            CriterionScore::new(
                "professionalism",
                PROFESSIONALISM,
                professionalism(content, expected_tone == "formal"),
            ),
            CriterionScore::new("clarity", CLARITY, clarity(content)),
            CriterionScore::new("tone", TONE, tone),
            CriterionScore::new(
                "adaptability",
                ADAPTABILITY,
                adaptability(
                    content,
                    &view.turn.user_message,
                    &scenario.ground_truth.communication_guidelines,
                ),
            ),
        ]
    }
}

impl Evaluator for CommunicationStyleEvaluator {
    fn dimension(&self) -> Dimension {
        Dimension::CommunicationStyle
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> DimensionScore {
        let mut feedback = Vec::new();
        let per_turn: Vec<_> = ctx
            .turns()
            .iter()
            .map(|view| self.score_turn(ctx.scenario, view, &mut feedback))
            .collect();
        let criteria = average_criteria(&per_turn);
        for criterion in &criteria {
            if criterion.score < 0.5 {
                feedback.push(format!("weak {} ({:.2})", criterion.name, criterion.score));
            }
        }
        if feedback.is_empty() {
            feedback.push("Communication was professional and clear".to_string());
        }
        DimensionScore::from_criteria(self.dimension(), criteria, feedback)
    }
}

fn professionalism(content: &str, formal: bool) -> f64 {
    let mut unprofessional = text::count_phrases(content, UNPROFESSIONAL);
    if formal && CONTRACTION.find_iter(&content.to_lowercase()).count() > 3 {
        unprofessional += 1;
    }
    let business = text::count_phrases(content, BUSINESS_LANGUAGE);
    match (unprofessional, business) {
        (0, b) if b >= 3 => 1.0,
        (0, b) if b >= 1 => 2.0 / 3.0,
        (0..=1, b) if b >= 1 => 1.0 / 3.0,
        _ => 0.0,
    }
}

fn clarity(content: &str) -> f64 {
    let sentences = text::sentences(content);
    if sentences.is_empty() {
        return 0.0;
    }
    let word_count = text::words(content).len();
    let avg_sentence = sentences
        .iter()
        .map(|s| text::words(s).len())
        .sum::<usize>() as f64
        / sentences.len() as f64;
    let complex_ratio = if word_count == 0 {
        0.0
    } else {
        COMPLEX_WORD.find_iter(content).count() as f64 / word_count as f64
    };
    let structured = text::count_fragments(content, STRUCTURE_MARKERS) > 0;

    let base: f64 = if (10.0..=20.0).contains(&avg_sentence) && complex_ratio < 0.05 {
        1.0
    } else if (8.0..=30.0).contains(&avg_sentence) && complex_ratio < 0.15 {
        0.75
    } else if avg_sentence <= 35.0 && complex_ratio < 0.2 {
        0.5
    } else {
        0.0
    };
    if structured && base < 1.0 {
        base + 0.25
    } else {
        base
    }
}

fn tone_score(content: &str, expected_tone: &str, scenario: &Scenario) -> f64 {
    let matches = text::count_fragments(content, tone_lexicon(expected_tone));

    let customer_type = scenario.customer.customer_type.as_deref().unwrap_or("");
    let industry = scenario
        .customer
        .industry
        .as_deref()
        .unwrap_or(scenario.industry.as_str())
        .to_lowercase();
    let friendly = text::count_fragments(content, FRIENDLY_TONE) > 0;
    let inappropriate = (customer_type.eq_ignore_ascii_case("enterprise") && friendly)
        || (industry == "financial" && friendly && expected_tone != "friendly")
        || (industry == "healthcare" && text::count_fragments(content, EMPATHETIC_TONE) == 0);

    match (inappropriate, matches) {
        (true, _) => 0.0,
        (false, m) if m >= 2 => 1.0,
        (false, 1) => 2.0 / 3.0,
        (false, _) => 1.0 / 3.0,
    }
}

fn adaptability(content: &str, user_message: &str, guidelines: &[String]) -> f64 {
    let customer_terms = text::long_word_set(user_message);
    let response_terms = text::long_word_set(content);
    let adaptation = if customer_terms.is_empty() {
        0.0
    } else {
        customer_terms.intersection(&response_terms).count() as f64 / customer_terms.len() as f64
    };
    let followed = guidelines
        .iter()
        .filter(|g| guideline_followed(content, g))
        .count();
    let guideline_ratio = text::ratio(followed, guidelines.len());

    if adaptation >= 0.3 && guideline_ratio >= 0.8 {
        1.0
    } else if adaptation >= 0.2 && guideline_ratio >= 0.5 {
        0.75
    } else if adaptation >= 0.1 || guideline_ratio >= 0.5 {
        0.5
    } else {
        0.0
    }
}

/// Negative guidelines ("avoid jargon") pass when their terms are absent;
/// positive ones when at least 30% of their terms appear.
fn guideline_followed(content: &str, guideline: &str) -> bool {
    let lower_guideline = guideline.to_lowercase();
    let terms = text::long_word_set(guideline);
    let lower = content.to_lowercase();
    let negative = ["avoid", "don't", "do not", "never"]
        .iter()
        .any(|marker| lower_guideline.contains(marker));
    if negative {
        terms
            .iter()
            .filter(|t| !matches!(t.as_str(), "avoid" | "dont" | "never" | "should"))
            .all(|t| !lower.contains(t.as_str()))
    } else if terms.is_empty() {
        true
    } else {
        let response_terms = text::long_word_set(content);
        terms.intersection(&response_terms).count() as f64 / terms.len() as f64 >= 0.3
    }
}
