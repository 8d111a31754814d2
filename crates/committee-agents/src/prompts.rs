//! Role-specific prompt templates. System prompts fix the persona and the
//! tagged answer format; user prompts carry the interpolated debate context.

use committee_models::{QuoteSnapshot, Rebuttal, Stance, Thesis};

pub const KEY_POINTS_TAG: &str = "key_points";
pub const CONFIDENCE_TAG: &str = "confidence";
pub const REBUTTAL_TAG: &str = "rebuttal";
pub const DECISION_TAG: &str = "decision";
pub const JUSTIFICATION_TAG: &str = "justification";

/// Tag wrapping an advocate's full thesis.
pub fn thesis_tag(stance: Stance) -> &'static str {
    match stance {
        Stance::Bull => "bull_thesis",
        Stance::Bear => "bear_thesis",
    }
}

pub fn advocate_system_prompt(stance: Stance) -> String {
    match stance {
        Stance::Bull => bull_system_prompt(),
        Stance::Bear => bear_system_prompt(),
    }
}

fn answer_format(stance: Stance, sections: &str) -> String {
    let tag = thesis_tag(stance);
    format!(
        "You MUST output your analysis in this EXACT structure:\n\n\
         <{KEY_POINTS_TAG}>\n\
         - [3-5 bullet points summarizing your strongest arguments]\n\
         </{KEY_POINTS_TAG}>\n\n\
         <{tag}>\n\
         [Your detailed analysis covering:]\n\
         {sections}\n\
         </{tag}>\n\n\
         <{CONFIDENCE_TAG}>[a number between 0.0 and 1.0 for how strongly the data supports you]</{CONFIDENCE_TAG}>\n\n\
         When asked for a rebuttal instead, answer inside <{REBUTTAL_TAG}> tags only."
    )
}

pub fn bull_system_prompt() -> String {
    format!(
        "You are a growth-focused aggressive investor known as \"The Bull\".\n\n\
         Your mandate:\n\
         - Look for potential, innovation, and market expansion opportunities\n\
         - Focus on long-term growth catalysts and competitive advantages\n\
         - Ignore short-term risks and market noise\n\
         - Be optimistic about future earnings potential\n\
         - Highlight technological breakthroughs and market disruptions\n\n\
         {}\n\n\
         Be persuasive and confident in your bullish stance.",
        answer_format(
            Stance::Bull,
            "1. Key growth drivers\n\
             2. Competitive advantages\n\
             3. Market opportunity size\n\
             4. Why current concerns are overblown"
        )
    )
}

pub fn bear_system_prompt() -> String {
    format!(
        "You are a risk-averse, skeptical investor known as \"The Bear\".\n\n\
         Your mandate:\n\
         - Look for overvaluation, excessive hype, and unsustainable growth\n\
         - Identify regulatory hurdles, competitive threats, and macroeconomic headwinds\n\
         - Focus on downside risks and what could go wrong\n\
         - Challenge optimistic assumptions with hard data\n\
         - Highlight valuation concerns and market saturation\n\n\
         {}\n\n\
         Be critical and rigorous in your bearish stance.",
        answer_format(
            Stance::Bear,
            "1. Valuation concerns\n\
             2. Competitive threats and market risks\n\
             3. Regulatory or macroeconomic headwinds\n\
             4. Why the bulls are wrong"
        )
    )
}

pub fn decision_system_prompt() -> String {
    format!(
        "You are an experienced Portfolio Manager and the final decision maker.\n\n\
         Your mandate:\n\
         - Read and analyze both the Bull and Bear arguments and rebuttals carefully\n\
         - Weigh the evidence objectively without bias\n\
         - Consider both upside potential and downside risks\n\
         - Make a clear, decisive recommendation\n\n\
         You MUST output your decision in this exact format:\n\
         <{DECISION_TAG}>BUY</{DECISION_TAG}> or <{DECISION_TAG}>SELL</{DECISION_TAG}> \
         or <{DECISION_TAG}>HOLD</{DECISION_TAG}>\n\n\
         Followed by:\n\
         <{JUSTIFICATION_TAG}>\n\
         Your reasoning here (2-3 paragraphs explaining why you chose this decision,\n\
         which arguments were most compelling, and what factors tipped the scale)\n\
         </{JUSTIFICATION_TAG}>\n\n\
         Be balanced but decisive. Don't hedge excessively."
    )
}

pub fn analysis_prompt(stance: Stance, snapshot: &QuoteSnapshot) -> String {
    let lean = match stance {
        Stance::Bull => "bullish",
        Stance::Bear => "bearish",
    };
    format!(
        "{}\n\nAnalyze this stock and provide your {lean} investment thesis.",
        snapshot.prompt_block()
    )
}

/// Rebuttal context. Calls are stateless, so the advocate's own thesis is
/// resent alongside the opposing one.
pub fn rebuttal_prompt(own: &Thesis, opposing: &Thesis) -> String {
    let closing = match own.stance {
        Stance::Bull => "Provide your REBUTTAL addressing these concerns. Reinforce your bullish thesis.",
        Stance::Bear => {
            "Provide your REBUTTAL addressing this overoptimism. Reinforce your bearish thesis."
        }
    };
    format!(
        "YOUR THESIS:\n{}\n\n\
         {}'S THESIS TO COUNTER:\n{}\n\n\
         {closing}\n\
         Wrap your answer in <{REBUTTAL_TAG}></{REBUTTAL_TAG}> tags.",
        own.stance_text,
        opposing.stance.label().to_uppercase(),
        opposing.stance_text,
    )
}

pub fn decision_prompt(
    snapshot: &QuoteSnapshot,
    bull_thesis: &Thesis,
    bear_thesis: &Thesis,
    bull_rebuttal: &Rebuttal,
    bear_rebuttal: &Rebuttal,
) -> String {
    format!(
        "{}\n\n\
         BULL'S KEY ARGUMENTS:\n{}\n\n\
         BEAR'S KEY ARGUMENTS:\n{}\n\n\
         BULL'S REBUTTAL:\n{}\n\n\
         BEAR'S REBUTTAL:\n{}\n\n\
         As Portfolio Manager, weigh both arguments and make your final decision: BUY, SELL, or HOLD.\n\
         Provide clear justification for your choice.",
        snapshot.prompt_block(),
        bull_thesis.summary(),
        bear_thesis.summary(),
        bull_rebuttal.counter_text,
        bear_rebuttal.counter_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use committee_quotes::test_support::snapshot_for;

    fn thesis(stance: Stance, text: &str) -> Thesis {
        Thesis {
            stance,
            stance_text: text.to_string(),
            key_points: None,
            confidence: None,
        }
    }

    #[test]
    fn advocate_prompts_name_their_tags() {
        let bull = advocate_system_prompt(Stance::Bull);
        assert!(bull.contains("<bull_thesis>"));
        assert!(bull.contains("<key_points>"));
        assert!(bull.contains("<confidence>"));
        assert!(bull.contains("The Bull"));

        let bear = advocate_system_prompt(Stance::Bear);
        assert!(bear.contains("<bear_thesis>"));
        assert!(bear.contains("Valuation concerns"));
        assert!(!bear.contains("<bull_thesis>"));
    }

    #[test]
    fn decision_prompt_lists_allowed_verdicts() {
        let prompt = decision_system_prompt();
        assert!(prompt.contains("<decision>BUY</decision>"));
        assert!(prompt.contains("<decision>SELL</decision>"));
        assert!(prompt.contains("<decision>HOLD</decision>"));
        assert!(prompt.contains("<justification>"));
    }

    #[test]
    fn analysis_prompt_embeds_snapshot() {
        let snapshot = snapshot_for("AAPL");
        let prompt = analysis_prompt(Stance::Bear, &snapshot);
        assert!(prompt.starts_with("AAPL | Price: $182.50"));
        assert!(prompt.ends_with("provide your bearish investment thesis."));
    }

    #[test]
    fn rebuttal_prompt_carries_both_theses() {
        let own = thesis(Stance::Bear, "Margins are peaking.");
        let opposing = thesis(Stance::Bull, "Services revenue compounds.");
        let prompt = rebuttal_prompt(&own, &opposing);

        assert!(prompt.contains("YOUR THESIS:\nMargins are peaking."));
        assert!(prompt.contains("BULL'S THESIS TO COUNTER:\nServices revenue compounds."));
        assert!(prompt.contains("overoptimism"));
        assert!(prompt.contains("<rebuttal></rebuttal>"));
    }

    #[test]
    fn decision_prompt_uses_summaries_and_rebuttals() {
        let snapshot = snapshot_for("AAPL");
        let mut bull = thesis(Stance::Bull, "Long bull essay");
        bull.key_points = Some("- Services growth".to_string());
        let bear = thesis(Stance::Bear, "Short bear essay");
        let bull_rebuttal = Rebuttal {
            stance: Stance::Bull,
            counter_text: "Margins are fine.".to_string(),
        };
        let bear_rebuttal = Rebuttal {
            stance: Stance::Bear,
            counter_text: "Growth is priced in.".to_string(),
        };

        let prompt = decision_prompt(&snapshot, &bull, &bear, &bull_rebuttal, &bear_rebuttal);
        assert!(prompt.contains("BULL'S KEY ARGUMENTS:\n- Services growth"));
        assert!(!prompt.contains("Long bull essay"));
        assert!(prompt.contains("BEAR'S KEY ARGUMENTS:\nShort bear essay"));
        assert!(prompt.contains("BULL'S REBUTTAL:\nMargins are fine."));
        assert!(prompt.contains("BEAR'S REBUTTAL:\nGrowth is priced in."));
    }
}
