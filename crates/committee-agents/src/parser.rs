use committee_models::{Decision, Rebuttal, Stance, Thesis, Verdict};
use rust_decimal::Decimal;
use tracing::warn;

use crate::error::AgentError;
use crate::prompts::{
    thesis_tag, CONFIDENCE_TAG, DECISION_TAG, JUSTIFICATION_TAG, KEY_POINTS_TAG, REBUTTAL_TAG,
};

/// Extract the trimmed content of the first `<tag>...</tag>` pair.
///
/// Returns `None` when either marker is missing or the content is blank.
pub fn extract_tag(text: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");

    let start = text.find(&open)? + open.len();
    let end = text[start..].find(&close)? + start;
    let content = text[start..end].trim();

    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

/// Parse an advocate's opening answer.
///
/// Handles the shapes models actually return:
/// - Fully tagged: key points, thesis and confidence tags
/// - Thesis tag only: key points and confidence are absent
/// - Untagged prose: the whole answer becomes the stance text
pub fn parse_thesis(stance: Stance, raw: &str) -> Result<Thesis, AgentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AgentError::MalformedResponse(format!(
            "{stance} returned an empty thesis"
        )));
    }

    let stance_text =
        extract_tag(trimmed, thesis_tag(stance)).unwrap_or_else(|| trimmed.to_string());

    Ok(Thesis {
        stance,
        stance_text,
        key_points: extract_tag(trimmed, KEY_POINTS_TAG),
        confidence: extract_tag(trimmed, CONFIDENCE_TAG)
            .and_then(|c| parse_confidence(stance, &c)),
    })
}

/// Confidence must be a decimal in [0, 1]; anything else is dropped.
fn parse_confidence(stance: Stance, value: &str) -> Option<Decimal> {
    match value.trim().parse::<Decimal>() {
        Ok(c) if c >= Decimal::ZERO && c <= Decimal::ONE => Some(c),
        _ => {
            warn!(stance = %stance, value, "Ignoring out-of-range or non-numeric confidence");
            None
        }
    }
}

pub fn parse_rebuttal(stance: Stance, raw: &str) -> Result<Rebuttal, AgentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AgentError::MalformedResponse(format!(
            "{stance} returned an empty rebuttal"
        )));
    }

    Ok(Rebuttal {
        stance,
        counter_text: extract_tag(trimmed, REBUTTAL_TAG).unwrap_or_else(|| trimmed.to_string()),
    })
}

/// Parse the decision-maker's answer.
///
/// The decision tag is mandatory and must hold exactly BUY, SELL or HOLD; there
/// is no fallback decision. The justification falls back to the whole answer.
pub fn parse_verdict(raw: &str) -> Result<Verdict, AgentError> {
    let trimmed = raw.trim();

    let decision_text = extract_tag(trimmed, DECISION_TAG).ok_or_else(|| {
        AgentError::MalformedResponse(format!(
            "No <{DECISION_TAG}> tag in decision response (length={})",
            raw.len()
        ))
    })?;

    let decision: Decision = decision_text
        .parse()
        .map_err(|e: String| AgentError::MalformedResponse(format!("Invalid decision: {e}")))?;

    let rationale =
        extract_tag(trimmed, JUSTIFICATION_TAG).unwrap_or_else(|| trimmed.to_string());

    Ok(Verdict {
        decision,
        rationale,
    })
}
