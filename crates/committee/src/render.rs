//! Terminal presentation. Everything here writes to stdout; logs go to stderr.

use committee_agents::{DebateFailure, DebateObserver, FailureKind};
use committee_models::quote::{format_market_cap, format_money, format_volume};
use committee_models::{DebatePhase, DebateSession, QuoteSnapshot, Rebuttal, Thesis};
use serde_json::json;

const RULE_WIDTH: usize = 70;

fn rule(ch: char) -> String {
    ch.to_string().repeat(RULE_WIDTH)
}

fn section(title: &str) -> String {
    format!("\n{}\n{title}\n{}", rule('-'), rule('-'))
}

pub fn header() -> String {
    format!(
        "{}\n{:^width$}\n{:^width$}\n{}",
        rule('='),
        "INVESTMENT COMMITTEE",
        "Bull vs. Bear, judged by the Portfolio Manager",
        rule('='),
        width = RULE_WIDTH
    )
}

pub fn providers(bindings: &[(&str, String)]) -> String {
    let mut out = String::from("Committee members:");
    for (role, binding) in bindings {
        out.push_str(&format!("\n  {role:<18} {binding}"));
    }
    out
}

pub fn snapshot(snapshot: &QuoteSnapshot) -> String {
    let pe = snapshot
        .pe_ratio
        .map(|pe| format!("{:.2}", pe.round_dp(2)))
        .unwrap_or_else(|| "N/A".to_string());

    let rows = [
        ("Price", format_money(snapshot.price)),
        ("P/E Ratio", pe),
        ("Market Cap", format_market_cap(snapshot.market_cap)),
        ("52-Week High", format_money(snapshot.week52_high)),
        ("52-Week Low", format_money(snapshot.week52_low)),
        (
            "Volume",
            format!(
                "{} (avg {})",
                format_volume(snapshot.volume),
                format_volume(snapshot.avg_volume)
            ),
        ),
    ];

    let mut out = section(&format!("MARKET DATA: {}", snapshot.ticker));
    for (label, value) in rows {
        out.push_str(&format!("\n  {label:<14} {value}"));
    }
    out.push_str("\n\n  Recent news:");
    for (i, headline) in snapshot.headlines.iter().enumerate() {
        out.push_str(&format!("\n    {}. {headline}", i + 1));
    }
    out
}

fn thesis(title: &str, thesis: &Thesis) -> String {
    let mut out = section(title);
    if let Some(confidence) = thesis.confidence {
        out.push_str(&format!("\nConfidence: {confidence}"));
    }
    out.push_str(&format!("\n{}", thesis.stance_text));
    out
}

fn rebuttal(title: &str, rebuttal: &Rebuttal) -> String {
    format!("{}\n{}", section(title), rebuttal.counter_text)
}

/// The full debate transcript and verdict, minus the market data table
/// which the observer prints as soon as the quote arrives.
pub fn session(session: &DebateSession) -> String {
    let verdict = &session.verdict;
    [
        thesis("BULL THESIS", &session.bull_thesis),
        thesis("BEAR THESIS", &session.bear_thesis),
        rebuttal("BULL REBUTTAL", &session.bull_rebuttal),
        rebuttal("BEAR REBUTTAL", &session.bear_rebuttal),
        format!(
            "\n{}\nFINAL DECISION: {}  ({})\n{}\n{}\n",
            rule('='),
            verdict.decision,
            session.snapshot.ticker,
            rule('='),
            verdict.rationale
        ),
        format!("Completed in {:.1}s", session.elapsed_ms as f64 / 1000.0),
    ]
    .join("\n")
}

/// A kind-specific explanation of why a ticker produced no verdict.
pub fn failure(failure: &DebateFailure) -> String {
    match failure.kind() {
        FailureKind::TickerNotFound => format!(
            "\nError: {}\n\
             Suggestions:\n  \
             - Verify the ticker symbol is correct\n  \
             - For foreign markets include the exchange suffix (e.g. SAAB-B.ST for Stockholm)\n  \
             - Check that the symbol exists on finance.yahoo.com",
            failure.error
        ),
        FailureKind::DataProviderError => format!(
            "\nError: market data for {} is unavailable right now: {}\n\
             The data provider may be down or rate limiting. Try again later.",
            failure.ticker, failure.error
        ),
        FailureKind::ReasoningBackendError => format!(
            "\nError: a reasoning backend failed while {} {}: {}\n\
             Check your API keys, network access and provider status.",
            failure.phase, failure.ticker, failure.error
        ),
        FailureKind::MalformedResponse => format!(
            "\nError: a model answered in an unusable format while {} {}: {}\n\
             No verdict was issued. Running the ticker again usually helps.",
            failure.phase, failure.ticker, failure.error
        ),
    }
}

/// Machine-readable failure record for `--json` mode.
pub fn failure_json(failure: &DebateFailure) -> serde_json::Value {
    json!({
        "ticker": failure.ticker,
        "phase": failure.phase,
        "kind": format!("{:?}", failure.kind()),
        "error": failure.error.to_string(),
    })
}

/// Prints phase progress and the market data table while a debate runs.
pub struct TerminalObserver;

impl DebateObserver for TerminalObserver {
    fn phase_entered(&self, ticker: &str, phase: DebatePhase) {
        let line = match phase {
            DebatePhase::Fetching => format!("\n[1/4] Fetching market data for {ticker}..."),
            DebatePhase::Analyzing => "[2/4] Bull and Bear are building their theses...".to_string(),
            DebatePhase::Rebutting => "[3/4] Rebuttal round...".to_string(),
            DebatePhase::Deciding => "[4/4] The Portfolio Manager is deliberating...".to_string(),
            DebatePhase::Done | DebatePhase::Failed => return,
        };
        println!("{line}");
    }

    fn snapshot_fetched(&self, quote: &QuoteSnapshot) {
        println!("{}\n", snapshot(quote));
    }
}
