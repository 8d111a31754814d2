use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Placeholder headline used when the provider has no news for a symbol.
pub const NO_NEWS_HEADLINE: &str = "No recent news available";

/// Headlines beyond this count are left out of the prompt block.
const PROMPT_HEADLINES: usize = 3;
const HEADLINE_MAX_CHARS: usize = 80;

/// Normalized market data for one ticker. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuoteSnapshot {
    /// The symbol the provider actually resolved (may carry a corrected exchange suffix).
    pub ticker: String,
    pub price: Decimal,
    pub pe_ratio: Option<Decimal>,
    pub week52_high: Decimal,
    pub week52_low: Decimal,
    pub market_cap: Option<Decimal>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    /// Most recent first.
    pub headlines: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

impl QuoteSnapshot {
    /// Compact text rendering of the snapshot that gets interpolated into persona prompts.
    pub fn prompt_block(&self) -> String {
        let pe = self
            .pe_ratio
            .map(|pe| format!("{:.1}", pe.round_dp(1)))
            .unwrap_or_else(|| "N/A".to_string());

        let news = self
            .headlines
            .iter()
            .take(PROMPT_HEADLINES)
            .enumerate()
            .map(|(i, headline)| format!("({}) {}", i + 1, truncate_headline(headline)))
            .collect::<Vec<_>>()
            .join(" ");

        format!(
            "{} | Price: {} | P/E: {} | MCap: {}\n\
             52-Week Range: {} - {} | Volume: {} (avg: {})\n\
             News: {}",
            self.ticker,
            format_money(self.price),
            pe,
            format_market_cap(self.market_cap),
            format_money(self.week52_low),
            format_money(self.week52_high),
            format_volume(self.volume),
            format_volume(self.avg_volume),
            news
        )
    }
}

/// `$1234.50` style rendering with two decimals.
pub fn format_money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

/// Market cap in T/B/M units, or grouped dollars below a million.
pub fn format_market_cap(market_cap: Option<Decimal>) -> String {
    let Some(cap) = market_cap.filter(|c| !c.is_zero()) else {
        return "N/A".to_string();
    };

    let trillion = Decimal::from(1_000_000_000_000u64);
    let billion = Decimal::from(1_000_000_000u64);
    let million = Decimal::from(1_000_000u64);

    if cap >= trillion {
        format!("${:.2}T", (cap / trillion).round_dp(2))
    } else if cap >= billion {
        format!("${:.1}B", (cap / billion).round_dp(1))
    } else if cap >= million {
        format!("${:.1}M", (cap / million).round_dp(1))
    } else {
        format!("${}", group_thousands(&cap.round().trunc().to_string()))
    }
}

/// Share volume in M/K units.
pub fn format_volume(volume: Option<u64>) -> String {
    match volume {
        None | Some(0) => "N/A".to_string(),
        Some(v) if v >= 1_000_000 => {
            format!("{:.1}M", (Decimal::from(v) / Decimal::from(1_000_000u64)).round_dp(1))
        }
        Some(v) if v >= 1_000 => {
            format!("{:.1}K", (Decimal::from(v) / Decimal::from(1_000u64)).round_dp(1))
        }
        Some(v) => v.to_string(),
    }
}

fn truncate_headline(headline: &str) -> String {
    if headline.chars().count() > HEADLINE_MAX_CHARS {
        let cut: String = headline.chars().take(HEADLINE_MAX_CHARS).collect();
        format!("{cut}...")
    } else {
        headline.to_string()
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}
