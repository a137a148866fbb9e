// src/workflow/breakdown.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DeskConfig;
use crate::models::{ComponentKind, ComponentLineItem, PayrollResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Proof attached to a manual entry.
    Attachment(String),
    /// The uploaded sheet the line came from.
    SourceFile { name: String, url: String },
    /// Manual entry without proof: plain text, no link.
    Text(String),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownLine {
    pub reason: String,
    pub amount: String,
    pub provenance: Provenance,
}

pub fn provenance(item: &ComponentLineItem, config: &DeskConfig) -> Provenance {
    if let Some(url) = item.attachment_url.as_deref().filter(|u| !u.trim().is_empty()) {
        return Provenance::Attachment(config.resolve_attachment(url));
    }
    if item.is_manual() {
        return Provenance::Text(item.source_file.clone());
    }
    if item.source_file.trim().is_empty() {
        return Provenance::None;
    }
    Provenance::SourceFile {
        name: item.source_file.clone(),
        url: config.media_url(&item.source_file),
    }
}

pub fn breakdown(result: &PayrollResult, kind: ComponentKind, config: &DeskConfig) -> Vec<BreakdownLine> {
    result
        .components_snapshot
        .bucket(kind)
        .iter()
        .map(|item| BreakdownLine {
            reason: if item.reason.trim().is_empty() {
                "N/A".to_string()
            } else {
                item.reason.clone()
            },
            amount: format_currency(item.amount),
            provenance: provenance(item, config),
        })
        .collect()
}

/// en-US dollars: `$1,234.50`, `-$12.00`.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}${grouped}.{frac}")
}
