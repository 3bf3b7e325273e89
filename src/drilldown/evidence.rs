//! Presentation helpers for pain-point evidence.

use chrono::NaiveDate;

use super::source::SourceMention;

/// Where a mention was found. Tags are matched case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
	/// `twitter` or `x`.
	Twitter,
	/// `linkedin`.
	LinkedIn,
	/// `news`.
	News,
	/// Any other tag.
	Other,
}

impl Platform {
	/// Classify a source's platform tag.
	pub fn from_tag(tag: &str) -> Self {
		match tag.trim().to_lowercase().as_str() {
			"twitter" | "x" => Self::Twitter,
			"linkedin" => Self::LinkedIn,
			"news" => Self::News,
			_ => Self::Other,
		}
	}

	/// Badge text.
	pub fn label(self) -> &'static str {
		match self {
			Self::Twitter => "X / Twitter",
			Self::LinkedIn => "LinkedIn",
			Self::News => "News",
			Self::Other => "Web",
		}
	}

	/// CSS modifier for the platform badge.
	pub fn class(self) -> &'static str {
		match self {
			Self::Twitter => "platform-twitter",
			Self::LinkedIn => "platform-linkedin",
			Self::News => "platform-news",
			Self::Other => "platform-other",
		}
	}
}

/// `2024-03-05` becomes `March 5, 2024`. Anything that is not an ISO date is shown as-is.
pub fn format_mention_date(raw: &str) -> String {
	let trimmed = raw.trim();
	// full timestamps carry the date in their first ten characters
	let date_part = trimmed.get(..10).unwrap_or(trimmed);
	match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
		Ok(date) => date.format("%B %-d, %Y").to_string(),
		Err(_) => raw.to_owned(),
	}
}

impl SourceMention {
	/// Classified platform of this mention.
	pub fn platform_kind(&self) -> Platform {
		Platform::from_tag(&self.platform)
	}

	/// Mention date as shown next to the evidence.
	pub fn display_date(&self) -> String {
		format_mention_date(&self.date)
	}
}
