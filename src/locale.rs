use chrono::{Datelike, NaiveDate};

use crate::model::ProjectStatus;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SymbolPosition {
    /// `€ 1.000,00`
    Before,
    /// `1.000,00 €`
    After,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DateStyle {
    /// `05/2023`
    Numeric,
    /// `maggio 2023`
    LongMonth,
}

#[derive(Clone, Debug)]
pub struct FieldLabels {
    pub client: String,
    pub service: String,
    pub category: String,
    pub amount: String,
    pub status: String,
    pub date: String,
    pub title: String,
}

/// Language- and currency-dependent strings used while drawing records.
#[derive(Clone, Debug)]
pub struct Locale {
    pub currency_symbol: String,
    pub symbol_position: SymbolPosition,
    pub thousands_separator: char,
    pub decimal_separator: char,
    pub month_names: [String; 12],
    pub labels: FieldLabels,
    pub status_names: [String; 4],
    /// Replaces the end date of a project that is still in progress.
    pub ongoing: String,
}

fn months(names: [&str; 12]) -> [String; 12] {
    names.map(str::to_string)
}

impl Locale {
    pub fn italian() -> Self {
        Self {
            currency_symbol: "€".into(),
            symbol_position: SymbolPosition::Before,
            thousands_separator: '.',
            decimal_separator: ',',
            month_names: months([
                "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio",
                "agosto", "settembre", "ottobre", "novembre", "dicembre",
            ]),
            labels: FieldLabels {
                client: "Committente".into(),
                service: "Prestazione".into(),
                category: "Categoria".into(),
                amount: "Importo".into(),
                status: "Stato".into(),
                date: "Periodo".into(),
                title: "Progetto".into(),
            },
            status_names: ["Completato", "In Corso", "Concettuale", "Da fare"].map(str::to_string),
            ongoing: "presente".into(),
        }
    }

    pub fn english() -> Self {
        Self {
            currency_symbol: "€".into(),
            symbol_position: SymbolPosition::Before,
            thousands_separator: ',',
            decimal_separator: '.',
            month_names: months([
                "January", "February", "March", "April", "May", "June", "July", "August",
                "September", "October", "November", "December",
            ]),
            labels: FieldLabels {
                client: "Client".into(),
                service: "Service".into(),
                category: "Category".into(),
                amount: "Amount".into(),
                status: "Status".into(),
                date: "Period".into(),
                title: "Project".into(),
            },
            status_names: ["Completed", "In Progress", "Conceptual", "To do"].map(str::to_string),
            ongoing: "ongoing".into(),
        }
    }

    /// Looks a locale up by language tag (`it`, `it-IT`, `en`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let lang = tag.split(['-', '_']).next().unwrap_or(tag).to_ascii_lowercase();
        match lang.as_str() {
            "it" => Some(Self::italian()),
            "en" => Some(Self::english()),
            _ => None,
        }
    }

    pub fn status_name(&self, status: ProjectStatus) -> &str {
        let idx = match status {
            ProjectStatus::Completed => 0,
            ProjectStatus::InProgress => 1,
            ProjectStatus::Conceptual => 2,
            ProjectStatus::Todo => 3,
        };
        &self.status_names[idx]
    }

    /// Currency style: symbol, digit grouping and exactly two decimals.
    pub fn format_amount(&self, amount: f64) -> String {
        let amount = if amount.is_finite() && amount > 0.0 { amount } else { 0.0 };
        let cents = (amount * 100.0).round() as u64;
        let units = (cents / 100).to_string();
        let frac = cents % 100;

        let mut grouped = String::with_capacity(units.len() + units.len() / 3);
        for (i, ch) in units.chars().enumerate() {
            if i > 0 && (units.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }
        let number = format!("{grouped}{}{frac:02}", self.decimal_separator);

        match self.symbol_position {
            SymbolPosition::Before => format!("{} {number}", self.currency_symbol),
            SymbolPosition::After => format!("{number} {}", self.currency_symbol),
        }
    }

    pub fn format_date(&self, date: NaiveDate, style: DateStyle) -> String {
        match style {
            DateStyle::Numeric => format!("{:02}/{}", date.month(), date.year()),
            DateStyle::LongMonth => {
                format!("{} {}", self.month_names[date.month0() as usize], date.year())
            }
        }
    }

    /// `start – end`, collapsed to one token when both ends format the same.
    /// Projects in progress always end with the ongoing token.
    pub fn format_date_range(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        status: ProjectStatus,
        style: DateStyle,
    ) -> String {
        let from = self.format_date(start, style);
        if status == ProjectStatus::InProgress {
            return format!("{from} \u{2013} {}", self.ongoing);
        }
        match end.map(|d| self.format_date(d, style)) {
            Some(to) if to != from => format!("{from} \u{2013} {to}"),
            _ => from,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::italian()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn italian_currency() {
        let it = Locale::italian();
        assert_eq!(it.format_amount(530000.0), "€ 530.000,00");
        assert_eq!(it.format_amount(1234.5), "€ 1.234,50");
        assert_eq!(it.format_amount(999.999), "€ 1.000,00");
        assert_eq!(it.format_amount(0.0), "€ 0,00");
    }

    #[test]
    fn english_currency_and_suffix_symbol() {
        let mut en = Locale::english();
        assert_eq!(en.format_amount(530000.0), "€ 530,000.00");
        en.symbol_position = SymbolPosition::After;
        assert_eq!(en.format_amount(12.0), "12.00 €");
    }

    #[test]
    fn bad_amounts_render_as_zero() {
        let it = Locale::italian();
        assert_eq!(it.format_amount(-5.0), "€ 0,00");
        assert_eq!(it.format_amount(f64::NAN), "€ 0,00");
    }

    #[test]
    fn in_progress_ends_with_ongoing() {
        let en = Locale::english();
        let s = en.format_date_range(
            date(2022, 1, 10),
            Some(date(2019, 4, 1)),
            ProjectStatus::InProgress,
            DateStyle::Numeric,
        );
        assert_eq!(s, "01/2022 \u{2013} ongoing");
        assert!(s.ends_with("ongoing"));
    }

    #[test]
    fn same_month_collapses() {
        let it = Locale::italian();
        let s = it.format_date_range(
            date(2023, 5, 2),
            Some(date(2023, 5, 28)),
            ProjectStatus::Completed,
            DateStyle::Numeric,
        );
        assert_eq!(s, "05/2023");
        let long = it.format_date_range(
            date(2023, 5, 2),
            Some(date(2023, 5, 28)),
            ProjectStatus::Completed,
            DateStyle::LongMonth,
        );
        assert_eq!(long, "maggio 2023");
    }

    #[test]
    fn open_range_without_progress_shows_start() {
        let en = Locale::english();
        let s = en.format_date_range(date(2020, 11, 1), None, ProjectStatus::Conceptual, DateStyle::LongMonth);
        assert_eq!(s, "November 2020");
    }

    #[test]
    fn full_range() {
        let it = Locale::italian();
        let s = it.format_date_range(
            date(2019, 2, 1),
            Some(date(2021, 7, 1)),
            ProjectStatus::Completed,
            DateStyle::Numeric,
        );
        assert_eq!(s, "02/2019 \u{2013} 07/2021");
    }

    #[test]
    fn locale_tags() {
        assert_eq!(Locale::from_tag("it-IT").unwrap().ongoing, "presente");
        assert_eq!(Locale::from_tag("en_GB").unwrap().ongoing, "ongoing");
        assert!(Locale::from_tag("fr").is_none());
    }
}
