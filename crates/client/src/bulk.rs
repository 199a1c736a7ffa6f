//! Bulk menu import from pasted text.
//!
//! Admins paste a plain-text price list, one item per line, in whatever
//! loose shape their notes app produced:
//!
//! ```text
//! Chicken Biryani, 250/-
//! Mutton Biryani - 300
//! Paneer Tikka: 180
//! ```
//!
//! Lines that do not end in a price are skipped, not errors; the report
//! tells the caller how many lines made it through so the UI can show
//! "12 of 14 lines imported" before anything is committed.

use std::sync::LazyLock;

use regex::Regex;

use tiffin_core::{MenuCategory, NewMenuItem, Rupees};

/// `<name><separator><digits>[/-]` where the separator is any run of
/// commas, colons, dashes, or whitespace. The lazy `.+?` keeps dashes and
/// commas inside the name (e.g. "Half-and-half, special") out of the
/// separator.
static LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+?)[\s,:-]+(\d+)\s*(?:/-)?\s*$").expect("hardwired pattern compiles")
});

/// One successfully parsed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkMenuLine {
    pub name: String,
    pub price: Rupees,
}

/// Outcome of a parse, for caller display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkParseReport {
    /// Non-blank lines in the input.
    pub lines_submitted: usize,
    /// Lines that parsed, in input order, duplicates preserved.
    pub items: Vec<BulkMenuLine>,
}

impl BulkParseReport {
    /// Lines that were skipped as unparseable.
    #[must_use]
    pub const fn lines_skipped(&self) -> usize {
        self.lines_submitted - self.items.len()
    }
}

/// Parse pasted menu text into name/price lines.
#[must_use]
pub fn parse_bulk_menu(text: &str) -> BulkParseReport {
    let mut lines_submitted = 0;
    let mut items = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        lines_submitted += 1;

        if let Some(captures) = LINE.captures(line) {
            // Digits only, so the parse can only fail on overflow.
            let Ok(price) = captures[2].parse::<u64>() else {
                continue;
            };
            items.push(BulkMenuLine {
                name: captures[1].trim().to_string(),
                price: Rupees::new(price),
            });
        }
    }

    BulkParseReport {
        lines_submitted,
        items,
    }
}

/// Turn parsed lines into items for one category, ready for
/// [`crate::mutations::Mutations::replace_category_menu_items`].
#[must_use]
pub fn lines_to_menu_items(lines: &[BulkMenuLine], category: MenuCategory) -> Vec<NewMenuItem> {
    lines
        .iter()
        .map(|line| NewMenuItem::bare(line.name.clone(), line.price, category))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(report: &BulkParseReport) -> Vec<&str> {
        report.items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_parses_comma_separated_price_list() {
        let report = parse_bulk_menu("Chicken Biryani, 250/-\nMutton Biryani, 300/-");
        assert_eq!(report.lines_submitted, 2);
        assert_eq!(names(&report), ["Chicken Biryani", "Mutton Biryani"]);
        assert_eq!(report.items[0].price, Rupees::new(250));
        assert_eq!(report.items[1].price, Rupees::new(300));
    }

    #[test]
    fn test_accepts_loose_separators() {
        let report = parse_bulk_menu("Paneer Tikka: 180\nVeg Momos - 90\nPlain Roti  25");
        assert_eq!(names(&report), ["Paneer Tikka", "Veg Momos", "Plain Roti"]);
        assert_eq!(report.items[2].price, Rupees::new(25));
    }

    #[test]
    fn test_skips_lines_without_price() {
        let report = parse_bulk_menu("Garlic Naan\nButter Naan, 45\n\nToday's specials:");
        assert_eq!(report.lines_submitted, 3);
        assert_eq!(names(&report), ["Butter Naan"]);
        assert_eq!(report.lines_skipped(), 2);
    }

    #[test]
    fn test_keeps_punctuation_inside_names() {
        let report = parse_bulk_menu("Half-and-half, special - 120");
        assert_eq!(names(&report), ["Half-and-half, special"]);
        assert_eq!(report.items[0].price, Rupees::new(120));
    }

    #[test]
    fn test_preserves_duplicates_and_order() {
        let report = parse_bulk_menu("Chai, 20\nSamosa, 15\nChai, 20");
        assert_eq!(names(&report), ["Chai", "Samosa", "Chai"]);
    }

    #[test]
    fn test_empty_input_reports_nothing() {
        let report = parse_bulk_menu("");
        assert_eq!(report.lines_submitted, 0);
        assert!(report.items.is_empty());
    }

    #[test]
    fn test_lines_to_menu_items_carries_category() {
        let report = parse_bulk_menu("Veg Momos, 90");
        let items = lines_to_menu_items(&report.items, MenuCategory::Momos);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Veg Momos");
        assert_eq!(items[0].price, Rupees::new(90));
        assert_eq!(items[0].category, MenuCategory::Momos);
    }
}
