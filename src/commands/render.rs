//! Help text rendering from a command listing.

use std::collections::BTreeMap;

use super::types::CommandListing;

/// Header used for commands without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Group listing entries by category. Named categories come first in
/// alphabetical order, uncategorized commands last.
pub fn group_by_category(listing: &[CommandListing]) -> Vec<(&str, Vec<&CommandListing>)> {
    let mut by_category: BTreeMap<&str, Vec<&CommandListing>> = BTreeMap::new();
    for entry in listing {
        by_category
            .entry(entry.category.as_str())
            .or_default()
            .push(entry);
    }

    let uncategorized = by_category.remove("");
    let mut groups: Vec<_> = by_category.into_iter().collect();
    if let Some(entries) = uncategorized {
        groups.push((UNCATEGORIZED, entries));
    }

    for (_, entries) in &mut groups {
        entries.sort_by(|a, b| a.name.cmp(&b.name));
    }
    groups
}

/// Render the listing as help text, one section per category.
///
/// Commands without a help handler are marked with `*`.
pub fn format_listing(listing: &[CommandListing]) -> String {
    let mut out = String::new();

    for (category, entries) in group_by_category(listing) {
        out.push_str(&format!("{}\n", category));
        out.push_str(&format!("{}\n", "=".repeat(category.chars().count())));

        // Widths count chars; `{:width$}` pads by chars, not bytes.
        let width = entries.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);
        let cell_width = width + 2;
        let mut row = String::new();
        let mut row_width = 0;
        for entry in entries {
            let marker = if entry.has_help { ' ' } else { '*' };
            if row_width + cell_width > 78 {
                out.push_str(row.trim_end());
                out.push('\n');
                row.clear();
                row_width = 0;
            }
            row.push_str(&format!("{:width$}{} ", entry.name, marker, width = width));
            row_width += cell_width;
        }
        if !row.is_empty() {
            out.push_str(row.trim_end());
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, category: &str, has_help: bool) -> CommandListing {
        CommandListing {
            name: name.to_string(),
            category: category.to_string(),
            has_help,
            has_completion: false,
            set: None,
        }
    }

    #[test]
    fn uncategorized_commands_come_last() {
        let listing = vec![
            entry("zeta", "", true),
            entry("load", "Loading", true),
            entry("echo", "", true),
            entry("get", "Variables", false),
        ];

        let groups = group_by_category(&listing);
        let names: Vec<_> = groups
            .iter()
            .map(|(cat, entries)| (*cat, entries.iter().map(|e| e.name.as_str()).collect::<Vec<_>>()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("Loading", vec!["load"]),
                ("Variables", vec!["get"]),
                (UNCATEGORIZED, vec!["echo", "zeta"]),
            ]
        );
    }

    #[test]
    fn format_marks_commands_without_help() {
        let listing = vec![entry("get", "Variables", false), entry("set", "Variables", true)];

        let text = format_listing(&listing);

        assert_eq!(text, "Variables\n=========\nget* set\n\n");
    }

    #[test]
    fn non_ascii_names_align_by_chars() {
        let listing = vec![entry("größe", "Sizes", true), entry("ab", "Sizes", false)];

        let text = format_listing(&listing);

        assert_eq!(text, "Sizes\n=====\nab   * größe\n\n");
    }

    #[test]
    fn long_rows_wrap() {
        let names: Vec<String> = (0..20).map(|i| format!("command{i:02}")).collect();
        let listing: Vec<_> = names.iter().map(|n| entry(n, "Many", true)).collect();

        let text = format_listing(&listing);

        assert!(text.lines().all(|line| line.chars().count() <= 78), "{text}");
        assert!(text.lines().count() > 4);
    }

    #[test]
    fn empty_listing_renders_nothing() {
        assert_eq!(format_listing(&[]), "");
    }
}
