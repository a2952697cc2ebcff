use std::collections::HashMap;

/// Resolves a customer input identity (the source image URL) to its
/// pre-rendered finalized artifact reference. The poll worker treats this as
/// an injected collaborator so tests can swap the table out.
pub trait FinalizedLookup: Send + Sync {
    fn resolve(&self, input: &str) -> Option<String>;
}

/// Table-backed lookup used in production runs.
pub struct TableLookup {
    entries: HashMap<String, String>,
}

impl TableLookup {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FinalizedLookup for TableLookup {
    fn resolve(&self, input: &str) -> Option<String> {
        self.entries.get(input).cloned()
    }
}

/// Base URL of the hosted sample asset set.
pub const SAMPLE_BASE_URL: &str =
    "https://pub-ac878ecfb32d4fabac12c91472c4714a.r2.dev/samples";

/// Gang-sheet size variants present in the sample set, smallest to largest.
pub const SAMPLE_VARIANTS: &[&str] = &[
    "22x5", "22x10", "22x20", "22x30", "22x40", "22x50", "22x60", "22x70",
    "22x80", "22x90", "22x100", "22x110", "22x120", "22x130", "22x140",
    "22x150", "22x160", "22x170", "22x180", "22x190", "22x200", "22x250",
    "22x300", "22x400", "22x500", "22x600", "22x750", "22x1000",
];

/// Input/output pairs for the sample set. Each `tmp-img-ABC-{n}-{variant}.png`
/// has a matching pre-rendered `tmp-out-ABC-{n}-{variant}.pdf`.
pub fn sample_reference_table() -> Vec<(String, String)> {
    SAMPLE_VARIANTS
        .iter()
        .enumerate()
        .map(|(i, variant)| {
            (
                format!("{}/tmp-img-ABC-{}-{}.png", SAMPLE_BASE_URL, i + 1, variant),
                format!("{}/tmp-out-ABC-{}-{}.pdf", SAMPLE_BASE_URL, i + 1, variant),
            )
        })
        .collect()
}

/// The sample input URLs on their own, as referenced by synthetic line items.
pub fn sample_print_files() -> Vec<String> {
    sample_reference_table().into_iter().map(|(input, _)| input).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_table_covers_every_variant() {
        let table = sample_reference_table();
        assert_eq!(table.len(), SAMPLE_VARIANTS.len());
        assert!(table[0].0.ends_with("tmp-img-ABC-1-22x5.png"));
        assert!(table[0].1.ends_with("tmp-out-ABC-1-22x5.pdf"));
        let last = table.last().unwrap();
        assert!(last.0.ends_with("tmp-img-ABC-28-22x1000.png"));
        assert!(last.1.ends_with("tmp-out-ABC-28-22x1000.pdf"));
    }

    #[test]
    fn test_table_lookup_resolves_known_inputs() {
        let lookup = TableLookup::new(sample_reference_table());
        assert!(!lookup.is_empty());
        assert_eq!(lookup.len(), SAMPLE_VARIANTS.len());
        let input = format!("{}/tmp-img-ABC-3-22x20.png", SAMPLE_BASE_URL);
        let resolved = lookup.resolve(&input).unwrap();
        assert_eq!(resolved, format!("{}/tmp-out-ABC-3-22x20.pdf", SAMPLE_BASE_URL));

        assert!(lookup.resolve("https://elsewhere.example/x.png").is_none());
    }
}
