use std::collections::HashSet;

/// Longest sheet name a workbook accepts.
pub const MAX_SHEET_NAME: usize = 31;

const FORBIDDEN: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Maps an arbitrary benchmark name onto a legal sheet name.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|ch| if FORBIDDEN.contains(&ch) || ch.is_control() { '_' } else { ch })
        .take(MAX_SHEET_NAME)
        .collect();
    // leading or trailing apostrophes are rejected by spreadsheet readers
    if name.starts_with('\'') {
        name.replace_range(..1, "_");
    }
    if name.ends_with('\'') {
        name.pop();
        name.push('_');
    }
    if name.trim().is_empty() {
        return "Sheet".to_string();
    }
    name
}

/// Hands out unique sheet names; uniqueness is case-insensitive.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }
        let mut counter = 1usize;
        loop {
            let suffix = format!("_{counter}");
            let keep = MAX_SHEET_NAME - suffix.chars().count();
            let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}
