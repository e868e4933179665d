use super::Table;

const TRIM_CHARS: [char; 4] = [' ', '\t', '\r', '\n'];

/// Strip ASCII space, tab, CR and LF from both ends.
pub fn trim_field(raw: &str) -> &str {
    raw.trim_matches(&TRIM_CHARS[..])
}

impl Table {
    /// Trim every header and field in place with [`trim_field`].
    ///
    /// Loading never trims; call this after a load when padded values are
    /// unwanted. Returns how many values changed.
    pub fn trim_fields(&mut self) -> usize {
        let mut changed = 0;
        for value in self.headers.iter_mut().chain(self.rows.iter_mut().flatten()) {
            let trimmed = trim_field(value);
            if trimmed.len() != value.len() {
                *value = trimmed.to_string();
                changed += 1;
            }
        }
        changed
    }
}
