#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SearchInput {
    text: String,
    cursor: usize,
}

impl SearchInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor.min(self.char_len())
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lowercased, trimmed form used for matching. Empty means "match everything".
    pub fn needle(&self) -> String {
        self.text.trim().to_lowercase()
    }

    pub fn matches(&self, owner_name: &str) -> bool {
        owner_matches(&self.needle(), owner_name)
    }

    pub fn insert_char(&mut self, ch: char) {
        let mut buffer = [0u8; 4];
        self.insert_str(ch.encode_utf8(&mut buffer));
    }

    pub fn insert_str(&mut self, text: &str) {
        let flattened = flatten_whitespace(text);
        if flattened.is_empty() {
            return;
        }
        let at = byte_offset(&self.text, self.cursor());
        self.text.insert_str(at, &flattened);
        self.cursor = self.cursor() + flattened.chars().count();
    }

    pub fn backspace(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor == 0 {
            return false;
        }
        let at = byte_offset(&self.text, cursor - 1);
        self.text.remove(at);
        self.cursor = cursor - 1;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor >= self.char_len() {
            return false;
        }
        let at = byte_offset(&self.text, cursor);
        self.text.remove(at);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor().saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor() + 1).min(self.char_len());
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub fn owner_matches(needle: &str, owner_name: &str) -> bool {
    needle.is_empty() || owner_name.to_lowercase().contains(needle)
}

// Pasted text may carry newlines or tabs; the box is one line.
fn flatten_whitespace(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        })
        .filter(|ch| !ch.is_control())
        .collect()
}

fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_for(text: &str) -> SearchInput {
        let mut search = SearchInput::new();
        search.insert_str(text);
        search
    }

    #[test]
    fn edits_at_the_cursor_on_unicode_text() {
        let mut search = SearchInput::new();
        search.insert_str("jné");
        search.move_left();
        search.insert_char('o');
        assert_eq!(search.text(), "jnoé");
        assert!(search.backspace());
        assert_eq!(search.text(), "jné");
        search.move_left();
        search.move_left();
        search.move_left();
        assert!(!search.backspace());
        assert!(search.delete_forward());
        assert_eq!(search.text(), "né");
        assert_eq!(search.cursor(), 0);
    }

    #[test]
    fn needle_is_trimmed_and_lowercased() {
        let search = search_for("  JaNe ");
        assert_eq!(search.needle(), "jane");
        assert!(search.matches("Jane Doe"));
        assert!(search.matches("Mary-Jane Watson"));
        assert!(!search.matches("John Smith"));
    }

    #[test]
    fn whitespace_only_query_matches_everything() {
        assert!(search_for("   ").matches("anyone"));
        assert!(SearchInput::new().matches(""));
    }

    #[test]
    fn pasted_line_breaks_become_spaces() {
        let mut search = SearchInput::new();
        search.insert_str("Jane\r\nDoe\t");
        assert_eq!(search.text(), "Jane  Doe ");
        assert_eq!(search.cursor(), 10);
    }
}
