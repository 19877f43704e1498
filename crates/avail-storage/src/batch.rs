/// Accumulates update fragments into one multi-statement text.
///
/// The caller executes whatever [`take_if_over`](Self::take_if_over) and
/// [`finish`](Self::finish) hand back; the batch itself never talks to a store.
#[derive(Debug)]
pub struct StatementBatch {
    sql: String,
    header: String,
    footer: String,
    threshold: usize,
    pending: usize,
}

impl StatementBatch {
    pub fn new(header: &str, footer: &str, threshold: usize) -> Self {
        Self {
            sql: header.to_string(),
            header: header.to_string(),
            footer: footer.to_string(),
            threshold,
            pending: 0,
        }
    }

    pub fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
        self.sql.push_str(";\n");
        self.pending += 1;
    }

    /// Fragments added since the last flush.
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn len(&self) -> usize {
        self.sql.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending == 0
    }

    /// Hand back the accumulated text once it grows past the threshold, restarting the batch.
    pub fn take_if_over(&mut self) -> Option<String> {
        if self.sql.len() <= self.threshold || self.pending == 0 {
            return None;
        }
        Some(self.reset())
    }

    /// Hand back the remaining text, if anything follows the header.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending == 0 {
            return None;
        }
        Some(self.reset())
    }

    fn reset(&mut self) -> String {
        let mut out = std::mem::replace(&mut self.sql, self.header.clone());
        out.push_str(&self.footer);
        self.pending = 0;
        out
    }
}
