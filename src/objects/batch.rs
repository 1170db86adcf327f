/// Result of a best-effort batch operation.
///
/// Items are handled one at a time; anything that could not be applied is
/// recorded in `failed` in the order it was supplied and the rest of the
/// batch carries on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    success_count: usize,
    failed: Vec<String>,
}

impl BatchOutcome {
    pub fn new() -> BatchOutcome {
        BatchOutcome::default()
    }

    pub fn succeeded(&mut self) {
        self.success_count += 1;
    }

    pub fn failed_on(&mut self, identifier: &str) {
        self.failed.push(String::from(identifier));
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failed.len()
    }
}
