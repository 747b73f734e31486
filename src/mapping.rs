// Typed outcome for fallible per-item mapping steps.

/// Result of mapping one item inside a batch.
///
/// `Skipped` means the item is unusable but the batch goes on; `Fatal` means
/// the batch as a whole cannot continue.
#[derive(Debug)]
pub enum MapOutcome<T, E> {
    Mapped(T),
    Skipped { reason: String },
    Fatal(E),
}

impl<T, E> MapOutcome<T, E> {
    pub fn skipped(reason: impl Into<String>) -> Self {
        MapOutcome::Skipped {
            reason: reason.into(),
        }
    }
}
