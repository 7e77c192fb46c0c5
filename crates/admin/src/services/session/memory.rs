//! In-process session slot.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::{SessionSlot, SessionSlotError};

#[derive(Debug, Default)]
struct SlotState {
    raw: Option<String>,
    generation: u64,
}

/// Session slot kept in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionSlot {
    state: Arc<Mutex<SlotState>>,
}

impl MemorySessionSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with `raw`.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SlotState {
                raw: Some(raw.into()),
                generation: 0,
            })),
        }
    }

    /// Snapshot of the stored content.
    pub async fn snapshot(&self) -> Option<String> {
        self.state.lock().await.raw.clone()
    }
}

impl SessionSlot for MemorySessionSlot {
    async fn read(&self) -> Result<Option<String>, SessionSlotError> {
        Ok(self.state.lock().await.raw.clone())
    }

    async fn write(&self, raw: &str) -> Result<(), SessionSlotError> {
        self.state.lock().await.raw = Some(raw.to_owned());
        Ok(())
    }

    async fn remove(&self) -> Result<(), SessionSlotError> {
        self.state.lock().await.raw = None;
        Ok(())
    }

    async fn generation(&self) -> Result<u64, SessionSlotError> {
        Ok(self.state.lock().await.generation)
    }

    async fn bump_generation(&self) -> Result<u64, SessionSlotError> {
        let mut state = self.state.lock().await;
        state.generation += 1;
        Ok(state.generation)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_state() {
        let slot = MemorySessionSlot::new();
        let other = slot.clone();

        slot.write("{}").await.unwrap();
        assert_eq!(other.read().await.unwrap().as_deref(), Some("{}"));

        other.remove().await.unwrap();
        assert!(slot.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_generation_is_monotonic() {
        let slot = MemorySessionSlot::new();
        assert_eq!(slot.generation().await.unwrap(), 0);
        assert_eq!(slot.bump_generation().await.unwrap(), 1);
        assert_eq!(slot.bump_generation().await.unwrap(), 2);
        assert_eq!(slot.generation().await.unwrap(), 2);
    }
}
