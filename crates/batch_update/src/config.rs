/// Tunables for the element applier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyConfig {
    /// Set unmatched primitive values as generic attributes. When disabled,
    /// such keys are logged and skipped.
    pub attribute_fallback: bool,
    /// Prefix that marks a key as an event handler slot.
    pub event_slot_prefix: &'static str,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            attribute_fallback: true,
            event_slot_prefix: "on",
        }
    }
}

impl ApplyConfig {
    pub fn is_event_slot(&self, key: &str) -> bool {
        key.len() > self.event_slot_prefix.len() && key.starts_with(self.event_slot_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_slot_needs_a_name_after_prefix() {
        let config = ApplyConfig::default();
        assert!(config.is_event_slot("onclick"));
        assert!(!config.is_event_slot("on"));
        assert!(!config.is_event_slot("click"));
    }
}
