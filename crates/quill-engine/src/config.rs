/// Environment variable holding comma-separated debug flags.
pub const DEBUG_ENV: &str = "QUILL_DEBUG";

/// Journal behavior switches.
///
/// Defaults are the fast path: software transform and batching enabled.
/// The debug flags mirror what is useful when bisecting rendering bugs:
///
/// | flag | effect |
/// |---|---|
/// | `disable-software-transform` | keep model-space positions and load a modelview per batch |
/// | `disable-batching` | flush after every logged quad, one draw per quad |
/// | `journal` | trace every logged entry |
/// | `batching` | trace every batch produced at flush time |
#[derive(Debug, Clone, PartialEq)]
pub struct JournalConfig {
    /// Pre-transform vertex positions at log time.
    pub software_transform: bool,
    /// Merge compatible entries. When off, each quad is flushed as soon as it
    /// is logged.
    pub batching: bool,
    /// Texture units available on the backend. Layers past this are disabled.
    pub max_texture_units: u32,
    pub trace_journal: bool,
    pub trace_batching: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            software_transform: true,
            batching: true,
            max_texture_units: 8,
            trace_journal: false,
            trace_batching: false,
        }
    }
}

impl JournalConfig {
    /// Defaults adjusted by the flags in `QUILL_DEBUG`, if set.
    pub fn from_env() -> Self {
        match std::env::var(DEBUG_ENV) {
            Ok(flags) => Self::default().with_debug_flags(&flags),
            Err(_) => Self::default(),
        }
    }

    /// Applies comma- or whitespace-separated debug flags.
    ///
    /// Unknown flags are logged and otherwise ignored.
    pub fn with_debug_flags(mut self, flags: &str) -> Self {
        let words = flags
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::trim)
            .filter(|w| !w.is_empty());

        for flag in words {
            match flag.to_ascii_lowercase().as_str() {
                "disable-software-transform" => self.software_transform = false,
                "disable-batching" => self.batching = false,
                "journal" => self.trace_journal = true,
                "batching" => self.trace_batching = true,
                _ => log::warn!("{DEBUG_ENV}: unknown flag {flag:?}"),
            }
        }
        self
    }

    /// Maximum layers a single entry can carry (one bit per layer in the
    /// override masks).
    #[inline]
    pub fn layer_limit(&self) -> usize {
        self.max_texture_units.clamp(1, 32) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_fast_path() {
        let c = JournalConfig::default();
        assert!(c.software_transform);
        assert!(c.batching);
        assert!(!c.trace_journal);
    }

    #[test]
    fn parses_flag_list() {
        let c = JournalConfig::default().with_debug_flags("disable-batching, Journal  batching");
        assert!(!c.batching);
        assert!(c.trace_journal);
        assert!(c.trace_batching);
        assert!(c.software_transform);
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let c = JournalConfig::default().with_debug_flags("bogus,,disable-software-transform");
        assert!(!c.software_transform);
        assert!(c.batching);
    }

    #[test]
    fn layer_limit_is_clamped_to_mask_width() {
        let c = JournalConfig { max_texture_units: 64, ..JournalConfig::default() };
        assert_eq!(c.layer_limit(), 32);
        let c = JournalConfig { max_texture_units: 0, ..JournalConfig::default() };
        assert_eq!(c.layer_limit(), 1);
    }
}
