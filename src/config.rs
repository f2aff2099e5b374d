//! Retained-history configuration.

use crate::error::{Result, UndoError};

/// Number of command groups kept when nothing else is configured.
pub const DEFAULT_UNDO_LEVELS: usize = 100;

/// Undo log settings.
///
/// Validated on construction, so an `UndoConfig` always holds a positive depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoConfig {
    max_depth: usize,
}

impl UndoConfig {
    /// Creates a config retaining at most `max_depth` groups.
    ///
    /// Fails with [`UndoError::InvalidDepth`] when `max_depth` is zero.
    pub fn new(max_depth: usize) -> Result<Self> {
        if max_depth == 0 {
            return Err(UndoError::InvalidDepth(max_depth));
        }
        Ok(Self { max_depth })
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_UNDO_LEVELS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_depth() {
        assert_eq!(UndoConfig::default().max_depth(), DEFAULT_UNDO_LEVELS);
    }

    #[test]
    fn test_zero_depth_rejected() {
        assert!(matches!(
            UndoConfig::new(0),
            Err(UndoError::InvalidDepth(0))
        ));
        assert_eq!(UndoConfig::new(3).unwrap().max_depth(), 3);
    }
}
