//! Runtime limits.

/// Default number of values per execution-stack block.
pub const DEFAULT_STACK_BLOCK_SIZE: usize = 256;

/// Default bound on nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Tunables for a `RuntimeContext`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Values per execution-stack block. Clamped to at least 1.
    pub stack_block_size: usize,
    /// Maximum number of active calls (functions, methods, constructors,
    /// destructors and natives) before `CallDepthExceeded` is raised.
    pub max_call_depth: usize,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        RuntimeConfig::default()
    }

    #[must_use]
    pub fn stack_block_size(mut self, size: usize) -> Self {
        self.stack_block_size = size.max(1);
        self
    }

    #[must_use]
    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_block_size: DEFAULT_STACK_BLOCK_SIZE,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_override_defaults() {
        let config = RuntimeConfig::new().stack_block_size(0).max_call_depth(12);
        assert_eq!(config.stack_block_size, 1);
        assert_eq!(config.max_call_depth, 12);
        assert_eq!(RuntimeConfig::default().stack_block_size, DEFAULT_STACK_BLOCK_SIZE);
    }
}
