use crate::traits::{
    Environment, FileSystem, Output, RealEnvironment, RealFileSystem, TerminalOutput,
};
use std::sync::Arc;

/// Application context that holds all dependencies for dependency injection
pub struct Context {
    pub fs: Arc<dyn FileSystem>,
    pub env: Arc<dyn Environment>,
    pub output: Arc<dyn Output>,
}

impl Context {
    /// Create a new context with real implementations (for production use)
    pub fn new() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            env: Arc::new(RealEnvironment),
            output: Arc::new(TerminalOutput),
        }
    }

    /// Create a test context with specific mock implementations
    #[cfg(test)]
    pub fn test_with(
        fs: Arc<dyn FileSystem>,
        env: Arc<dyn Environment>,
        output: Arc<dyn Output>,
    ) -> Self {
        Self { fs, env, output }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            env: Arc::clone(&self.env),
            output: Arc::clone(&self.output),
        }
    }
}
