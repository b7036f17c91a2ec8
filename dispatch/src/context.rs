//! Execution context, I/O handles and ancestor parameters.

use std::any::Any;
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Execution context handed to every task.
///
/// Carries a cooperative cancellation flag. The dispatcher never checks it;
/// long-running tasks poll [`Context::is_cancelled`] themselves.
///
/// # Examples
///
/// ```
/// use flagtree::Context;
///
/// let ctx = Context::new();
/// let handle = ctx.clone();
/// assert!(!ctx.is_cancelled());
/// handle.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancelled: Arc<AtomicBool>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; visible through every clone.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Input and output streams for a run.
pub struct Io {
    pub stdin: Box<dyn Read + Send>,
    pub stdout: Box<dyn Write + Send>,
    pub stderr: Box<dyn Write + Send>,
}

impl Io {
    pub fn new(
        stdin: impl Read + Send + 'static,
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
    ) -> Self {
        Self {
            stdin: Box::new(stdin),
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
        }
    }

    /// The process's standard streams.
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout(), io::stderr())
    }
}

impl fmt::Debug for Io {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Io").finish_non_exhaustive()
    }
}

/// Ordered list of type-erased values passed down a command tree.
///
/// Caller-supplied values come first, followed by one resolved flag
/// configuration per command group traversed, outermost first.
///
/// # Examples
///
/// ```
/// use flagtree::Params;
///
/// #[derive(Debug, PartialEq)]
/// struct Verbosity(u8);
///
/// let mut params = Params::new();
/// params.push(Verbosity(2));
/// params.push(String::from("token"));
///
/// assert_eq!(params.find::<Verbosity>(), Some(&Verbosity(2)));
/// assert_eq!(params.find::<String>().map(String::as_str), Some("token"));
/// assert_eq!(params.find::<u32>(), None);
/// ```
#[derive(Clone, Default)]
pub struct Params(Vec<Arc<dyn Any + Send + Sync>>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.0.push(Arc::new(value));
    }

    pub fn push_shared(&mut self, value: Arc<dyn Any + Send + Sync>) {
        self.0.push(value);
    }

    /// First value of type `T`.
    pub fn find<T: Any>(&self) -> Option<&T> {
        self.0.iter().find_map(|param| (**param).downcast_ref::<T>())
    }

    /// Every value of type `T`, in list order.
    pub fn find_all<T: Any>(&self) -> impl Iterator<Item = &T> {
        self.0.iter().filter_map(|param| (**param).downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Params").field("len", &self.0.len()).finish()
    }
}
