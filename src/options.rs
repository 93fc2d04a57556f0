//! Per-operation settings.

/// Settings copied into every [`ReadState`](crate::ReadState) and
/// [`WriteState`](crate::WriteState) created from them.
///
/// ```
/// use resumable_json::JsonOptions;
///
/// let options = JsonOptions::new()
///     .error_on_type_mismatch(false)
///     .include_return_graph(true)
///     .max_depth(32);
/// assert_eq!(options.get_max_depth(), Some(32));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsonOptions {
    error_on_type_mismatch: bool,
    include_return_graph: bool,
    max_depth: Option<usize>,
    buffer_size: usize,
}

const DEFAULT_MAX_DEPTH: usize = 128;
const DEFAULT_BUFFER_SIZE: usize = 4096;

impl Default for JsonOptions {
    fn default() -> Self {
        JsonOptions {
            error_on_type_mismatch: true,
            include_return_graph: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl JsonOptions {
    pub fn new() -> Self {
        JsonOptions::default()
    }

    /// When false, a value whose JSON shape does not match the target type is
    /// skipped and the target's default value is produced instead of an error.
    #[must_use]
    pub fn error_on_type_mismatch(mut self, value: bool) -> Self {
        self.error_on_type_mismatch = value;
        self
    }

    /// When true, reading an object records which of its members were present
    /// in the input.
    #[must_use]
    pub fn include_return_graph(mut self, value: bool) -> Self {
        self.include_return_graph = value;
        self
    }

    /// Maximum nesting of objects and arrays. Deeper input fails with a
    /// recursion limit error.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Parse arbitrarily deep JSON.
    ///
    /// The engine keeps its own frame stack, but converters still call into
    /// each other for every level of nesting, so you will want to bound the
    /// depth some other way when reading untrusted input.
    #[must_use]
    pub fn disable_recursion_limit(mut self) -> Self {
        self.max_depth = None;
        self
    }

    /// Size of the chunks used by `from_reader` and `to_writer`.
    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    pub fn get_error_on_type_mismatch(&self) -> bool {
        self.error_on_type_mismatch
    }

    pub fn get_include_return_graph(&self) -> bool {
        self.include_return_graph
    }

    pub fn get_max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }
}
