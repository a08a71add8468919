pub(crate) mod context;
pub(crate) mod diagnostics;
pub(crate) mod mix;
