pub(crate) mod expr;
pub(crate) mod opcodes;
pub(crate) mod value;
pub(crate) mod vm;
