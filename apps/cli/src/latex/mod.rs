// LaTeX engine: region extraction, in-place substitution, and structural
// validation of the adapted document. Everything outside the known anchor
// pairs is treated as an opaque byte sequence; no full grammar parsing here.

pub mod braces;
pub mod regions;
pub mod substitute;
pub mod validate;
