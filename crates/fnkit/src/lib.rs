//! Function-manipulation combinators.
//!
//! Each module wraps a single callable or sequence value with one added
//! capability, and the wrappers compose freely:
//!
//! - **`memo`**: single-slot memoization keyed by a derived cache key,
//!   with explicit reset/rerun control.
//! - **`wrap`**: hand execution of a callable to a wrapper closure that
//!   may adjust arguments, short-circuit, or rewrite the result.
//! - **`capture`**: convert panicking callables and futures into
//!   `Result`-returning ones.
//! - **`drive`**: drain resumable async sequences (and ordinary streams)
//!   to completion, optionally feeding a value back per item.
//! - **`compose`**: calling-context binding and small composition
//!   operators.
//! - **`keys`**: derive memoization keys from serializable arguments.
//!
//! All callable-shaped combinators share one calling convention: an
//! explicit leading `&mut Ctx` context parameter followed by a single
//! arguments value (use a tuple for several). Context-free callables use
//! `Ctx = ()`.

pub mod capture;
pub mod compose;
pub mod drive;
pub mod keys;
pub mod memo;
pub mod wrap;

pub use fnkit_core::{Error, Outcome, Result};

pub use capture::{capture, capture_future, capture_future_with, capture_with, PanicPayload};
pub use compose::{bind, Compose};
pub use drive::{drain, drain_with, from_fn, from_stream, Sequence, Step};
pub use memo::{Memo, SharedMemo, TryMemo};
pub use wrap::{wrap, Next};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::capture::{capture, capture_future, capture_with};
    pub use crate::compose::{bind, Compose};
    pub use crate::drive::{drain, drain_with, Sequence, Step};
    pub use crate::memo::{Memo, SharedMemo, TryMemo};
    pub use crate::wrap::{wrap, Next};
    pub use fnkit_core::{Error, Outcome, Result};
}
