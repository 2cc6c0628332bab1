//! Cache-key fingerprinting.
//!
//! [`crate::memo`] compares opaque keys; this module derives such keys
//! from arbitrary serializable argument views by hashing their JSON
//! encoding with SHA-256. Two inputs with the same serialized form always
//! fingerprint identically, which is exactly the equality a memoized
//! callable wants when "same arguments" should mean "same cached result".

use fnkit_core::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Derive a stable hex fingerprint for any serializable value.
pub fn fingerprint<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    let serialized = serde_json::to_vec(value).map_err(|e| Error::Fingerprint {
        message: e.to_string(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&serialized);
    Ok(format!("{:x}", hasher.finalize()))
}

/// A key callable for [`crate::memo::TryMemo`] fingerprinting the
/// arguments.
///
/// ```
/// use fnkit::keys;
/// use fnkit::memo::TryMemo;
///
/// let mut memo = TryMemo::with_key(
///     |_: &mut (), point: (i32, i32)| Ok(point.0 + point.1),
///     keys::fingerprint_fn(),
/// );
/// assert_eq!(memo.try_call(&mut (), (1, 2)).unwrap(), &3);
/// ```
pub fn fingerprint_fn<Ctx, Args>() -> impl FnMut(&mut Ctx, &Args) -> Result<String>
where
    Args: Serialize,
{
    |_ctx, args| fingerprint(args)
}
