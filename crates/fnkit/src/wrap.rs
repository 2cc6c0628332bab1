//! Generic function wrapping.
//!
//! [`wrap`] hands execution of a target callable over to a wrapper
//! closure. The wrapper runs on every invocation and may inspect or
//! replace the arguments, skip the target entirely, or transform its
//! return value. The target is reached through a [`Next`] handle whose
//! consuming [`Next::invoke`] makes "at most once per call" a type-level
//! guarantee rather than a convention.

/// Borrowed handle to the wrapped target callable.
///
/// Consumed by [`Next::invoke`], so a wrapper can run the target at most
/// once per invocation.
pub struct Next<'a, F> {
    target: &'a mut F,
}

impl<'a, F> Next<'a, F> {
    /// Invoke the wrapped target with the given context and arguments.
    pub fn invoke<Ctx, Args, Out>(self, ctx: &mut Ctx, args: Args) -> Out
    where
        F: FnMut(&mut Ctx, Args) -> Out,
    {
        (self.target)(ctx, args)
    }

    /// The wrapped target, for inspection without invoking it.
    pub fn target(&self) -> &F {
        self.target
    }
}

/// Wrap `target` so that `wrapper` controls each invocation.
///
/// The wrapper receives the [`Next`] handle, the calling context, and the
/// arguments, and its return value becomes the return value of the
/// wrapped callable. Typical uses: argument validation before the call,
/// return-value rewriting after it, or short-circuiting without calling
/// the target at all.
///
/// ```
/// use fnkit::wrap::wrap;
///
/// let double = |_: &mut (), n: u32| n * 2;
/// let mut clamped = wrap(double, |next, ctx, n: u32| {
///     let n = n.min(10);
///     next.invoke(ctx, n)
/// });
/// assert_eq!(clamped(&mut (), 100), 20);
/// ```
pub fn wrap<Ctx, Args, Out, R, F, W>(
    mut target: F,
    mut wrapper: W,
) -> impl FnMut(&mut Ctx, Args) -> R
where
    F: FnMut(&mut Ctx, Args) -> Out,
    W: FnMut(Next<'_, F>, &mut Ctx, Args) -> R,
{
    move |ctx, args| {
        wrapper(
            Next {
                target: &mut target,
            },
            ctx,
            args,
        )
    }
}
