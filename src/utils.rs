use std::fmt::Formatter;

/// Print an error followed by every `source` in its chain. Used for the
/// `Debug` impls of handler errors, so logs show the root cause instead of
/// just the outermost message.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{e}\n")?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{cause}")?;
        current = cause.source();
    }
    Ok(())
}
