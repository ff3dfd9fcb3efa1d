//! Static-link resolution across activation frames.
//!
//! Every lexically-scoped instruction (`LOD`, `STO`, `PLD`, `PST`, `CAL`)
//! resolves its base by walking `level` static links down the stack. The
//! walk is pure; the engine takes the final base while the explanation layer
//! highlights the whole trail of visited frames, so both consume the same
//! derivation.

use pl0vm_foundation::{Error, Result, Stack};

/// Walks `level` static links starting at `base` and returns every visited
/// base, starting with `base` itself; the last element is the resolved one.
///
/// # Errors
///
/// [`pl0vm_foundation::ErrorKind::LevelTooDeep`] when the chain reaches the
/// outermost frame (base 0) with levels still to resolve, and the stack
/// access errors of [`Stack::cell`] if a static link is corrupt.
pub fn find_base_trail(stack: &Stack, base: i64, level: i64) -> Result<Vec<i64>> {
    let mut trail = vec![base];
    let mut current = base;
    let mut remaining = level;

    while remaining > 0 {
        current = stack.cell(current)?;
        remaining -= 1;
        trail.push(current);

        if current == 0 && remaining != 0 {
            return Err(Error::level_too_deep(remaining));
        }
    }

    Ok(trail)
}

/// Resolves the base `level` static links below `base`.
///
/// # Errors
///
/// Same conditions as [`find_base_trail`].
pub fn find_base(stack: &Stack, base: i64, level: i64) -> Result<i64> {
    let trail = find_base_trail(stack, base, level)?;
    Ok(*trail.last().expect("trail always contains the start base"))
}
