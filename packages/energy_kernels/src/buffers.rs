use std::mem::size_of;

use energy_harness::PrepareError;

/// Whether `len` elements of `T` can be addressed by a single allocation.
///
/// `None` stands for an element count that already overflowed `usize`.
pub(crate) fn fits_in_memory<T>(len: Option<usize>) -> bool {
    len.and_then(|len| len.checked_mul(size_of::<T>()))
        .is_some_and(|bytes| isize::try_from(bytes).is_ok())
}

/// An empty vector with room for exactly `len` elements.
///
/// Running out of memory is reported as an allocation failure of `kernel` instead of aborting
/// the process.
pub(crate) fn try_with_capacity<T>(
    kernel: &'static str,
    len: usize,
) -> Result<Vec<T>, PrepareError> {
    let mut buffer = Vec::new();

    buffer.try_reserve_exact(len).map_err(|e| {
        PrepareError::allocation_failure(kernel, format!("cannot allocate {len} elements: {e}"))
    })?;

    Ok(buffer)
}

/// A vector of `len` copies of `value`, allocated with [`try_with_capacity()`].
pub(crate) fn try_filled<T: Clone>(
    kernel: &'static str,
    len: usize,
    value: T,
) -> Result<Vec<T>, PrepareError> {
    let mut buffer = try_with_capacity(kernel, len)?;
    buffer.resize(len, value);

    Ok(buffer)
}
