//! Endpoint selection by rotation counter

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("endpoint list is empty")]
    EmptyList,
}

/// Index into a list of `len` endpoints for a given counter value.
pub fn index_for(len: usize, counter: u64) -> Result<usize, SelectorError> {
    if len == 0 {
        return Err(SelectorError::EmptyList);
    }
    Ok((counter % len as u64) as usize)
}

/// `list[counter mod list.len()]`. Pure; advancing the counter is the caller's job.
pub fn select<T>(list: &[T], counter: u64) -> Result<&T, SelectorError> {
    let index = index_for(list.len(), counter)?;
    Ok(&list[index])
}
