use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    #[error("failed to allocate storage for `{0}` buckets")]
    Alloc(usize),
    #[error("requested capacity `{0}` does not fit the index width")]
    CapacityOverflow(usize),
}

pub type Result<T> = std::result::Result<T, HashError>;
