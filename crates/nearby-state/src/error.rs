use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Index {index} is out of range for {len} displayed places")]
    IndexOutOfRange { index: usize, len: usize },
}
