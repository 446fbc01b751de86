use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An order with this id is already registered.
    #[error("order-{0} already exists")]
    AlreadyExists(i64),
    /// No order with this id is registered.
    #[error("order-{0} does not exist")]
    NotFound(i64),
    #[error("{} is not an xml file", .0.display())]
    InvalidFormat(PathBuf),
    #[error("order id {0:?} is not an integer")]
    InvalidId(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
