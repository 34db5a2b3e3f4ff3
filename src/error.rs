use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input format error: {0}")]
    InputFormat(String),

    #[error("Duplicate measurement: level {level}, replicate {replicate}, entity {entity}")]
    DuplicateRow {
        level: String,
        replicate: String,
        entity: String,
    },

    #[error("Unknown level: {0}")]
    UnknownLevel(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Registry is frozen, cannot intern: {0}")]
    RegistryFrozen(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
