use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopterError {
    #[error("Failed to read scenario file {path}: {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed scenario: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Unknown scenario: {name}")]
    UnknownScenario { name: String },

    #[error("Rotor {rotor} refers to unknown parent body {parent}")]
    UnknownParent { rotor: String, parent: String },

    #[error("Body name {name} is used more than once")]
    DuplicateBody { name: String },

    #[error("Invalid physics setting {field}: {value}")]
    InvalidPhysics { field: &'static str, value: String },

    #[error("Focus body {name} is not part of the scenario")]
    UnknownFocus { name: String },

    #[error("Object {name} has no physics body to attach to")]
    NoPhysicsBody { name: String },

    #[error("Presenter failed: {reason}")]
    Presenter { reason: String },
}

pub type Result<T> = std::result::Result<T, CopterError>;
