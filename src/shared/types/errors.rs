use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Parking lot {lot_id} has no available spots")]
    CapacityExceeded { lot_id: i32 },

    #[error("Reservation {0} is already cancelled")]
    AlreadyCancelled(i32),

    #[error("Reservation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i32,
        from: &'static str,
        to: &'static str,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }
}
