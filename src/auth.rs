//! The authenticated caller, as handed over by whatever verified the token
use crate::error::OrderError;
use crate::types::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
    pub fn customer(user_id: UserId) -> Self {
        Self::new(user_id, Role::Customer)
    }
    pub fn admin(user_id: UserId) -> Self {
        Self::new(user_id, Role::Admin)
    }

    /// The owner recorded on orders this caller places.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), OrderError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(OrderError::Forbidden)
        }
    }
}
