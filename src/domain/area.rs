//! Area domain entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::Entity;

/// An organizational area of the education secretariat. Read-only reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    pub codigo: String,
    pub nombre: String,
}

impl Entity for Area {
    type Id = Uuid;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Area {
    pub fn new(id: Uuid, codigo: &str, nombre: &str) -> Self {
        Self {
            id,
            codigo: codigo.to_string(),
            nombre: nombre.to_string(),
        }
    }
}
