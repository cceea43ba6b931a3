use crate::error::AuthorizationError;
use crate::store::RecipientId;
use std::collections::HashSet;

/// Static allow-list of administrator ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminList {
    admins: HashSet<RecipientId>,
}

impl AdminList {
    pub fn new(admins: impl IntoIterator<Item = i64>) -> Self {
        Self {
            admins: admins.into_iter().map(RecipientId).collect(),
        }
    }

    pub fn is_admin(&self, id: RecipientId) -> bool {
        self.admins.contains(&id)
    }

    pub fn authorize(&self, id: RecipientId) -> Result<(), AuthorizationError> {
        if self.is_admin(id) {
            Ok(())
        } else {
            log::warn!("Rejected administrator command from {id}");
            Err(AuthorizationError(id))
        }
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_ids_are_admins() {
        let admins = AdminList::new([42, 7]);

        assert!(admins.authorize(RecipientId(42)).is_ok());
        assert_eq!(admins.authorize(RecipientId(8)), Err(AuthorizationError(RecipientId(8))));
    }

    #[test]
    fn empty_list_rejects_everyone() {
        let admins = AdminList::default();
        assert!(admins.is_empty());
        assert!(admins.authorize(RecipientId(1)).is_err());
    }
}
