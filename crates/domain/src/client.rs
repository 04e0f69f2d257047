//! Client entity and its admission rules.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use librarian_core::{ClientId, DomainError, DomainResult, Entity};

use crate::snapshot::Snapshot;

/// A registered library client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub birthdate: NaiveDate,
    /// One-way flag: once set it is never cleared by the system.
    pub is_untrustworthy: bool,
}

impl Client {
    /// Whole years between the birthdate and `today`, floored at the
    /// anniversary boundary.
    pub fn age_on(&self, today: NaiveDate) -> i32 {
        age_on(self.birthdate, today)
    }

    /// The candidate view of this client's current field values.
    pub fn as_candidate(&self) -> NewClient {
        NewClient {
            name: self.name.clone(),
            birthdate: self.birthdate,
            is_untrustworthy: self.is_untrustworthy,
        }
    }
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> ClientId {
        self.id
    }
}

/// A client candidate: the full post-edit field set submitted for admission.
/// Also the insert payload (the store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub birthdate: NaiveDate,
    #[serde(default)]
    pub is_untrustworthy: bool,
}

impl NewClient {
    pub fn with_id(self, id: ClientId) -> Client {
        Client {
            id,
            name: self.name,
            birthdate: self.birthdate,
            is_untrustworthy: self.is_untrustworthy,
        }
    }
}

/// Floor-truncated age in years at `today`.
///
/// Year difference, minus one when the birthdate falls after `today` shifted
/// back by that many years. The shift clamps Feb 29 to Feb 28 in non-leap
/// years, so a leap-day birthday counts from Feb 28.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    let anniversary = if age >= 0 {
        today.checked_sub_months(Months::new(age.unsigned_abs() * 12))
    } else {
        today.checked_add_months(Months::new(age.unsigned_abs() * 12))
    };
    if birthdate > anniversary.unwrap_or(today) {
        age -= 1;
    }
    age
}

/// Admit or reject a client candidate against current store state.
///
/// `prior` is the client's own id on update (excluded from the name
/// uniqueness check and used to find their open borrowings); `None` on add.
pub fn admit(
    candidate: &NewClient,
    prior: Option<ClientId>,
    snap: &Snapshot,
    today: NaiveDate,
) -> DomainResult<()> {
    let duplicate_name = snap
        .clients
        .iter()
        .any(|c| c.name == candidate.name && Some(c.id) != prior);
    if duplicate_name {
        return Err(DomainError::rule("Name", "Such a client already exists"));
    }

    // A birthdate edit must keep the client old enough for every book they
    // currently hold (absent limit counts as 0).
    if let Some(id) = prior {
        let required = snap
            .open_borrowings_for_client(id)
            .map(|b| {
                snap.book(b.book_id)
                    .and_then(|book| book.age_limit)
                    .unwrap_or(0)
            })
            .max()
            .unwrap_or(0);
        if i64::from(age_on(candidate.birthdate, today)) < i64::from(required) {
            return Err(DomainError::rule(
                "Birthdate",
                "Age not satisfies current borrowed book limit",
            ));
        }
    }

    Ok(())
}

/// Admit or reject deleting the client with the given id.
pub fn admit_delete(id: ClientId, snap: &Snapshot) -> DomainResult<()> {
    if snap.client(id).is_none() {
        return Err(DomainError::not_found("client"));
    }

    if snap.open_borrowings_for_client(id).next().is_some() {
        return Err(DomainError::rule("", "Client has active borrowings"));
    }

    Ok(())
}
