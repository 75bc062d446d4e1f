//! People who use the service, modelled per role.
//!
//! Each [`Role`] carries exactly the fields that role needs, so a driver can
//! never be asked for a pickup address and a passenger always has one.

use geo::Coord;
use thiserror::Error;

use crate::geodesy::is_valid_coordinate;
use crate::{Subject, SubjectStatus};

/// Driver-only details.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriverProfile {
    /// Driving licence number.
    pub license_number: String,
    /// Vehicle currently assigned to the driver.
    pub vehicle_id: Option<String>,
}

/// Passenger-only details.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PassengerProfile {
    /// Postal address of the pickup point.
    pub address: String,
    /// Pickup coordinate (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Guardian contact number.
    pub parent_phone: Option<String>,
}

/// Administrator-only details.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AdminProfile {
    /// School the administrator manages.
    pub school_name: Option<String>,
}

/// Role-specific part of an [`Account`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "role", rename_all = "snake_case"))]
pub enum Role {
    /// Drives a vehicle.
    Driver(DriverProfile),
    /// Rides to school.
    Passenger(PassengerProfile),
    /// Manages the school's transport.
    Admin(AdminProfile),
}

impl Role {
    /// Return the role name as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Driver(_) => "driver",
            Self::Passenger(_) => "passenger",
            Self::Admin(_) => "admin",
        }
    }
}

/// A registered user.
///
/// # Examples
/// ```
/// use schoolrun_core::{Account, PassengerProfile, Role, SubjectStatus, geodesy::lat_lng};
///
/// let account = Account::new(
///     "p1",
///     "Ana",
///     "ana@example.com",
///     Role::Passenger(PassengerProfile {
///         address: "Rua A, 10".to_owned(),
///         location: lat_lng(-23.56, -46.65),
///         parent_phone: None,
///     }),
/// );
/// assert!(account.validate().is_ok());
/// let subject = account.as_subject(SubjectStatus::Waiting).expect("passenger");
/// assert_eq!(subject.id, "p1");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Account {
    /// Stable account identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Contact number.
    pub phone: Option<String>,
    /// Role and its details.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub role: Role,
}

/// Why an [`Account`] failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// A required text field is blank.
    #[error("account {account_id} is missing {field}")]
    MissingField {
        /// Offending account.
        account_id: String,
        /// Name of the blank field.
        field: &'static str,
    },
    /// The email address has no `@` separating two non-empty parts.
    #[error("account {account_id} has an invalid email address")]
    InvalidEmail {
        /// Offending account.
        account_id: String,
    },
    /// A passenger's pickup coordinate is malformed.
    #[error("passenger {account_id} has an invalid pickup location")]
    InvalidLocation {
        /// Offending account.
        account_id: String,
    },
}

impl Account {
    /// Construct an account without a phone number.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: None,
            role,
        }
    }

    /// Check the shared and role-specific required fields.
    ///
    /// # Errors
    /// Returns the first [`AccountError`] found.
    pub fn validate(&self) -> Result<(), AccountError> {
        self.require("id", &self.id)?;
        self.require("name", &self.name)?;
        if !is_plausible_email(&self.email) {
            return Err(AccountError::InvalidEmail {
                account_id: self.id.clone(),
            });
        }
        match &self.role {
            Role::Driver(driver) => self.require("license_number", &driver.license_number),
            Role::Passenger(passenger) => {
                self.require("address", &passenger.address)?;
                if is_valid_coordinate(passenger.location) {
                    Ok(())
                } else {
                    Err(AccountError::InvalidLocation {
                        account_id: self.id.clone(),
                    })
                }
            }
            Role::Admin(_) => Ok(()),
        }
    }

    /// Routing view of a passenger account; `None` for other roles.
    #[must_use]
    pub fn as_subject(&self, status: SubjectStatus) -> Option<Subject> {
        match &self.role {
            Role::Passenger(passenger) => {
                Some(Subject::new(self.id.clone(), passenger.location, status))
            }
            Role::Driver(_) | Role::Admin(_) => None,
        }
    }

    fn require(&self, field: &'static str, value: &str) -> Result<(), AccountError> {
        if value.trim().is_empty() {
            Err(AccountError::MissingField {
                account_id: self.id.clone(),
                field,
            })
        } else {
            Ok(())
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::lat_lng;
    use rstest::rstest;

    fn driver(license: &str) -> Account {
        Account::new(
            "d1",
            "Carlos",
            "carlos@example.com",
            Role::Driver(DriverProfile {
                license_number: license.to_owned(),
                vehicle_id: Some("van-1".to_owned()),
            }),
        )
    }

    fn passenger(location: Coord<f64>) -> Account {
        Account::new(
            "p1",
            "Ana",
            "ana@example.com",
            Role::Passenger(PassengerProfile {
                address: "Rua A, 10".to_owned(),
                location,
                parent_phone: Some("+55 11 99999-0000".to_owned()),
            }),
        )
    }

    #[rstest]
    fn complete_driver_is_valid() {
        assert_eq!(driver("ABC123").validate(), Ok(()));
    }

    #[rstest]
    fn driver_needs_a_licence() {
        assert_eq!(
            driver("  ").validate(),
            Err(AccountError::MissingField {
                account_id: "d1".to_owned(),
                field: "license_number",
            })
        );
    }

    #[rstest]
    #[case("")]
    #[case("ana")]
    #[case("@example.com")]
    #[case("ana@")]
    fn email_must_have_two_parts(#[case] email: &str) {
        let mut account = passenger(lat_lng(0.0, 0.0));
        account.email = email.to_owned();
        assert!(matches!(
            account.validate(),
            Err(AccountError::InvalidEmail { .. })
        ));
    }

    #[rstest]
    fn passenger_location_must_be_valid() {
        assert!(matches!(
            passenger(lat_lng(f64::NAN, 0.0)).validate(),
            Err(AccountError::InvalidLocation { .. })
        ));
    }

    #[rstest]
    fn only_passengers_become_subjects() {
        let subject = passenger(lat_lng(1.0, 2.0)).as_subject(SubjectStatus::PickedUp);
        assert_eq!(
            subject,
            Some(Subject::new("p1", lat_lng(1.0, 2.0), SubjectStatus::PickedUp))
        );
        assert!(driver("ABC123").as_subject(SubjectStatus::Waiting).is_none());
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn role_is_tagged_in_json() {
        let json = serde_json::to_value(driver("ABC123")).expect("serialise account");
        assert_eq!(json.get("role").and_then(|v| v.as_str()), Some("driver"));
        assert_eq!(
            json.get("license_number").and_then(|v| v.as_str()),
            Some("ABC123")
        );
    }
}
